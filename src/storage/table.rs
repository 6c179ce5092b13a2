use crate::core::{Record, Result, Xid};
use crate::storage::lock::LockManager;
use crate::transaction::{IsolationLevel, Transaction};
use log::debug;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// The record store: an append-only sequence of row versions plus the
/// transactional bookkeeping that interprets it.
///
/// A `Table` owns the monotonic xid allocator, the active-xid set, the
/// version sequence and the lock registry. All mutation goes through
/// [`Transaction`] handles; cloning a `Table` hands out another handle to
/// the same shared store.
///
/// The store is driven by one logical operation at a time. Concurrent
/// transactions are interleaved by the caller, not run on separate threads,
/// so a single `RwLock` around the whole store is the only exclusion needed.
#[derive(Clone)]
pub struct Table {
    inner: Arc<RwLock<TableInner>>,
}

#[derive(Debug)]
pub(crate) struct TableInner {
    next_xid: Xid,
    pub(crate) active_xids: HashSet<Xid>,
    pub(crate) records: Vec<Record>,
    pub(crate) locks: LockManager,
}

impl Table {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(TableInner {
                next_xid: 0,
                active_xids: HashSet::new(),
                records: Vec::new(),
                locks: LockManager::new(),
            })),
        }
    }

    /// Begin a transaction under the given isolation level.
    ///
    /// Allocates a fresh xid (never reused, even across rollbacks) and
    /// marks it active. Serializable transactions additionally capture the
    /// set of other transactions active at this instant; versions created
    /// by those transactions stay invisible for the whole run.
    pub fn new_transaction(&self, isolation: IsolationLevel) -> Result<Transaction> {
        let mut inner = self.inner.write()?;
        inner.next_xid += 1;
        let xid = inner.next_xid;

        let snapshot =
            (isolation == IsolationLevel::Serializable).then(|| inner.active_xids.clone());

        inner.active_xids.insert(xid);
        debug!("begin txn_{} ({})", xid, isolation);

        Ok(Transaction::new(
            Arc::clone(&self.inner),
            xid,
            isolation,
            snapshot,
        ))
    }

    /// Raw dump of every version ever appended, expiry stamps included.
    /// Diagnostics only: no visibility rule is applied.
    pub fn versions(&self) -> Result<Vec<Record>> {
        Ok(self.inner.read()?.records.clone())
    }

    /// Number of versions in the store (not logical rows).
    pub fn version_count(&self) -> Result<usize> {
        Ok(self.inner.read()?.records.len())
    }

    /// Number of transactions that have neither committed nor rolled back.
    pub fn active_transaction_count(&self) -> Result<usize> {
        Ok(self.inner.read()?.active_xids.len())
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}
