// ============================================================================
// Transaction State Management
// ============================================================================
//
// Implements the State Pattern for transaction lifecycle management.
// Each transaction moves through defined states: Active -> Committed/RolledBack
//
// Uses MVCC (Multi-Version Concurrency Control) over the append-only record
// store:
// - Mutation is expressed as appending a version or stamping an expiry;
//   nothing is ever physically removed.
// - What a transaction sees is decided by its isolation level's visibility
//   predicate, evaluated against the shared active-xid set.
// - Rollback replays the per-transaction undo log in reverse.
//
// ============================================================================

use crate::core::{DbError, NEVER_EXPIRED, Record, RecordId, Result, Xid};
use crate::storage::table::TableInner;
use crate::transaction::isolation::IsolationLevel;
use crate::transaction::undo::UndoAction;
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// Transaction state following the State Pattern
///
/// State transitions:
/// ```text
/// Active ──commit──> Committed
///   │
///   └──rollback──> RolledBack
/// ```
///
/// Both outcomes are terminal; there is no way back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can execute operations
    Active,

    /// Transaction has been successfully committed
    Committed,

    /// Transaction has been rolled back
    RolledBack,
}

impl TransactionState {
    /// Check if transaction can execute operations
    pub fn is_active(&self) -> bool {
        matches!(self, TransactionState::Active)
    }

    /// Check if transaction is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Committed | TransactionState::RolledBack
        )
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            TransactionState::Active => "ACTIVE",
            TransactionState::Committed => "COMMITTED",
            TransactionState::RolledBack => "ROLLED BACK",
        }
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A handle on one interleaved MVCC transaction.
///
/// Obtained from [`Table::new_transaction`](crate::storage::Table::new_transaction).
/// The caller issues a sequence of `add`/`delete`/`update`/`fetch` calls and
/// finishes with exactly one of [`commit`](Transaction::commit) or
/// [`rollback`](Transaction::rollback). Every operation on a finished
/// transaction fails with [`DbError::TransactionNotActive`].
///
/// A conflict ([`DbError::RowLocked`]) does not finish the transaction by
/// itself: the caller is expected to roll back explicitly. Dropping an
/// `Active` handle leaks its xid in the active set and is logged as a
/// warning.
#[derive(Debug)]
pub struct Transaction {
    /// Shared store this transaction runs against
    table: Arc<RwLock<TableInner>>,

    /// Unique transaction identifier, doubling as a logical timestamp
    xid: Xid,

    /// Isolation level supplying the visibility and lock predicates
    isolation: IsolationLevel,

    /// Current state (Active, Committed, RolledBack)
    state: TransactionState,

    /// Undo log, one entry per mutation, replayed in reverse on rollback
    /// (Command Pattern)
    undo_log: Vec<UndoAction>,

    /// Other xids active at start; `Some` only under serializable
    snapshot: Option<HashSet<Xid>>,
}

impl Transaction {
    pub(crate) fn new(
        table: Arc<RwLock<TableInner>>,
        xid: Xid,
        isolation: IsolationLevel,
        snapshot: Option<HashSet<Xid>>,
    ) -> Self {
        Self {
            table,
            xid,
            isolation,
            state: TransactionState::Active,
            undo_log: Vec::new(),
            snapshot,
        }
    }

    /// Get the transaction id
    pub fn xid(&self) -> Xid {
        self.xid
    }

    /// Get the isolation level this transaction runs under
    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    /// Get the current state
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Number of undo entries recorded so far
    pub fn undo_count(&self) -> usize {
        self.undo_log.len()
    }

    fn ensure_active(&self) -> Result<()> {
        if !self.state.is_active() {
            return Err(DbError::TransactionNotActive {
                xid: self.xid,
                state: self.state.as_str(),
            });
        }
        Ok(())
    }

    /// Visibility check for one version, coupled with read-lock
    /// registration: repeatable-read and serializable remember every row
    /// they see, feeding other transactions' lock checks.
    fn sees(&self, inner: &mut TableInner, index: usize) -> bool {
        let visible = self.isolation.record_is_visible(
            &inner.records[index],
            self.xid,
            &inner.active_xids,
            self.snapshot.as_ref(),
        );

        if visible && self.isolation.locks_reads() {
            let id = inner.records[index].id;
            inner.locks.add(self.xid, id);
        }

        visible
    }

    /// Append a new version of row `id`.
    ///
    /// Never conflicts: an insert is invisible to everyone else until
    /// commit, so there is nothing to collide with.
    pub fn add_record(&mut self, id: RecordId, name: impl Into<String>) -> Result<()> {
        self.ensure_active()?;
        let mut inner = self.table.write()?;

        let index = inner.records.len();
        inner.records.push(Record::new(id, name.into(), self.xid));
        self.undo_log.push(UndoAction::ExpireVersion { index });
        Ok(())
    }

    /// Logically delete row `id` by stamping its visible version with our
    /// xid.
    ///
    /// Fails with [`DbError::RowLocked`] before any mutation when the
    /// visible version is held by a concurrent writer (or, under
    /// repeatable-read and serializable, read-locked by another active
    /// transaction). Deleting a row with no visible version is a silent
    /// no-op.
    pub fn delete_record(&mut self, id: RecordId) -> Result<()> {
        self.ensure_active()?;
        let mut inner = self.table.write()?;

        // Resolve targets before touching anything so a conflict leaves
        // the store exactly as it was.
        let mut targets = Vec::new();
        for index in 0..inner.records.len() {
            if self.sees(&mut inner, index) && inner.records[index].id == id {
                let locked = self.isolation.record_is_locked(
                    &inner.records[index],
                    self.xid,
                    &inner.active_xids,
                    &inner.locks,
                );
                if locked {
                    debug!("txn_{} delete of row {} conflicts", self.xid, id);
                    return Err(DbError::RowLocked(id));
                }
                targets.push(index);
            }
        }

        for index in targets {
            inner.records[index].expired_xid = self.xid;
            self.undo_log.push(UndoAction::ReviveVersion { index });
        }
        Ok(())
    }

    /// Replace the visible version of row `id`: a delete followed by an
    /// add. A conflict in the delete phase aborts before anything is
    /// appended.
    pub fn update_record(&mut self, id: RecordId, name: impl Into<String>) -> Result<()> {
        self.delete_record(id)?;
        self.add_record(id, name)
    }

    /// Point lookup: the first visible version of row `id`, if any.
    /// Absence is not an error.
    pub fn fetch_record(&self, id: RecordId) -> Result<Option<Record>> {
        self.ensure_active()?;
        let mut inner = self.table.write()?;

        for index in 0..inner.records.len() {
            if self.sees(&mut inner, index) && inner.records[index].id == id {
                return Ok(Some(inner.records[index].clone()));
            }
        }
        Ok(None)
    }

    /// Every visible version satisfying `predicate`, in record-sequence
    /// order. The generalized range/filter primitive.
    pub fn fetch<F>(&self, predicate: F) -> Result<Vec<Record>>
    where
        F: Fn(&Record) -> bool,
    {
        self.ensure_active()?;
        let mut inner = self.table.write()?;

        let mut visible = Vec::new();
        for index in 0..inner.records.len() {
            if self.sees(&mut inner, index) && predicate(&inner.records[index]) {
                visible.push(inner.records[index].clone());
            }
        }
        Ok(visible)
    }

    /// Every visible version, in record-sequence order.
    pub fn fetch_all_records(&self) -> Result<Vec<Record>> {
        self.fetch(|_| true)
    }

    /// Count visible versions with `min_id <= id <= max_id`.
    pub fn count_records(&self, min_id: RecordId, max_id: RecordId) -> Result<usize> {
        self.ensure_active()?;
        let mut inner = self.table.write()?;

        let mut count = 0;
        for index in 0..inner.records.len() {
            if self.sees(&mut inner, index) && (min_id..=max_id).contains(&inner.records[index].id)
            {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Commit: remove our xid from the active set.
    ///
    /// No versions are touched. That removal alone is what makes our
    /// mutations visible to read-committed observers; the active-set test
    /// replaces any physical "apply" step.
    pub fn commit(&mut self) -> Result<()> {
        self.ensure_active()?;
        {
            let mut inner = self.table.write()?;
            inner.active_xids.remove(&self.xid);
        }
        self.state = TransactionState::Committed;
        debug!("txn_{} committed", self.xid);
        Ok(())
    }

    /// Roll back: replay the undo log in strict reverse order, then remove
    /// our xid from the active set.
    ///
    /// Afterwards the store is observably identical, under every isolation
    /// level's visibility predicate, to its state before this transaction's
    /// mutations.
    pub fn rollback(&mut self) -> Result<()> {
        self.ensure_active()?;
        {
            let mut inner = self.table.write()?;
            for action in self.undo_log.drain(..).rev() {
                match action {
                    UndoAction::ExpireVersion { index } => {
                        inner.records[index].expired_xid = self.xid;
                    }
                    UndoAction::ReviveVersion { index } => {
                        inner.records[index].expired_xid = NEVER_EXPIRED;
                    }
                }
            }
            inner.active_xids.remove(&self.xid);
        }
        self.state = TransactionState::RolledBack;
        debug!("txn_{} rolled back", self.xid);
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        // No implicit rollback: the xid stays in the active set and keeps
        // pinning visibility for everyone else.
        if self.state.is_active() {
            warn!(
                "txn_{} dropped while active; call commit() or rollback()",
                self.xid
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Table;

    fn table_with_baseline() -> Table {
        let table = Table::new();
        let mut txn = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();
        txn.add_record(1, "Joe").unwrap();
        txn.add_record(3, "Jill").unwrap();
        txn.commit().unwrap();
        table
    }

    #[test]
    fn test_transaction_lifecycle() {
        let table = Table::new();
        let mut txn = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();

        assert_eq!(txn.state(), TransactionState::Active);
        assert!(txn.state().is_active());
        assert!(!txn.state().is_terminal());

        txn.commit().unwrap();
        assert_eq!(txn.state(), TransactionState::Committed);
        assert!(txn.state().is_terminal());
    }

    #[test]
    fn test_cannot_commit_twice() {
        let table = Table::new();
        let mut txn = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();

        txn.commit().unwrap();
        let err = txn.commit().unwrap_err();
        assert!(matches!(err, DbError::TransactionNotActive { .. }));
    }

    #[test]
    fn test_cannot_operate_after_rollback() {
        let table = Table::new();
        let mut txn = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();
        txn.rollback().unwrap();

        assert!(txn.add_record(1, "Joe").is_err());
        assert!(txn.delete_record(1).is_err());
        assert!(txn.fetch_record(1).is_err());
        assert!(txn.commit().is_err());
        assert!(txn.rollback().is_err());
    }

    #[test]
    fn test_add_and_fetch_own_write() {
        let table = Table::new();
        let mut txn = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();
        txn.add_record(1, "Joe").unwrap();

        let record = txn.fetch_record(1).unwrap().unwrap();
        assert_eq!(record.name, "Joe");
        assert_eq!(record.created_xid, txn.xid());
        assert_eq!(txn.undo_count(), 1);
        txn.commit().unwrap();
    }

    #[test]
    fn test_delete_hides_row_from_self() {
        let table = table_with_baseline();
        let mut txn = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();

        txn.delete_record(1).unwrap();
        assert!(txn.fetch_record(1).unwrap().is_none());
        // Jill untouched.
        assert!(txn.fetch_record(3).unwrap().is_some());
        txn.commit().unwrap();
    }

    #[test]
    fn test_delete_nonexistent_is_noop() {
        let table = table_with_baseline();
        let mut txn = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();

        txn.delete_record(99).unwrap();
        assert_eq!(txn.undo_count(), 0);
        txn.commit().unwrap();
    }

    #[test]
    fn test_update_is_delete_then_add() {
        let table = table_with_baseline();
        let mut txn = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();

        txn.update_record(1, "Joe 2").unwrap();
        assert_eq!(txn.undo_count(), 2);

        let record = txn.fetch_record(1).unwrap().unwrap();
        assert_eq!(record.name, "Joe 2");
        txn.commit().unwrap();
    }

    #[test]
    fn test_fetch_all_in_sequence_order() {
        let table = table_with_baseline();
        let txn = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();

        let all = txn.fetch_all_records().unwrap();
        let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Joe", "Jill"]);
    }

    #[test]
    fn test_fetch_with_predicate() {
        let table = table_with_baseline();
        let txn = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();

        let hits = txn.fetch(|r| r.name.starts_with("Ji")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 3);
    }

    #[test]
    fn test_count_records_range() {
        let table = table_with_baseline();
        let txn = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();

        assert_eq!(txn.count_records(1, 3).unwrap(), 2);
        assert_eq!(txn.count_records(2, 2).unwrap(), 0);
    }

    #[test]
    fn test_conflict_does_not_finish_transaction() {
        let table = table_with_baseline();
        let mut t1 = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();
        let mut t2 = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();

        t1.delete_record(1).unwrap();
        let err = t2.delete_record(1).unwrap_err();
        assert!(err.is_conflict());

        // t2 is still active and must roll back itself.
        assert_eq!(t2.state(), TransactionState::Active);
        t2.rollback().unwrap();
        t1.commit().unwrap();
    }
}
