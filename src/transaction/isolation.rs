use crate::core::{Record, Xid};
use crate::storage::lock::LockManager;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// The four SQL isolation levels.
///
/// Each level supplies two predicates: whether a version is *visible* to a
/// transaction, and whether it is *locked* for that transaction's writes.
/// Read-committed's rules are the shared baseline; repeatable-read layers
/// the read-lock registry on top, and serializable further restricts
/// visibility to the snapshot taken at transaction start.
///
/// "Locked" never means "the caller waits": it means the next conflicting
/// delete is rejected with [`DbError::RowLocked`](crate::core::DbError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IsolationLevel {
    /// Dirty reads possible: any non-expired version is visible, commit
    /// status notwithstanding.
    ReadUncommitted,
    /// Hides uncommitted work of other transactions. Re-evaluated on every
    /// read, so non-repeatable reads are possible.
    ReadCommitted,
    /// Read-committed plus soft read locks on every row seen, turning a
    /// concurrent writer's delete into a conflict.
    RepeatableRead,
    /// Repeatable-read plus a fixed creation-time snapshot, which also
    /// stops phantoms.
    Serializable,
}

impl IsolationLevel {
    /// All levels, weakest first. Handy for harnesses that sweep the matrix.
    pub const ALL: [IsolationLevel; 4] = [
        IsolationLevel::ReadUncommitted,
        IsolationLevel::ReadCommitted,
        IsolationLevel::RepeatableRead,
        IsolationLevel::Serializable,
    ];

    /// Whether scans under this level register a read lock for every
    /// version they find visible.
    pub(crate) fn locks_reads(self) -> bool {
        matches!(
            self,
            IsolationLevel::RepeatableRead | IsolationLevel::Serializable
        )
    }

    /// Visibility predicate for a transaction `xid` running at this level.
    ///
    /// `snapshot` is the set of other xids that were active when the
    /// transaction started; it is `Some` only under
    /// [`Serializable`](IsolationLevel::Serializable).
    pub(crate) fn record_is_visible(
        self,
        record: &Record,
        xid: Xid,
        active_xids: &HashSet<Xid>,
        snapshot: Option<&HashSet<Xid>>,
    ) -> bool {
        match self {
            IsolationLevel::ReadUncommitted => !record.is_expired(),
            IsolationLevel::ReadCommitted | IsolationLevel::RepeatableRead => {
                committed_visible(record, xid, active_xids)
            }
            IsolationLevel::Serializable => {
                committed_visible(record, xid, active_xids)
                    && record.created_xid <= xid
                    && snapshot.is_none_or(|concurrent| {
                        // Creators that were still running at our start stay
                        // invisible for the whole transaction, even once
                        // they commit.
                        record.created_xid == xid || !concurrent.contains(&record.created_xid)
                    })
            }
        }
    }

    /// Lock predicate: whether a delete of this version by `xid` must be
    /// rejected as a conflict.
    pub(crate) fn record_is_locked(
        self,
        record: &Record,
        xid: Xid,
        active_xids: &HashSet<Xid>,
        locks: &LockManager,
    ) -> bool {
        match self {
            IsolationLevel::ReadUncommitted => record.is_expired(),
            IsolationLevel::ReadCommitted => expired_by_active(record, active_xids),
            IsolationLevel::RepeatableRead | IsolationLevel::Serializable => {
                expired_by_active(record, active_xids)
                    || locks.held_by_other(xid, record.id, active_xids)
            }
        }
    }
}

/// Baseline visibility shared by read-committed and the stricter levels.
fn committed_visible(record: &Record, xid: Xid, active_xids: &HashSet<Xid>) -> bool {
    // Created by another transaction that has not finished yet.
    if active_xids.contains(&record.created_xid) && record.created_xid != xid {
        return false;
    }

    // Expired by a transaction that has finished, or by ourselves.
    if record.is_expired()
        && (!active_xids.contains(&record.expired_xid) || record.expired_xid == xid)
    {
        return false;
    }

    true
}

/// An uncommitted deleter is still holding the version.
fn expired_by_active(record: &Record, active_xids: &HashSet<Xid>) -> bool {
    record.is_expired() && active_xids.contains(&record.expired_xid)
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsolationLevel::ReadUncommitted => write!(f, "READ UNCOMMITTED"),
            IsolationLevel::ReadCommitted => write!(f, "READ COMMITTED"),
            IsolationLevel::RepeatableRead => write!(f, "REPEATABLE READ"),
            IsolationLevel::Serializable => write!(f, "SERIALIZABLE"),
        }
    }
}
