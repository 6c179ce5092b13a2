use serde::{Deserialize, Serialize};

/// Transaction identifier, also used as a logical timestamp.
///
/// Allocated by the [`Table`](crate::storage::Table) once per transaction,
/// strictly increasing, never reused.
pub type Xid = u64;

/// Logical row identity. Several versions may share one id; together they
/// form that row's history.
pub type RecordId = u64;

/// Sentinel value for [`Record::expired_xid`]: the version has never been
/// expired.
pub const NEVER_EXPIRED: Xid = 0;

/// One immutable version of a logical row.
///
/// `created_xid` is stamped at creation and never changes. `expired_xid`
/// starts at [`NEVER_EXPIRED`] and is set exactly once by the transaction
/// that logically deletes the version; only that transaction's rollback may
/// reset it. Versions are never physically removed, which is what makes
/// rollback and multi-version visibility possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub created_xid: Xid,
    pub expired_xid: Xid,
}

impl Record {
    pub(crate) fn new(id: RecordId, name: String, created_xid: Xid) -> Self {
        Self {
            id,
            name,
            created_xid,
            expired_xid: NEVER_EXPIRED,
        }
    }

    /// Whether some transaction has stamped this version as deleted.
    /// Visibility of the deletion still depends on the isolation level.
    pub fn is_expired(&self) -> bool {
        self.expired_xid != NEVER_EXPIRED
    }
}
