use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Write-write conflict: the visible version of the row is held by a
    /// concurrent, uncommitted transaction. The caller is expected to roll
    /// the offending transaction back; nothing is retried automatically.
    #[error("Row {0} locked by another transaction")]
    RowLocked(u64),

    /// Operation on a transaction that has already committed or rolled back.
    #[error("Transaction txn_{xid} is already {state}")]
    TransactionNotActive { xid: u64, state: &'static str },

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// True for the recoverable conflict raised by `delete_record` and
    /// `update_record`.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::RowLocked(_))
    }
}

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
