// ============================================================================
// MvccDB Library
// ============================================================================

//! A miniature multi-version concurrency control (MVCC) engine.
//!
//! Implements the four SQL isolation levels — read-uncommitted,
//! read-committed, repeatable-read, serializable — over an in-memory
//! append-only record store, with per-transaction rollback logs and a soft
//! lock registry used purely for conflict detection.
//!
//! The engine is driven by an external caller issuing one logical operation
//! at a time. Concurrent transactions are *interleaved*, not run on separate
//! threads; "locked" means the next conflicting write is rejected, never
//! that anyone waits.
//!
//! # Examples
//!
//! ```
//! use mvccdb::{IsolationLevel, Table};
//!
//! # fn main() -> mvccdb::Result<()> {
//! let table = Table::new();
//!
//! let mut setup = table.new_transaction(IsolationLevel::ReadCommitted)?;
//! setup.add_record(1, "Joe")?;
//! setup.commit()?;
//!
//! let mut writer = table.new_transaction(IsolationLevel::ReadCommitted)?;
//! let reader = table.new_transaction(IsolationLevel::ReadCommitted)?;
//!
//! writer.update_record(1, "Joe 2")?;
//!
//! // The reader still sees the committed version.
//! let record = reader.fetch_record(1)?.unwrap();
//! assert_eq!(record.name, "Joe");
//!
//! writer.rollback()?;
//! # drop(reader);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod prelude;
pub mod storage;
pub mod transaction;

// Re-export main types for convenience
pub use crate::core::{DbError, NEVER_EXPIRED, Record, RecordId, Result, Xid};
pub use crate::storage::{LockManager, Table};
pub use crate::transaction::{IsolationLevel, Transaction, TransactionState, UndoAction};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_round_trip() {
        let table = Table::new();

        let mut txn = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();
        txn.add_record(1, "Joe").unwrap();
        txn.add_record(3, "Jill").unwrap();
        txn.commit().unwrap();

        let reader = table.new_transaction(IsolationLevel::Serializable).unwrap();
        assert_eq!(reader.fetch_all_records().unwrap().len(), 2);
    }

    #[test]
    fn test_rollback_discards_everything() {
        let table = Table::new();

        let mut txn = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();
        txn.add_record(1, "Joe").unwrap();
        txn.rollback().unwrap();

        let reader = table.new_transaction(IsolationLevel::ReadCommitted).unwrap();
        assert!(reader.fetch_record(1).unwrap().is_none());
    }
}
