//! Convenience re-exports for driving the engine.
//!
//! Intended usage in harness code: build one [`Table`], commit a baseline,
//! then interleave [`Transaction`] handles under a chosen
//! [`IsolationLevel`].

pub use crate::core::{DbError, NEVER_EXPIRED, Record, RecordId, Result, Xid};
pub use crate::storage::Table;
pub use crate::transaction::{IsolationLevel, Transaction, TransactionState};
