// ============================================================================
// Transaction Management Module
// ============================================================================
//
// Implements interleaved MVCC transactions over the append-only record
// store, with per-transaction rollback logs and pluggable isolation levels.
//
// Design Patterns Used:
// - State Pattern: Transaction lifecycle (Active, Committed, RolledBack)
// - Command Pattern: Reversible undo actions for rollback
// - Strategy (enum dispatch): visibility/lock predicates per isolation level
//
// ============================================================================

pub mod isolation;
pub mod state;
pub mod undo;

pub use isolation::IsolationLevel;
pub use state::{Transaction, TransactionState};
pub use undo::UndoAction;
