pub mod lock;
pub mod table;

pub use lock::LockManager;
pub use table::Table;
