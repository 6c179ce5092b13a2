pub mod error;
pub mod record;

pub use error::{DbError, Result};
pub use record::{NEVER_EXPIRED, Record, RecordId, Xid};
