pub mod logger;
pub mod utils;

pub use logger::{AuditAction, AuditEvent, AuditLevel, AuditLogger};
pub use utils::atomic_write;
