pub mod connection;
pub mod schema;
pub mod targets;
pub mod findings;

pub use connection::{Store, DEFAULT_BUSY_TIMEOUT};
pub use targets::StatusUpdate;
