pub mod coordinator;
pub mod parser;
pub mod service;

pub use coordinator::TriageCoordinator;
pub use parser::parse_verdict;
pub use service::{DisabledTriage, LlmTriageService, TriageService};
