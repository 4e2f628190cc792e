pub mod validator;

pub use validator::{validate_domain, validate_url, ThreatLevel, ValidationResult};
