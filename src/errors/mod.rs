pub mod types;
pub mod classification;

pub use types::HunterError;
pub use classification::ErrorClassification;
