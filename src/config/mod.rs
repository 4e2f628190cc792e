pub mod credentials;
pub mod parser;
pub mod schema;
pub mod scope;
pub mod security;
pub mod settings;
pub mod types;

pub use types::*;
pub use parser::{parse_config, parse_config_str};
pub use scope::ScopeGuard;
pub use settings::{LlmSettings, Overrides, Settings};
