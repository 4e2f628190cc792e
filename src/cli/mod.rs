pub mod commands;
pub mod render;
pub mod run;
pub mod status;
pub mod validate;

pub use commands::{Cli, Commands};
