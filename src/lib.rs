pub mod audit;
pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod llm;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod recon;
pub mod reporting;
pub mod router;
pub mod scanner;
pub mod security;
pub mod triage;
