use serde::{Deserialize, Serialize};
use crate::models::finding::Severity;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HunterConfig {
    pub scope: Option<ScopeConfig>,
    pub pipeline: Option<PipelineConfig>,
    pub storage: Option<StorageConfig>,
    pub llm: Option<LLMConfig>,
    pub notifications: Option<NotificationsConfig>,
    pub output: Option<OutputConfig>,
}

/// Authorized scope. Entries with a leading dot match subdomains only.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ScopeConfig {
    #[serde(default)]
    pub allowed_domains: Vec<String>,
    #[serde(default)]
    pub excluded_domains: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PipelineConfig {
    pub max_threads: Option<usize>,
    pub unit_timeout_secs: Option<u64>,
    /// Requests per second handed to tools that support rate limiting.
    pub rate_limit: Option<u32>,
    pub triage_workers: Option<usize>,
    pub triage_timeout_secs: Option<u64>,
    pub min_triage_severity: Option<Severity>,
    /// Skip ingestion when more than this many targets are still pending.
    pub resume_threshold: Option<usize>,
    pub resume_limit: Option<usize>,
    pub enable_bruteforce: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StorageConfig {
    pub db_path: Option<String>,
    pub data_dir: Option<String>,
    pub busy_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LLMConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NotificationsConfig {
    pub webhook_url: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OutputConfig {
    pub directory: Option<String>,
}
