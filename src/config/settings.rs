use std::path::PathBuf;
use std::time::Duration;
use crate::errors::HunterError;
use crate::models::finding::Severity;
use super::credentials::resolve_secret;
use super::types::HunterConfig;

pub const DEFAULT_MAX_THREADS: usize = 10;
pub const DEFAULT_UNIT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_RATE_LIMIT: u32 = 150;
pub const DEFAULT_TRIAGE_WORKERS: usize = 5;
pub const DEFAULT_TRIAGE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RESUME_LIMIT: usize = 500;
pub const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = "reports";

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub threads: Option<usize>,
    pub db_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: String,
    pub model: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
}

/// Fully resolved run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub max_threads: usize,
    pub unit_timeout: Duration,
    pub rate_limit: u32,
    pub triage_workers: usize,
    pub triage_timeout: Duration,
    pub min_triage_severity: Severity,
    pub resume_threshold: usize,
    pub resume_limit: usize,
    pub enable_bruteforce: bool,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub busy_timeout: Duration,
    pub output_dir: PathBuf,
    pub llm: Option<LlmSettings>,
    pub webhook_url: Option<String>,
    pub webhook_username: Option<String>,
}

impl Settings {
    pub fn resolve(config: &HunterConfig, overrides: &Overrides) -> Result<Self, HunterError> {
        let pipeline = config.pipeline.clone().unwrap_or_default();
        let storage = config.storage.clone().unwrap_or_default();

        let data_dir = PathBuf::from(storage.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR));
        let db_path = overrides.db_path.clone()
            .or_else(|| storage.db_path.as_deref().map(PathBuf::from))
            .unwrap_or_else(|| data_dir.join("state.db"));
        let output_dir = overrides.output_dir.clone()
            .or_else(|| config.output.as_ref().and_then(|o| o.directory.as_deref()).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let settings = Self {
            max_threads: overrides.threads.or(pipeline.max_threads).unwrap_or(DEFAULT_MAX_THREADS),
            unit_timeout: Duration::from_secs(pipeline.unit_timeout_secs.unwrap_or(DEFAULT_UNIT_TIMEOUT_SECS)),
            rate_limit: pipeline.rate_limit.unwrap_or(DEFAULT_RATE_LIMIT),
            triage_workers: pipeline.triage_workers.unwrap_or(DEFAULT_TRIAGE_WORKERS),
            triage_timeout: Duration::from_secs(pipeline.triage_timeout_secs.unwrap_or(DEFAULT_TRIAGE_TIMEOUT_SECS)),
            min_triage_severity: pipeline.min_triage_severity.unwrap_or(Severity::Medium),
            resume_threshold: pipeline.resume_threshold.unwrap_or(0),
            resume_limit: pipeline.resume_limit.unwrap_or(DEFAULT_RESUME_LIMIT),
            enable_bruteforce: pipeline.enable_bruteforce.unwrap_or(false),
            data_dir,
            db_path,
            busy_timeout: Duration::from_secs(storage.busy_timeout_secs.unwrap_or(DEFAULT_BUSY_TIMEOUT_SECS)),
            output_dir,
            llm: resolve_llm(config),
            webhook_url: resolve_secret(
                config.notifications.as_ref().and_then(|n| n.webhook_url.as_deref()),
                &["DISCORD_WEBHOOK_URL"],
            ),
            webhook_username: config.notifications.as_ref().and_then(|n| n.username.clone()),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Range checks on the resolved values, including CLI overrides.
    pub fn validate(&self) -> Result<(), HunterError> {
        if !(1..=50).contains(&self.max_threads) {
            return Err(HunterError::Config(format!(
                "max_threads must be between 1 and 50, got {}", self.max_threads
            )));
        }
        if self.unit_timeout < Duration::from_secs(10) {
            return Err(HunterError::Config(format!(
                "unit_timeout_secs must be at least 10, got {}", self.unit_timeout.as_secs()
            )));
        }
        if !(1..=1000).contains(&self.rate_limit) {
            return Err(HunterError::Config(format!(
                "rate_limit must be between 1 and 1000, got {}", self.rate_limit
            )));
        }
        if self.triage_workers == 0 {
            return Err(HunterError::Config("triage_workers must be at least 1".into()));
        }
        if self.triage_timeout.is_zero() {
            return Err(HunterError::Config("triage_timeout_secs must be at least 1".into()));
        }
        if self.resume_limit == 0 {
            return Err(HunterError::Config("resume_limit must be at least 1".into()));
        }
        if self.busy_timeout < Duration::from_secs(1) {
            return Err(HunterError::Config("busy_timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    /// Triage never runs wider than the scan pool.
    pub fn effective_triage_workers(&self) -> usize {
        self.triage_workers.min(self.max_threads)
    }
}

fn resolve_llm(config: &HunterConfig) -> Option<LlmSettings> {
    let llm = config.llm.clone().unwrap_or_default();
    let provider = llm.provider.unwrap_or_else(|| "gemini".to_string()).to_lowercase();
    let fallback: &[&str] = match provider.as_str() {
        "openai" => &["OPENAI_API_KEY"],
        _ => &["GEMINI_API_KEY"],
    };
    let api_key = resolve_secret(llm.api_key.as_deref(), fallback)?;
    Some(LlmSettings {
        provider,
        model: llm.model,
        api_key,
        base_url: llm.base_url,
    })
}
