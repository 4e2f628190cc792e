use thiserror::Error;

#[derive(Debug, Error)]
pub enum HunterError {
    /// Missing scope or invalid settings. The only kind that aborts a run.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Rate limited: {0}")]
    RateLimit(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for HunterError {
    fn from(e: rusqlite::Error) -> Self {
        HunterError::Store(e.to_string())
    }
}
