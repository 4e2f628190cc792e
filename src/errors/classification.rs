use super::types::HunterError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    /// Aborts the whole run instead of being contained at a unit boundary.
    pub fatal: bool,
    /// Produces an audit entry in addition to the log line.
    pub audited: bool,
}

impl HunterError {
    /// Classify this error into the pipeline's error taxonomy.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            HunterError::Config(_) => ErrorClassification {
                error_type: "FatalConfigurationError",
                fatal: true,
                audited: false,
            },
            HunterError::Validation(_) => ErrorClassification {
                error_type: "ValidationError",
                fatal: false,
                audited: true,
            },

            // Contained to a single unit of work
            HunterError::ToolExecution(_) => ErrorClassification {
                error_type: "ToolExecutionError",
                fatal: false,
                audited: true,
            },
            HunterError::Timeout(_) => ErrorClassification {
                error_type: "ToolExecutionError",
                fatal: false,
                audited: true,
            },

            HunterError::Store(_) => ErrorClassification {
                error_type: "StoreError",
                fatal: false,
                audited: false,
            },

            // Degrade to a default verdict or get dropped
            HunterError::ExternalService(_) => ErrorClassification {
                error_type: "ExternalServiceError",
                fatal: false,
                audited: false,
            },
            HunterError::RateLimit(_) => ErrorClassification {
                error_type: "ExternalServiceError",
                fatal: false,
                audited: false,
            },
            HunterError::Network(_) => ErrorClassification {
                error_type: "ExternalServiceError",
                fatal: false,
                audited: false,
            },

            HunterError::Io(_) => ErrorClassification {
                error_type: "IoError",
                fatal: false,
                audited: false,
            },
            HunterError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                fatal: false,
                audited: false,
            },
            HunterError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                fatal: false,
                audited: false,
            },
            HunterError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                fatal: false,
                audited: false,
            },
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.classify().fatal
    }
}
