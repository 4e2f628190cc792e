use serde::{Deserialize, Serialize};

/// Lifecycle status of a tracked target. Transitions only move forward:
/// pending → processing → completed | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Statuses a target may hold immediately before moving to `self`.
    /// `Pending → Pending` is allowed so the router can relabel the stage.
    pub fn allowed_predecessors(&self) -> &'static [TaskStatus] {
        match self {
            Self::Pending => &[TaskStatus::Pending],
            Self::Processing => &[TaskStatus::Pending],
            Self::Completed | Self::Failed => &[TaskStatus::Pending, TaskStatus::Processing],
        }
    }

    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        next.allowed_predecessors().contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scan queue a URL is routed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// Versioned paths, graphql, rest endpoints
    Api,
    /// Known CMS path fragments
    Cms,
    /// Script-bearing resources
    JsFile,
    /// Login, auth and admin panels
    Login,
    /// Has query parameters
    Dynamic,
    /// Everything else
    Static,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Cms => "cms",
            Self::JsFile => "js_file",
            Self::Login => "login",
            Self::Dynamic => "dynamic",
            Self::Static => "static",
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URL that survived deduplication and has been assigned a scan queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutedTarget {
    pub url: String,
    pub target_type: TargetType,
    /// Query parameter names, for types whose scanners fuzz them.
    pub parameters: Vec<String>,
    pub tech_stack: Vec<String>,
}

impl RoutedTarget {
    pub fn new(url: &str, target_type: TargetType) -> Self {
        Self {
            url: url.to_string(),
            target_type,
            parameters: Vec::new(),
            tech_stack: Vec::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<String>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// A persisted target row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: i64,
    pub url: String,
    pub status: TaskStatus,
    pub stage: String,
    pub created_at: String,
    pub updated_at: String,
}
