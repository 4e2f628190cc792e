use std::path::{Path, PathBuf};
use std::sync::Arc;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use crate::errors::HunterError;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    PipelineStart,
    PipelineEnd,
    PipelineInterrupted,
    ScopeViolation,
    DangerousInput,
    ScanTimeout,
    ScanError,
    FindingDetected,
    FindingTriaged,
    AlertSent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditLevel {
    Info,
    Warning,
    Error,
    Critical,
}

/// One line of the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub action: AuditAction,
    pub target: Option<String>,
    pub details: Value,
    pub severity: AuditLevel,
    pub session_id: String,
}

/// Append-only JSON-lines audit trail shared by every stage of a run.
/// Write failures are logged and swallowed so auditing never fails a unit.
#[derive(Clone)]
pub struct AuditLogger {
    path: PathBuf,
    session_id: String,
    file: Arc<Mutex<tokio::fs::File>>,
}

impl AuditLogger {
    pub async fn open(data_dir: &Path) -> Result<Self, HunterError> {
        tokio::fs::create_dir_all(data_dir).await?;
        let path = data_dir.join("audit.log");
        let file = tokio::fs::OpenOptions::new()
            .create(true).append(true).open(&path).await?;
        let session_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        Ok(Self {
            path,
            session_id,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn log(&self, action: AuditAction, target: Option<&str>, details: Value, severity: AuditLevel) {
        let event = AuditEvent {
            timestamp: Utc::now().to_rfc3339(),
            action,
            target: target.map(str::to_string),
            details,
            severity,
            session_id: self.session_id.clone(),
        };
        if let Err(e) = self.append(&event).await {
            warn!(error = %e, action = ?action, "Failed to write audit event");
        }
    }

    async fn append(&self, event: &AuditEvent) -> Result<(), HunterError> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    pub async fn pipeline_start(&self, domain: &str, dry_run: bool, rate_limit: u32) {
        self.log(
            AuditAction::PipelineStart,
            Some(domain),
            json!({ "dry_run": dry_run, "rate_limit": rate_limit }),
            AuditLevel::Info,
        ).await;
    }

    pub async fn pipeline_end(&self, domain: &str, findings_count: usize, outcome: &str) {
        self.log(
            AuditAction::PipelineEnd,
            Some(domain),
            json!({ "findings_count": findings_count, "outcome": outcome }),
            AuditLevel::Info,
        ).await;
    }

    pub async fn pipeline_interrupted(&self, domain: &str, stage: &str) {
        self.log(
            AuditAction::PipelineInterrupted,
            Some(domain),
            json!({ "stage": stage }),
            AuditLevel::Warning,
        ).await;
    }

    pub async fn scope_violation(&self, url: &str, reason: &str) {
        self.log(AuditAction::ScopeViolation, Some(url), json!({ "reason": reason }), AuditLevel::Warning).await;
    }

    pub async fn dangerous_input(&self, value: &str, threat_level: &str, reason: &str) {
        self.log(
            AuditAction::DangerousInput,
            Some(value),
            json!({ "threat_level": threat_level, "reason": reason }),
            AuditLevel::Critical,
        ).await;
    }

    pub async fn scan_timeout(&self, url: &str, target_type: &str, timeout_secs: u64) {
        self.log(
            AuditAction::ScanTimeout,
            Some(url),
            json!({ "target_type": target_type, "timeout_secs": timeout_secs }),
            AuditLevel::Warning,
        ).await;
    }

    pub async fn scan_error(&self, url: &str, target_type: &str, error: &str, error_type: &str) {
        self.log(
            AuditAction::ScanError,
            Some(url),
            json!({ "target_type": target_type, "error": error, "error_type": error_type }),
            AuditLevel::Error,
        ).await;
    }

    pub async fn finding_detected(&self, url: &str, tool: &str, severity: &str) {
        self.log(
            AuditAction::FindingDetected,
            Some(url),
            json!({ "tool": tool, "severity": severity }),
            AuditLevel::Info,
        ).await;
    }

    pub async fn finding_triaged(&self, url: &str, is_valid: bool, confidence: &str) {
        self.log(
            AuditAction::FindingTriaged,
            Some(url),
            json!({ "is_valid": is_valid, "confidence": confidence }),
            AuditLevel::Info,
        ).await;
    }

    pub async fn alert_sent(&self, url: &str, title: &str) {
        self.log(AuditAction::AlertSent, Some(url), json!({ "title": title }), AuditLevel::Info).await;
    }

    /// The last `limit` events in the log, oldest first. Lines that do not
    /// parse are skipped.
    pub async fn recent_events(&self, limit: usize) -> Result<Vec<AuditEvent>, HunterError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let events: Vec<AuditEvent> = content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();
        let skip = events.len().saturating_sub(limit);
        Ok(events.into_iter().skip(skip).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_events_are_json_lines() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLogger::open(dir.path()).await.unwrap();
        audit.pipeline_start("example.com", true, 150).await;
        audit.scope_violation("https://evil.com/", "evil.com is not in the allow list").await;

        let content = std::fs::read_to_string(dir.path().join("audit.log")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["action"], "pipeline_start");
        assert_eq!(first["details"]["dry_run"], true);
        assert_eq!(first["severity"], "INFO");
        assert_eq!(first["session_id"].as_str().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_recent_events_returns_tail() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLogger::open(dir.path()).await.unwrap();
        for i in 0..5 {
            audit.scan_timeout(&format!("https://example.com/{}", i), "dynamic", 300).await;
        }
        audit.alert_sent("https://example.com/x", "[HIGH] XSS").await;

        let events = audit.recent_events(2).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, AuditAction::ScanTimeout);
        assert_eq!(events[0].target.as_deref(), Some("https://example.com/4"));
        assert_eq!(events[1].action, AuditAction::AlertSent);
        assert!(events.iter().all(|e| e.session_id == audit.session_id()));
    }

    #[tokio::test]
    async fn test_reopen_appends() {
        let dir = TempDir::new().unwrap();
        let first = AuditLogger::open(dir.path()).await.unwrap();
        first.pipeline_end("example.com", 3, "success").await;
        let second = AuditLogger::open(dir.path()).await.unwrap();
        second.pipeline_end("example.com", 0, "success").await;

        let events = second.recent_events(10).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_ne!(events[0].session_id, events[1].session_id);
    }
}
