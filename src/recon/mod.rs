pub mod sources;
pub mod tools;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use crate::config::ScopeGuard;
use crate::errors::HunterError;
use crate::pipeline::context::RunContext;
use crate::security::validate_url;

pub use sources::{CombinedRecon, FileRecon, StaticRecon};
pub use tools::ToolRecon;

/// Stage label given to freshly ingested targets.
pub const RECON_STAGE: &str = "recon";

/// Produces raw candidate URLs for a domain.
#[async_trait]
pub trait ReconSource: Send + Sync {
    fn name(&self) -> &str;
    async fn discover(&self, domain: &str) -> Result<Vec<String>, HunterError>;
}

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Validated, in-scope URLs in discovery order.
    pub accepted: Vec<String>,
    /// Accepted URLs that were not already in the store.
    pub new_targets: usize,
    pub invalid: usize,
    pub out_of_scope: usize,
}

/// Validate each URL, drop anything out of scope, and record the rest as
/// pending targets. Rejections severe enough to look like an attack and all
/// scope violations are audited.
pub async fn ingest(ctx: &RunContext, scope: &ScopeGuard, urls: Vec<String>) -> Result<IngestReport, HunterError> {
    let mut report = IngestReport::default();

    for raw in urls {
        let result = validate_url(&raw);
        let url = match result.sanitized {
            Some(url) if result.is_valid => url,
            _ => {
                report.invalid += 1;
                let reason = result.warnings.first().map(String::as_str).unwrap_or("invalid URL");
                if result.threat_level.is_audited() {
                    ctx.audit.dangerous_input(&raw, result.threat_level.as_str(), reason).await;
                } else {
                    debug!(url = %raw, reason = %reason, "Dropping invalid URL");
                }
                continue;
            }
        };

        if !scope.is_in_scope(&url) {
            report.out_of_scope += 1;
            ctx.audit.scope_violation(&url, &scope.rejection_reason(&url)).await;
            continue;
        }
        report.accepted.push(url);
    }

    let batch = report.accepted.clone();
    report.new_targets = ctx.store.blocking(move |store| {
        let mut inserted = 0;
        for url in &batch {
            match store.add_target(url, RECON_STAGE) {
                Ok(true) => inserted += 1,
                Ok(false) => {}
                Err(e) => warn!(url = %url, error = %e, "Failed to record target"),
            }
        }
        Ok(inserted)
    }).await?;

    info!(
        accepted = report.accepted.len(),
        new = report.new_targets,
        invalid = report.invalid,
        out_of_scope = report.out_of_scope,
        "Ingestion finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use crate::audit::logger::AuditAction;
    use crate::config::PipelineConfig;
    use crate::models::target::TaskStatus;
    use crate::pipeline::context::testing::context_in;

    #[tokio::test]
    async fn test_ingest_filters_and_records() {
        let dir = TempDir::new().unwrap();
        let ctx = context_in(dir.path(), PipelineConfig::default()).await;
        let scope = ScopeGuard::new(&[".example.com".to_string()], &["admin.example.com".to_string()]);

        let urls = vec![
            "https://app.example.com/login".to_string(),
            "https://admin.example.com/panel".to_string(),
            "https://evil.test/".to_string(),
            "https://app.example.com/x;rm -rf /".to_string(),
            "ftp://files.example.com/".to_string(),
            "https://app.example.com/login".to_string(),
        ];
        let report = ingest(&ctx, &scope, urls).await.unwrap();

        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.new_targets, 1);
        assert_eq!(report.out_of_scope, 2);
        assert_eq!(report.invalid, 2);

        let target = ctx.store.get_target("https://app.example.com/login").unwrap().unwrap();
        assert_eq!(target.status, TaskStatus::Pending);
        assert_eq!(target.stage, RECON_STAGE);
        assert!(ctx.store.get_target("https://admin.example.com/panel").unwrap().is_none());

        let events = ctx.audit.recent_events(20).await.unwrap();
        assert_eq!(events.iter().filter(|e| e.action == AuditAction::ScopeViolation).count(), 2);
        assert_eq!(events.iter().filter(|e| e.action == AuditAction::DangerousInput).count(), 1);
    }
}
