use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use crate::audit::AuditLogger;
use crate::models::finding::{FindingRecord, Severity};
use crate::models::verdict::{TriageVerdict, TriagedFinding};
use crate::notify::Notifier;
use crate::pipeline::context::RunContext;
use crate::pipeline::pool::{PoolStats, UnitOutcome, WorkerPool};
use super::service::TriageService;

const TITLE_DESCRIPTION_LIMIT: usize = 50;

/// Fans findings out to the triage service on a pool narrower than the scan
/// pool. A failing or slow service never loses a finding: the unit falls back
/// to a conservative verdict.
pub struct TriageCoordinator {
    service: Arc<dyn TriageService>,
    notifier: Arc<dyn Notifier>,
    audit: AuditLogger,
    pool: WorkerPool,
    timeout: Duration,
    min_severity: Severity,
}

impl TriageCoordinator {
    pub fn new(ctx: &RunContext, service: Arc<dyn TriageService>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            service,
            notifier,
            audit: ctx.audit.clone(),
            pool: WorkerPool::new("triage", ctx.settings.effective_triage_workers(), ctx.cancel.clone()),
            timeout: ctx.settings.triage_timeout,
            min_severity: ctx.settings.min_triage_severity,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn width(&self) -> usize {
        self.pool.width()
    }

    /// Findings at or above the severity gate.
    pub fn eligible<'a>(&self, findings: &'a [FindingRecord]) -> Vec<&'a FindingRecord> {
        findings.iter().filter(|f| f.severity.meets(self.min_severity)).collect()
    }

    pub async fn run(&self, findings: &[FindingRecord]) -> (Vec<TriagedFinding>, PoolStats) {
        let eligible: Vec<FindingRecord> = self.eligible(findings).into_iter().cloned().collect();
        info!(
            service = self.service.name(),
            total = findings.len(),
            eligible = eligible.len(),
            min_severity = %self.min_severity,
            "Starting triage"
        );

        self.pool.run(eligible, |finding| {
            let service = self.service.clone();
            let notifier = self.notifier.clone();
            let audit = self.audit.clone();
            let timeout = self.timeout;
            async move {
                let verdict = triage_one(service.as_ref(), &finding, timeout).await;
                audit.finding_triaged(&finding.target, verdict.is_valid, verdict.confidence.as_str()).await;

                if verdict.is_alertable() {
                    let title = alert_title(&finding);
                    notifier.notify(&title, &alert_description(&finding, &verdict), finding.severity);
                    audit.alert_sent(&finding.target, &title).await;
                }
                UnitOutcome::Completed(TriagedFinding { finding, verdict })
            }
        }).await
    }
}

async fn triage_one(service: &dyn TriageService, finding: &FindingRecord, timeout: Duration) -> TriageVerdict {
    match tokio::time::timeout(timeout, service.triage(finding)).await {
        Ok(Ok(verdict)) => verdict,
        Ok(Err(e)) => {
            warn!(url = %finding.target, tool = %finding.tool, error = %e, "Triage failed, keeping finding");
            TriageVerdict::fallback(&format!("AI error: {}", e))
        }
        Err(_) => {
            warn!(url = %finding.target, tool = %finding.tool, timeout_secs = timeout.as_secs(), "Triage timed out, keeping finding");
            TriageVerdict::fallback(&format!("AI timeout after {}s", timeout.as_secs()))
        }
    }
}

fn alert_title(finding: &FindingRecord) -> String {
    let short: String = finding.description.chars().take(TITLE_DESCRIPTION_LIMIT).collect();
    format!("{}: {}", finding.tool.to_uppercase(), short)
}

fn alert_description(finding: &FindingRecord, verdict: &TriageVerdict) -> String {
    format!(
        "**Target:** {}\n**Confidence:** {}\n**Reasoning:** {}",
        finding.target,
        verdict.confidence.as_str(),
        verdict.reasoning,
    )
}
