use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use crate::config::ScopeGuard;
use crate::db::StatusUpdate;
use crate::errors::HunterError;
use crate::models::finding::FindingRecord;
use crate::models::target::{RoutedTarget, TaskStatus};
use crate::models::verdict::TriagedFinding;
use crate::notify::{Notifier, NullNotifier};
use crate::recon::{ingest, ReconSource};
use crate::reporting::{attach_verdicts, write_report};
use crate::router::Router;
use crate::scanner::AdapterRegistry;
use crate::triage::{DisabledTriage, TriageCoordinator, TriageService};
use super::context::RunContext;
use super::metrics::timed;
use super::phase::display_name;
use super::pool::{PoolStats, UnitOutcome, WorkerPool};
use super::state::{PipelineStage, RunOutcome, RunSummary};
use tracing::{debug, error, info, warn};

/// Drives one run through the stage machine. Every stage boundary contains
/// its own errors; only configuration problems, raised before the
/// orchestrator exists, abort a run.
pub struct PipelineOrchestrator {
    ctx: RunContext,
    domain: String,
    scope: ScopeGuard,
    recon: Box<dyn ReconSource>,
    registry: AdapterRegistry,
    triage: Arc<dyn TriageService>,
    notifier: Arc<dyn Notifier>,
    dry_run: bool,
    findings: Arc<RwLock<Vec<FindingRecord>>>,
}

impl PipelineOrchestrator {
    pub fn new(ctx: RunContext, domain: &str, scope: ScopeGuard, recon: Box<dyn ReconSource>) -> Self {
        Self {
            ctx,
            domain: domain.to_string(),
            scope,
            recon,
            registry: AdapterRegistry::new(),
            triage: Arc::new(DisabledTriage),
            notifier: Arc::new(NullNotifier),
            dry_run: false,
            findings: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_triage(mut self, triage: Arc<dyn TriageService>) -> Self {
        self.triage = triage;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Discover and route as usual, but leave targets pending instead of
    /// scanning them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.ctx.cancel.clone()
    }

    fn enter(&self, stages: &mut Vec<PipelineStage>, next: PipelineStage) {
        if let Some(current) = stages.last() {
            if !current.can_transition_to(next) {
                error!(from = %current, to = %next, "Unexpected stage transition");
            }
        }
        info!(stage = %next, name = display_name(next), domain = %self.domain, "Entering stage");
        stages.push(next);
    }

    async fn shut_down(&self, stages: &mut Vec<PipelineStage>) {
        let interrupted_in = stages.last().copied().unwrap_or(PipelineStage::Init);
        self.enter(stages, PipelineStage::ShuttingDown);
        self.ctx.audit.pipeline_interrupted(&self.domain, interrupted_in.as_str()).await;
    }

    pub async fn run(&self) -> Result<RunSummary, HunterError> {
        let started = Instant::now();
        let mut stages = Vec::new();
        let mut summary = RunSummary {
            domain: self.domain.clone(),
            outcome: RunOutcome::Success,
            resumed: false,
            ingested: 0,
            routed: 0,
            scan: PoolStats::default(),
            triage: PoolStats::default(),
            findings: 0,
            report: None,
            duration_ms: 0,
            stages: Vec::new(),
        };

        self.enter(&mut stages, PipelineStage::Init);
        self.ctx.audit.pipeline_start(&self.domain, self.dry_run, self.ctx.settings.rate_limit).await;
        let done = CancellationToken::new();
        let watcher = self.spawn_shutdown_watcher(done.clone());

        self.enter(&mut stages, PipelineStage::ResumeCheck);
        let resumed = self.resume_check().await;
        summary.resumed = resumed.is_some();

        let targets = match resumed {
            Some(targets) => targets,
            None => {
                self.enter(&mut stages, PipelineStage::Ingest);
                let accepted = self.ingest().await;
                summary.ingested = accepted.len();

                // An interrupt here still passes through ROUTE and SCAN, which
                // do no work once the run is cancelled.
                self.enter(&mut stages, PipelineStage::Route);
                self.route(accepted).await
            }
        };
        summary.routed = targets.len();

        self.enter(&mut stages, PipelineStage::Scan);
        summary.scan = self.scan(targets).await;
        if self.ctx.is_cancelled() {
            self.shut_down(&mut stages).await;
            return Ok(self.finish(summary, stages, started, done, watcher).await);
        }

        // All scan units have drained; no writer is left.
        let findings = self.findings.read().await.clone();
        summary.findings = findings.len();

        self.enter(&mut stages, PipelineStage::Triage);
        let (triaged, triage_stats) = self.triage(&findings).await;
        summary.triage = triage_stats;
        if self.ctx.is_cancelled() {
            self.shut_down(&mut stages).await;
            return Ok(self.finish(summary, stages, started, done, watcher).await);
        }

        self.enter(&mut stages, PipelineStage::Report);
        let entries = attach_verdicts(&findings, triaged);
        match write_report(&self.ctx.settings.output_dir, &self.domain, &entries).await {
            Ok(paths) => summary.report = Some(paths.markdown),
            Err(e) => error!(error = %e, "Failed to write report"),
        }

        Ok(self.finish(summary, stages, started, done, watcher).await)
    }

    async fn finish(
        &self,
        mut summary: RunSummary,
        mut stages: Vec<PipelineStage>,
        started: Instant,
        done: CancellationToken,
        watcher: JoinHandle<()>,
    ) -> RunSummary {
        self.enter(&mut stages, PipelineStage::Done);
        done.cancel();
        if let Err(e) = watcher.await {
            warn!(error = %e, "Shutdown watcher ended abnormally");
        }
        if !self.ctx.is_cancelled() {
            if let Err(e) = self.ctx.store.blocking(|store| store.checkpoint()).await {
                warn!(error = %e, "Final checkpoint failed");
            }
        }
        self.notifier.flush().await;

        summary.outcome = if self.ctx.is_cancelled() {
            RunOutcome::Interrupted
        } else if summary.scan.failed > 0 || (stages.contains(&PipelineStage::Report) && summary.report.is_none()) {
            RunOutcome::PartialFailure
        } else {
            RunOutcome::Success
        };
        summary.duration_ms = started.elapsed().as_millis() as u64;
        summary.stages = stages;

        self.ctx.audit.pipeline_end(&self.domain, summary.findings, summary.outcome.as_str()).await;
        info!(
            domain = %self.domain,
            outcome = summary.outcome.as_str(),
            findings = summary.findings,
            duration_ms = summary.duration_ms,
            "Pipeline finished"
        );
        summary
    }

    /// Checkpoint the store as soon as the run is cancelled, before in-flight
    /// units drain.
    fn spawn_shutdown_watcher(&self, done: CancellationToken) -> JoinHandle<()> {
        let cancel = self.ctx.cancel.clone();
        let store = self.ctx.store.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    warn!("Shutdown requested, checkpointing store");
                    if let Err(e) = store.blocking(|s| s.checkpoint()).await {
                        error!(error = %e, "Checkpoint on shutdown failed");
                    }
                }
                _ = done.cancelled() => {}
            }
        })
    }

    /// Pending targets left behind by an earlier run, when there are more of
    /// them than the resume threshold. They are routed again, so rows an
    /// earlier run ingested but never routed still get the static filter and
    /// deduplication.
    async fn resume_check(&self) -> Option<Vec<RoutedTarget>> {
        let threshold = self.ctx.settings.resume_threshold;
        let limit = self.ctx.settings.resume_limit;

        let counts = match self.ctx.store.blocking(|store| store.count_targets_by_status()).await {
            Ok(counts) => counts,
            Err(e) => {
                warn!(error = %e, "Resume check failed, starting fresh");
                return None;
            }
        };
        let stuck = counts.get(&TaskStatus::Processing).copied().unwrap_or(0);
        if stuck > 0 {
            warn!(stuck, "Targets left in processing by an earlier run; they are not resumed");
        }
        let pending = counts.get(&TaskStatus::Pending).copied().unwrap_or(0);
        if pending <= threshold {
            debug!(pending, threshold, "Nothing to resume");
            return None;
        }

        match self.ctx.store.blocking(move |store| store.get_pending_tasks(limit)).await {
            Ok(rows) => {
                info!(pending, loaded = rows.len(), "Resuming pending targets, skipping ingestion");
                Some(self.route(rows.into_iter().map(|t| t.url).collect()).await)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load pending targets, starting fresh");
                None
            }
        }
    }

    async fn ingest(&self) -> Vec<String> {
        let urls = match self.recon.discover(&self.domain).await {
            Ok(urls) => urls,
            Err(e) => {
                error!(source = self.recon.name(), error = %e, "Discovery failed");
                return Vec::new();
            }
        };
        info!(source = self.recon.name(), discovered = urls.len(), "Discovery finished");

        match ingest(&self.ctx, &self.scope, urls).await {
            Ok(report) => report.accepted,
            Err(e) => {
                error!(error = %e, "Ingestion failed");
                Vec::new()
            }
        }
    }

    async fn route(&self, urls: Vec<String>) -> Vec<RoutedTarget> {
        if self.ctx.is_cancelled() {
            info!(unrouted = urls.len(), "Run cancelled, routing skipped");
            return Vec::new();
        }
        let store = self.ctx.store.clone();
        let routed = tokio::task::spawn_blocking(move || {
            let mut router = Router::new().with_store(store);
            router.route_targets(&urls);
            router.into_flat()
        })
        .await;

        match routed {
            Ok(targets) => targets,
            Err(e) => {
                error!(error = %e, "Routing task failed");
                Vec::new()
            }
        }
    }

    async fn scan(&self, targets: Vec<RoutedTarget>) -> PoolStats {
        if self.dry_run {
            for target in &targets {
                info!(url = %target.url, target_type = %target.target_type, "Dry run: would scan");
            }
            return PoolStats { skipped: targets.len(), ..Default::default() };
        }

        let pool = WorkerPool::new("scan", self.ctx.settings.max_threads, self.ctx.cancel.clone());
        let (_, stats) = pool.run(targets, |target| {
            scan_unit(self.ctx.clone(), self.registry.clone(), self.findings.clone(), target)
        }).await;
        stats
    }

    async fn triage(&self, findings: &[FindingRecord]) -> (Vec<TriagedFinding>, PoolStats) {
        let coordinator = TriageCoordinator::new(&self.ctx, self.triage.clone(), self.notifier.clone());
        if self.dry_run {
            info!(eligible = coordinator.eligible(findings).len(), "Dry run: would triage");
            return (Vec::new(), PoolStats::default());
        }
        coordinator.run(findings).await
    }
}

async fn set_status(ctx: &RunContext, url: &str, status: TaskStatus, stage: Option<&'static str>) -> Result<StatusUpdate, HunterError> {
    let url = url.to_string();
    ctx.store.blocking(move |store| store.update_task_status(&url, status, stage)).await
}

async fn mark_failed(ctx: &RunContext, url: &str) {
    if let Err(e) = set_status(ctx, url, TaskStatus::Failed, None).await {
        error!(url = %url, error = %e, "Failed to mark target failed, it stays in processing");
    }
}

/// One scan unit: claim the target, run its adapter under the unit timeout,
/// persist and aggregate what it found. Any failure stays inside the unit.
async fn scan_unit(
    ctx: RunContext,
    registry: AdapterRegistry,
    findings: Arc<RwLock<Vec<FindingRecord>>>,
    target: RoutedTarget,
) -> UnitOutcome<usize> {
    let url = target.url.clone();
    let target_type = target.target_type;

    match set_status(&ctx, &url, TaskStatus::Processing, None).await {
        Ok(StatusUpdate::Applied) | Ok(StatusUpdate::UnknownTarget) => {}
        Ok(StatusUpdate::Rejected { current }) => {
            debug!(url = %url, current = %current, "Target already claimed, skipping");
            return UnitOutcome::Skipped;
        }
        Err(e) => warn!(url = %url, error = %e, "Could not mark target processing, scanning anyway"),
    }

    let Some(adapter) = registry.get(target_type) else {
        debug!(url = %url, target_type = %target_type, "No adapter for target type");
        if let Err(e) = set_status(&ctx, &url, TaskStatus::Completed, Some("skipped")).await {
            warn!(url = %url, error = %e, "Failed to mark target skipped");
        }
        return UnitOutcome::Skipped;
    };

    let unit_timeout = ctx.settings.unit_timeout;
    let label = format!("{}:{}", adapter.name(), url);
    let (result, _) = timed(&label, tokio::time::timeout(unit_timeout, adapter.run(&target))).await;

    match result {
        Ok(Ok(records)) => {
            let batch = records.clone();
            let unit_url = url.clone();
            let persisted = ctx.store
                .blocking(move |store| store.complete_with_findings(&unit_url, &batch, "scanned"))
                .await;
            match persisted {
                Ok((_, StatusUpdate::Applied)) => {}
                Ok((_, update)) => warn!(url = %url, update = ?update, "Target not marked completed"),
                Err(e) => {
                    error!(url = %url, error = %e, "Failed to persist findings");
                    mark_failed(&ctx, &url).await;
                    ctx.audit.scan_error(&url, target_type.as_str(), &e.to_string(), e.classify().error_type).await;
                    return UnitOutcome::Failed;
                }
            }

            for record in &records {
                ctx.audit.finding_detected(&record.target, &record.tool, record.severity.as_str()).await;
            }

            let count = records.len();
            info!(url = %url, tool = adapter.name(), findings = count, "Scan unit completed");
            findings.write().await.extend(records);
            UnitOutcome::Completed(count)
        }
        Ok(Err(e)) => {
            let class = e.classify();
            warn!(url = %url, tool = adapter.name(), error = %e, error_type = class.error_type, "Scan unit failed");
            mark_failed(&ctx, &url).await;
            if class.audited {
                ctx.audit.scan_error(&url, target_type.as_str(), &e.to_string(), class.error_type).await;
            }
            UnitOutcome::Failed
        }
        Err(_) => {
            warn!(url = %url, tool = adapter.name(), timeout_secs = unit_timeout.as_secs(), "Scan unit timed out");
            mark_failed(&ctx, &url).await;
            ctx.audit.scan_timeout(&url, target_type.as_str(), unit_timeout.as_secs()).await;
            UnitOutcome::Failed
        }
    }
}
