use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use hunter::audit::AuditLogger;
use hunter::config::{HunterConfig, Overrides, Settings, StorageConfig};
use hunter::db::Store;
use hunter::errors::HunterError;
use hunter::models::finding::{Confidence, FindingRecord, Severity};
use hunter::models::target::{RoutedTarget, TargetType, TaskStatus};
use hunter::pipeline::{PipelineOrchestrator, RunContext, RunOutcome};
use hunter::config::ScopeGuard;
use hunter::recon::StaticRecon;
use hunter::scanner::{AdapterRegistry, ScanAdapter};
use tempfile::TempDir;

struct CountingAdapter {
    calls: AtomicUsize,
}

#[async_trait]
impl ScanAdapter for CountingAdapter {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn run(&self, target: &RoutedTarget) -> Result<Vec<FindingRecord>, HunterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![FindingRecord::new("counting", &target.url, Severity::Medium, "seen")])
    }
}

async fn context(dir: &TempDir) -> RunContext {
    let config = HunterConfig {
        storage: Some(StorageConfig {
            data_dir: Some(dir.path().join("data").to_string_lossy().into_owned()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let overrides = Overrides {
        output_dir: Some(dir.path().join("reports")),
        ..Default::default()
    };
    let settings = Settings::resolve(&config, &overrides).unwrap();
    let store = Store::open(&settings.db_path, settings.busy_timeout).unwrap();
    let audit = AuditLogger::open(&settings.data_dir).await.unwrap();
    RunContext::new(store, audit, settings)
}

#[test]
fn add_target_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path().join("state.db"), hunter::db::DEFAULT_BUSY_TIMEOUT).unwrap();
    for _ in 0..5 {
        store.add_target("https://app.example.com/", "recon").unwrap();
    }
    let counts = store.count_targets_by_status().unwrap();
    assert_eq!(counts.get(&TaskStatus::Pending), Some(&1));
}

#[test]
fn orphan_findings_are_dropped() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path().join("state.db"), hunter::db::DEFAULT_BUSY_TIMEOUT).unwrap();
    let id = store
        .add_finding("https://ghost.example.com/", "nuclei", Severity::High, "orphan", Confidence::Low)
        .unwrap();
    assert!(id.is_none());
    assert!(store.get_target("https://ghost.example.com/").unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn crash_resume_schedules_exactly_the_pending_targets() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir).await;

    // State left behind by an interrupted run: N pending, some already done.
    let pending: Vec<String> = (0..12).map(|i| format!("https://app.example.com/item{}.php?id=1", i)).collect();
    for url in &pending {
        ctx.store.add_target(url, "dynamic").unwrap();
    }
    ctx.store.add_target("https://app.example.com/done.php?id=1", "dynamic").unwrap();
    ctx.store.update_task_status("https://app.example.com/done.php?id=1", TaskStatus::Completed, None).unwrap();
    ctx.store.add_target("https://app.example.com/bad.php?id=1", "dynamic").unwrap();
    ctx.store.update_task_status("https://app.example.com/bad.php?id=1", TaskStatus::Failed, None).unwrap();

    let adapter = Arc::new(CountingAdapter { calls: AtomicUsize::new(0) });
    let orchestrator = PipelineOrchestrator::new(
        ctx.clone(),
        "example.com",
        ScopeGuard::for_domain("example.com"),
        Box::new(StaticRecon::new(["https://app.example.com/new.php?id=1"])),
    )
    .with_registry(AdapterRegistry::new().with_adapter(TargetType::Dynamic, adapter.clone()));

    let summary = orchestrator.run().await.unwrap();

    assert!(summary.resumed);
    assert_eq!(summary.outcome, RunOutcome::Success);
    assert_eq!(summary.scan.submitted, pending.len());
    assert_eq!(adapter.calls.load(Ordering::SeqCst), pending.len());
    assert!(ctx.store.get_target("https://app.example.com/new.php?id=1").unwrap().is_none());

    let bad = ctx.store.get_target("https://app.example.com/bad.php?id=1").unwrap().unwrap();
    assert_eq!(bad.status, TaskStatus::Failed);

    let counts = ctx.store.count_targets_by_status().unwrap();
    assert_eq!(counts.get(&TaskStatus::Completed), Some(&(pending.len() + 1)));
    assert_eq!(counts.get(&TaskStatus::Pending), None);
}
