use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use crate::audit::AuditLogger;
use crate::cli::commands::RunArgs;
use crate::cli::render::{print_banner, print_summary};
use crate::config::{self, HunterConfig, Overrides, ScopeGuard, Settings};
use crate::db::Store;
use crate::errors::HunterError;
use crate::llm::create_provider;
use crate::notify::{Notifier, NullNotifier, WebhookNotifier};
use crate::pipeline::{PipelineOrchestrator, RunContext, RunOutcome};
use crate::recon::{FileRecon, ReconSource, StaticRecon, ToolRecon};
use crate::scanner::AdapterRegistry;
use crate::security::validate_domain;
use crate::triage::{DisabledTriage, LlmTriageService, TriageService};
use tracing::{info, warn};

pub(crate) async fn load_config(path: Option<&str>) -> Result<HunterConfig, HunterError> {
    match path {
        Some(p) => config::parse_config(Path::new(p)).await,
        None => Ok(HunterConfig::default()),
    }
}

/// Everything that can fail for configuration reasons happens here, before
/// the store is opened.
async fn prepare(args: &RunArgs) -> Result<(String, Settings, ScopeGuard), HunterError> {
    let checked = validate_domain(&args.domain);
    let domain = match checked.sanitized {
        Some(d) if checked.is_valid => d,
        _ => {
            let reason = checked.warnings.first().cloned().unwrap_or_else(|| "invalid domain".to_string());
            return Err(HunterError::Validation(format!("{}: {}", args.domain, reason)));
        }
    };

    let file_config = load_config(args.config.as_deref()).await?;
    let overrides = Overrides {
        threads: args.threads,
        db_path: args.db.as_ref().map(PathBuf::from),
        output_dir: args.output.as_ref().map(PathBuf::from),
    };
    let settings = Settings::resolve(&file_config, &overrides)?;

    let scope = match &file_config.scope {
        Some(scope) => ScopeGuard::from_config(scope),
        None => ScopeGuard::for_domain(&domain),
    };
    if !scope.is_in_scope(&domain) {
        warn!(domain = %domain, "Target domain itself is outside the configured scope");
    }

    if let Some(urls) = &args.urls {
        if !Path::new(urls).is_file() {
            return Err(HunterError::Config(format!("URL list not found: {}", urls)));
        }
    }
    Ok((domain, settings, scope))
}

fn build_recon(args: &RunArgs, domain: &str, settings: &Settings) -> Box<dyn ReconSource> {
    if args.dry_run {
        Box::new(StaticRecon::dry_run(domain))
    } else if let Some(urls) = &args.urls {
        Box::new(FileRecon::new(urls))
    } else {
        Box::new(ToolRecon::new(
            settings.data_dir.join(domain),
            settings.rate_limit,
            settings.max_threads,
            settings.unit_timeout,
        ))
    }
}

fn build_triage(settings: &Settings) -> Result<Arc<dyn TriageService>, HunterError> {
    match &settings.llm {
        Some(llm) => {
            let provider = create_provider(llm)?;
            info!(provider = provider.provider_name(), model = provider.model_name(), "Triage enabled");
            Ok(Arc::new(LlmTriageService::new(Arc::from(provider))))
        }
        None => {
            warn!("No LLM API key configured, findings will be kept for manual review");
            Ok(Arc::new(DisabledTriage))
        }
    }
}

fn build_notifier(settings: &Settings) -> Arc<dyn Notifier> {
    match &settings.webhook_url {
        Some(url) => {
            let notifier = WebhookNotifier::new(url);
            match &settings.webhook_username {
                Some(name) => Arc::new(notifier.with_username(name)),
                None => Arc::new(notifier),
            }
        }
        None => {
            warn!("No webhook configured, alerts are disabled");
            Arc::new(NullNotifier)
        }
    }
}

pub async fn handle_run(args: RunArgs, cancel: CancellationToken) -> Result<RunOutcome, HunterError> {
    let (domain, settings, scope) = prepare(&args).await?;
    let triage = build_triage(&settings)?;
    let notifier = build_notifier(&settings);
    print_banner(&domain, &settings, args.dry_run);

    let store = Store::open(&settings.db_path, settings.busy_timeout)?;
    let audit = AuditLogger::open(&settings.data_dir).await?;
    info!(session = %audit.session_id(), domain = %domain, "Starting run");

    let recon = build_recon(&args, &domain, &settings);
    let registry = AdapterRegistry::tools(&settings, &settings.data_dir.join(&domain));
    let ctx = RunContext::new(store, audit, settings).with_cancel_token(cancel);

    let orchestrator = PipelineOrchestrator::new(ctx, &domain, scope, recon)
        .with_registry(registry)
        .with_triage(triage)
        .with_notifier(notifier)
        .with_dry_run(args.dry_run);

    let summary = orchestrator.run().await?;
    print_summary(&summary);
    Ok(summary.outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(domain: &str) -> RunArgs {
        RunArgs {
            domain: domain.to_string(),
            config: None,
            urls: None,
            dry_run: true,
            threads: None,
            db: None,
            output: None,
            strict: false,
        }
    }

    #[tokio::test]
    async fn test_invalid_domain_rejected_before_store() {
        let err = prepare(&args("exa mple.com; rm -rf /")).await.unwrap_err();
        assert!(matches!(err, HunterError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_url_list_is_config_error() {
        let mut a = args("example.com");
        a.urls = Some("/nonexistent/urls.txt".to_string());
        let err = prepare(&a).await.unwrap_err();
        assert!(matches!(err, HunterError::Config(_)));
    }

    #[tokio::test]
    async fn test_thread_override_out_of_range() {
        let mut a = args("example.com");
        a.threads = Some(500);
        assert!(matches!(prepare(&a).await.unwrap_err(), HunterError::Config(_)));
    }

    #[tokio::test]
    async fn test_default_scope_is_the_domain() {
        let dir = TempDir::new().unwrap();
        let mut a = args("Example.com");
        a.db = Some(dir.path().join("state.db").to_string_lossy().into_owned());
        let (domain, settings, scope) = prepare(&a).await.unwrap();
        assert_eq!(domain, "example.com");
        assert!(scope.is_in_scope("https://api.example.com/v1"));
        assert!(!scope.is_in_scope("https://example.org/"));
        assert!(!settings.db_path.exists());
    }
}
