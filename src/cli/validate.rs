use std::path::PathBuf;
use console::style;
use crate::cli::commands::ValidateArgs;
use crate::config::{self, Overrides, Settings};
use crate::errors::HunterError;

pub async fn handle_validate(args: ValidateArgs) -> Result<(), HunterError> {
    let path = PathBuf::from(&args.config);
    let parsed = config::parse_config(&path).await?;
    let settings = Settings::resolve(&parsed, &Overrides::default())?;

    println!("{} Configuration is valid: {}", style("✓").green(), args.config);
    if let Some(scope) = &parsed.scope {
        println!("  scope: {} allowed, {} excluded", scope.allowed_domains.len(), scope.excluded_domains.len());
    }
    println!(
        "  pool: {} scan / {} triage, triage gate {}",
        settings.max_threads,
        settings.effective_triage_workers(),
        settings.min_triage_severity,
    );
    Ok(())
}
