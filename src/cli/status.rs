use std::path::PathBuf;
use serde_json::json;
use crate::cli::commands::StatusArgs;
use crate::cli::render::print_status;
use crate::cli::run::load_config;
use crate::config::{Overrides, Settings};
use crate::db::Store;
use crate::errors::HunterError;

pub async fn handle_status(args: StatusArgs) -> Result<(), HunterError> {
    let file_config = load_config(args.config.as_deref()).await?;
    let overrides = Overrides {
        db_path: args.db.as_ref().map(PathBuf::from),
        ..Default::default()
    };
    let settings = Settings::resolve(&file_config, &overrides)?;
    if !settings.db_path.is_file() {
        return Err(HunterError::Config(format!("No database at {}", settings.db_path.display())));
    }

    let store = Store::open(&settings.db_path, settings.busy_timeout)?;
    let (targets, findings) = store.blocking(|s| {
        Ok((s.count_targets_by_status()?, s.count_findings_by_severity()?))
    }).await?;

    if args.json {
        let targets: serde_json::Map<String, serde_json::Value> = targets
            .iter()
            .map(|(status, n)| (status.as_str().to_string(), json!(n)))
            .collect();
        let findings: serde_json::Map<String, serde_json::Value> = findings
            .iter()
            .map(|(sev, n)| (sev.as_str().to_string(), json!(n)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "targets": targets, "findings": findings }))?);
    } else {
        print_status(&targets, &findings);
    }
    Ok(())
}
