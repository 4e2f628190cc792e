use std::collections::HashSet;
use std::path::Path;
use crate::errors::HunterError;
use super::types::HunterConfig;
use super::security::validate_security_patterns;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

pub async fn parse_config(path: &Path) -> Result<HunterConfig, HunterError> {
    if !path.exists() {
        return Err(HunterError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await
        .map_err(|e| HunterError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    if metadata.len() > 1_048_576 {
        return Err(HunterError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await
        .map_err(|e| HunterError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    parse_config_str(&content)
}

pub fn parse_config_str(content: &str) -> Result<HunterConfig, HunterError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)
        .map_err(|e| HunterError::Config(format!("Invalid YAML: {}", e)))?;
    if yaml.is_null() {
        return Ok(HunterConfig::default());
    }

    validate_security_patterns(&yaml)?;

    validate_schema(&yaml)?;

    let config: HunterConfig = serde_yaml::from_value(yaml)
        .map_err(|e| HunterError::Config(format!("Invalid configuration: {}", e)))?;

    validate_conflicts(&config)?;

    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), HunterError> {
    let json_value: serde_json::Value = serde_json::to_value(yaml)
        .map_err(|e| HunterError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| HunterError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory: the typed parse and range checks are authoritative.
        for e in errors {
            warn!(validation_error = %format!("{} at {}", e, e.instance_path), "Config schema warning");
        }
    }

    Ok(())
}

/// Scope must name at least one domain and may not both allow and deny the
/// same entry.
fn validate_conflicts(config: &HunterConfig) -> Result<(), HunterError> {
    let Some(scope) = &config.scope else {
        return Ok(());
    };

    let allowed: Vec<String> = scope.allowed_domains.iter()
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect();
    if allowed.is_empty() {
        return Err(HunterError::Config("scope.allowed_domains must not be empty".into()));
    }

    let excluded: HashSet<String> = scope.excluded_domains.iter()
        .map(|d| d.trim().trim_start_matches('.').to_lowercase())
        .collect();
    for entry in &allowed {
        if excluded.contains(entry.trim_start_matches('.')) {
            return Err(HunterError::Config(format!(
                "Conflicting scope: '{}' appears in both allowed_domains and excluded_domains",
                entry
            )));
        }
    }

    Ok(())
}
