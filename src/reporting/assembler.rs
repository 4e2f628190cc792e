use std::path::{Path, PathBuf};
use chrono::Utc;
use crate::audit::utils::atomic_write;
use crate::errors::HunterError;
use crate::reporting::formatter::{format_report, ReportEntry};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub markdown: PathBuf,
    pub json: PathBuf,
}

/// Directory a domain's report lands in. Path separators in the domain are
/// replaced so the report cannot escape `output_dir`.
pub fn report_dir(output_dir: &Path, domain: &str) -> PathBuf {
    let safe: String = domain
        .chars()
        .map(|c| if c == '/' || c == '\\' || c == ':' { '_' } else { c })
        .collect();
    output_dir.join(safe.trim_matches('.'))
}

/// Write `report.md` and `findings.json` for a run. Both files are replaced
/// atomically.
pub async fn write_report(output_dir: &Path, domain: &str, entries: &[ReportEntry]) -> Result<ReportPaths, HunterError> {
    let dir = report_dir(output_dir, domain);
    let markdown = dir.join("report.md");
    let json = dir.join("findings.json");

    let report = format_report(domain, &Utc::now().to_rfc3339(), entries);
    atomic_write(&markdown, &report).await?;
    atomic_write(&json, &serde_json::to_string_pretty(entries)?).await?;

    info!(path = %markdown.display(), findings = entries.len(), "Report written");
    Ok(ReportPaths { markdown, json })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use crate::models::finding::{FindingRecord, Severity};
    use crate::reporting::formatter::attach_verdicts;

    #[tokio::test]
    async fn test_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let entries = attach_verdicts(
            &[FindingRecord::new("nuclei", "https://example.com/", Severity::High, "panel")],
            Vec::new(),
        );
        let paths = write_report(dir.path(), "example.com", &entries).await.unwrap();

        assert_eq!(paths.markdown, dir.path().join("example.com").join("report.md"));
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(json[0]["tool"], "nuclei");
        assert_eq!(json[0]["severity"], "HIGH");
        assert!(json[0]["verdict"].is_null());
    }

    #[test]
    fn test_report_dir_is_contained() {
        let dir = report_dir(Path::new("/out"), "../../etc");
        assert!(dir.starts_with("/out"));
    }
}
