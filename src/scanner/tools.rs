use std::path::PathBuf;
use std::time::Duration;
use async_trait::async_trait;
use serde_json::Value;
use crate::errors::HunterError;
use crate::models::finding::{FindingRecord, Severity};
use crate::models::target::RoutedTarget;
use super::exec::run_tool;
use super::ScanAdapter;
use tracing::{info, warn};

const SQLMAP_RAW_LIMIT: usize = 2000;

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// JSON objects from tool output that is either one JSON array or one JSON
/// object per line. Lines that are not JSON (banners, progress) are skipped.
fn json_records(stdout: &str) -> Vec<Value> {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(stdout.trim()) {
        return items.into_iter().filter(Value::is_object).collect();
    }
    stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line.trim().trim_end_matches(',')).ok())
        .filter(Value::is_object)
        .collect()
}

/// Template scanner. Also used for secret scanning of script files.
pub struct NucleiAdapter {
    tags: Vec<String>,
    rate_limit: u32,
    timeout: Duration,
}

impl NucleiAdapter {
    pub fn new(tags: &[&str], rate_limit: u32, timeout: Duration) -> Self {
        Self {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            rate_limit,
            timeout,
        }
    }

    /// Exposed keys, tokens and other secrets.
    pub fn secrets(rate_limit: u32, timeout: Duration) -> Self {
        Self::new(&["exposure", "token", "secret"], rate_limit, timeout)
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    fn args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "-u".to_string(), url.to_string(),
            "-silent".to_string(),
            "-jsonl".to_string(),
            "-rate-limit".to_string(), self.rate_limit.to_string(),
            "-severity".to_string(), "medium,high,critical".to_string(),
        ];
        if !self.tags.is_empty() {
            args.push("-tags".to_string());
            args.push(self.tags.join(","));
        }
        args
    }
}

pub fn parse_nuclei_output(url: &str, stdout: &str) -> Vec<FindingRecord> {
    json_records(stdout)
        .into_iter()
        .map(|record| {
            let info = &record["info"];
            let severity = info["severity"].as_str()
                .and_then(Severity::parse)
                .unwrap_or(Severity::Medium);
            let name = info["name"].as_str().unwrap_or("Unknown");
            let mut finding = FindingRecord::new("nuclei", url, severity, name);
            if let Some(matched) = record["matched-at"].as_str() {
                finding = finding.with_raw_output(matched);
            }
            finding
        })
        .collect()
}

#[async_trait]
impl ScanAdapter for NucleiAdapter {
    fn name(&self) -> &'static str {
        "nuclei"
    }

    async fn run(&self, target: &RoutedTarget) -> Result<Vec<FindingRecord>, HunterError> {
        info!(url = %target.url, tags = %self.tags.join(","), "Running nuclei");
        let output = run_tool("nuclei", &self.args(&target.url), self.timeout).await?;
        Ok(parse_nuclei_output(&target.url, &output.stdout))
    }
}

/// Reflected and stored XSS.
pub struct DalfoxAdapter {
    timeout: Duration,
}

impl DalfoxAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

pub fn parse_dalfox_output(url: &str, stdout: &str) -> Vec<FindingRecord> {
    json_records(stdout)
        .into_iter()
        .map(|record| {
            let has_poc = record["poc"].as_str().map_or(false, |p| !p.is_empty());
            let severity = if has_poc { Severity::High } else { Severity::Medium };
            let description = format!(
                "XSS: {} - {}",
                record["param"].as_str().unwrap_or("N/A"),
                record["type"].as_str().unwrap_or("reflected"),
            );
            FindingRecord::new("dalfox", url, severity, &description)
                .with_raw_output(record.to_string())
        })
        .collect()
}

#[async_trait]
impl ScanAdapter for DalfoxAdapter {
    fn name(&self) -> &'static str {
        "dalfox"
    }

    async fn run(&self, target: &RoutedTarget) -> Result<Vec<FindingRecord>, HunterError> {
        info!(url = %target.url, "Running dalfox");
        let args = vec![
            "url".to_string(), target.url.clone(),
            "--silence".to_string(),
            "--format".to_string(), "json".to_string(),
        ];
        let output = run_tool("dalfox", &args, self.timeout).await?;
        Ok(parse_dalfox_output(&target.url, &output.stdout))
    }
}

/// SQL injection, limited to boolean, error and union techniques.
pub struct SqlmapAdapter {
    output_dir: PathBuf,
    timeout: Duration,
}

impl SqlmapAdapter {
    pub fn new(output_dir: PathBuf, timeout: Duration) -> Self {
        Self { output_dir, timeout }
    }

    fn args(&self, url: &str) -> Vec<String> {
        vec![
            "-u".to_string(), url.to_string(),
            "--batch".to_string(),
            "--technique=BEU".to_string(),
            "--level=2".to_string(),
            "--risk=2".to_string(),
            "--threads=5".to_string(),
            "--output-dir".to_string(), self.output_dir.display().to_string(),
            "--forms".to_string(),
            "-o".to_string(),
        ]
    }
}

pub fn parse_sqlmap_output(url: &str, output: &str) -> Vec<FindingRecord> {
    if output.to_lowercase().contains("is vulnerable") {
        vec![FindingRecord::new("sqlmap", url, Severity::Critical, "SQL Injection Detected")
            .with_raw_output(truncate(output, SQLMAP_RAW_LIMIT))]
    } else {
        Vec::new()
    }
}

#[async_trait]
impl ScanAdapter for SqlmapAdapter {
    fn name(&self) -> &'static str {
        "sqlmap"
    }

    async fn run(&self, target: &RoutedTarget) -> Result<Vec<FindingRecord>, HunterError> {
        info!(url = %target.url, "Running sqlmap");
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let output = run_tool("sqlmap", &self.args(&target.url), self.timeout).await?;
        Ok(parse_sqlmap_output(&target.url, &output.combined()))
    }
}

/// Credential brute force is not automated. Registered only when brute force
/// is explicitly enabled, and then only flags the panel for manual work.
pub struct HydraAdapter;

#[async_trait]
impl ScanAdapter for HydraAdapter {
    fn name(&self) -> &'static str {
        "hydra"
    }

    async fn run(&self, target: &RoutedTarget) -> Result<Vec<FindingRecord>, HunterError> {
        warn!(url = %target.url, "Brute force enabled for login panel");
        Ok(vec![FindingRecord::new(
            "hydra",
            &target.url,
            Severity::Info,
            "Hydra placeholder - Requires manual configuration",
        )])
    }
}

/// Runs several adapters in order against the same target. Partial results
/// are kept when at least one adapter succeeds.
pub struct SequenceAdapter {
    name: &'static str,
    adapters: Vec<Box<dyn ScanAdapter>>,
}

impl SequenceAdapter {
    pub fn new(name: &'static str, adapters: Vec<Box<dyn ScanAdapter>>) -> Self {
        Self { name, adapters }
    }
}

#[async_trait]
impl ScanAdapter for SequenceAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, target: &RoutedTarget) -> Result<Vec<FindingRecord>, HunterError> {
        let mut findings = Vec::new();
        let mut first_error = None;
        let mut succeeded = 0usize;

        for adapter in &self.adapters {
            match adapter.run(target).await {
                Ok(mut found) => {
                    succeeded += 1;
                    findings.append(&mut found);
                }
                Err(e) => {
                    warn!(url = %target.url, adapter = adapter.name(), error = %e, "Adapter failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if succeeded == 0 => Err(e),
            _ => Ok(findings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::target::TargetType;

    #[test]
    fn test_parse_nuclei_jsonl() {
        let stdout = concat!(
            "[INF] banner line\n",
            r#"{"template-id":"x","info":{"name":"Exposed .git","severity":"high"},"matched-at":"https://a.example.com/.git/config"}"#, "\n",
            r#"{"info":{"name":"Odd","severity":"bogus"}}"#, "\n",
        );
        let findings = parse_nuclei_output("https://a.example.com/", stdout);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].description, "Exposed .git");
        assert_eq!(findings[0].raw_output.as_deref(), Some("https://a.example.com/.git/config"));
        assert_eq!(findings[1].severity, Severity::Medium);
        assert!(findings[1].raw_output.is_none());
    }

    #[test]
    fn test_parse_dalfox_array_and_lines() {
        let array = r#"[{"param":"q","type":"R","poc":"https://a.example.com/?q=<svg>"},{"param":"id"}]"#;
        let findings = parse_dalfox_output("https://a.example.com/?q=1", array);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].description, "XSS: q - R");
        assert_eq!(findings[1].severity, Severity::Medium);
        assert_eq!(findings[1].description, "XSS: id - reflected");

        let lines = "{\"param\":\"q\",\"type\":\"V\",\"poc\":\"\"},\n";
        let findings = parse_dalfox_output("https://a.example.com/?q=1", lines);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn test_parse_sqlmap_keyword() {
        let out = format!("{}\nGET parameter 'id' is vulnerable. Do you want to keep testing?", "x".repeat(3000));
        let findings = parse_sqlmap_output("https://a.example.com/?id=1", &out);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].raw_output.as_ref().unwrap().chars().count(), 2000);

        assert!(parse_sqlmap_output("u", "all tested parameters do not appear to be injectable").is_empty());
    }

    #[test]
    fn test_nuclei_args_include_tags_and_rate_limit() {
        let adapter = NucleiAdapter::new(&["cms", "wordpress"], 42, Duration::from_secs(10));
        let args = adapter.args("https://a.example.com/");
        assert!(args.windows(2).any(|w| w[0] == "-rate-limit" && w[1] == "42"));
        assert!(args.windows(2).any(|w| w[0] == "-tags" && w[1] == "cms,wordpress"));
        assert_eq!(NucleiAdapter::secrets(1, Duration::from_secs(10)).tags(), ["exposure", "token", "secret"]);
    }

    #[tokio::test]
    async fn test_hydra_placeholder() {
        let target = RoutedTarget::new("https://a.example.com/login", TargetType::Login);
        let findings = HydraAdapter.run(&target).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
    }

    struct Fixed(Result<usize, ()>);

    #[async_trait]
    impl ScanAdapter for Fixed {
        fn name(&self) -> &'static str { "fixed" }
        async fn run(&self, target: &RoutedTarget) -> Result<Vec<FindingRecord>, HunterError> {
            match self.0 {
                Ok(n) => Ok((0..n).map(|_| FindingRecord::new("fixed", &target.url, Severity::Low, "x")).collect()),
                Err(()) => Err(HunterError::ToolExecution("boom".into())),
            }
        }
    }

    #[tokio::test]
    async fn test_sequence_keeps_partial_results() {
        let target = RoutedTarget::new("https://a.example.com/?q=1", TargetType::Dynamic);
        let seq = SequenceAdapter::new("dynamic", vec![Box::new(Fixed(Err(()))), Box::new(Fixed(Ok(2)))]);
        assert_eq!(seq.run(&target).await.unwrap().len(), 2);

        let all_fail = SequenceAdapter::new("dynamic", vec![Box::new(Fixed(Err(()))), Box::new(Fixed(Err(())))]);
        assert!(all_fail.run(&target).await.is_err());
    }
}
