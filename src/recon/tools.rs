use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use async_trait::async_trait;
use tracing::{info, warn};
use crate::errors::HunterError;
use crate::scanner::exec::run_tool;
use super::ReconSource;

const LIVE_STATUS_CODES: &str = "200,403,401,302";

/// subfinder, then httpx as the liveness filter, then katana and gau for
/// endpoint harvesting. A stage whose tool is missing or fails yields nothing
/// and the chain carries on with what it has.
pub struct ToolRecon {
    work_dir: PathBuf,
    rate_limit: u32,
    threads: usize,
    timeout: Duration,
}

impl ToolRecon {
    pub fn new(work_dir: impl Into<PathBuf>, rate_limit: u32, threads: usize, timeout: Duration) -> Self {
        Self { work_dir: work_dir.into(), rate_limit, threads, timeout }
    }

    async fn step(&self, program: &str, args: Vec<String>, timeout: Duration) -> Vec<String> {
        match run_tool(program, &args, timeout).await {
            Ok(output) => {
                if !output.success {
                    warn!(tool = program, stderr = %output.stderr.trim(), "Recon tool exited with failure");
                }
                non_empty_lines(&output.stdout)
            }
            Err(e) => {
                warn!(tool = program, error = %e, "Recon step failed");
                Vec::new()
            }
        }
    }

    async fn write_list(&self, name: &str, lines: &[String]) -> Result<PathBuf, HunterError> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        let path = self.work_dir.join(name);
        tokio::fs::write(&path, lines.join("\n")).await?;
        Ok(path)
    }

    async fn enumerate_subdomains(&self, domain: &str) -> Vec<String> {
        info!(domain = %domain, "Running subfinder");
        self.step("subfinder", vec!["-d".into(), domain.into(), "-silent".into()], self.timeout).await
    }

    async fn probe_live(&self, subdomains: &[String]) -> Result<Vec<String>, HunterError> {
        if subdomains.is_empty() {
            return Ok(Vec::new());
        }
        let input = self.write_list("subdomains.txt", subdomains).await?;
        info!(count = subdomains.len(), "Probing subdomains with httpx");
        let args = vec![
            "-l".into(), input.to_string_lossy().into_owned(),
            "-silent".into(),
            "-mc".into(), LIVE_STATUS_CODES.into(),
            "-rl".into(), self.rate_limit.to_string(),
        ];
        Ok(self.step("httpx", args, self.timeout).await)
    }

    async fn harvest(&self, domain: &str, live_hosts: &[String]) -> Result<Vec<String>, HunterError> {
        if live_hosts.is_empty() {
            return Ok(Vec::new());
        }
        let input = self.write_list("live_hosts.txt", live_hosts).await?;
        info!(hosts = live_hosts.len(), "Harvesting URLs with katana and gau");

        let katana_args = vec![
            "-list".into(), input.to_string_lossy().into_owned(),
            "-silent".into(),
            "-rl".into(), self.rate_limit.to_string(),
        ];
        let gau_args = vec![domain.into(), "--threads".into(), self.threads.to_string()];

        let (crawled, archived) = tokio::join!(
            self.step("katana", katana_args, self.timeout * 2),
            self.step("gau", gau_args, self.timeout),
        );
        Ok(merge_unique([crawled, archived]))
    }
}

#[async_trait]
impl ReconSource for ToolRecon {
    fn name(&self) -> &str {
        "tools"
    }

    async fn discover(&self, domain: &str) -> Result<Vec<String>, HunterError> {
        let subdomains = self.enumerate_subdomains(domain).await;
        let live = self.probe_live(&subdomains).await?;
        let urls = self.harvest(domain, &live).await?;
        info!(
            domain = %domain,
            subdomains = subdomains.len(),
            live = live.len(),
            urls = urls.len(),
            "Tool recon finished"
        );
        Ok(urls)
    }
}

pub(crate) fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Concatenate lists, keeping first-seen order and dropping repeats.
pub(crate) fn merge_unique<I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for url in lists.into_iter().flatten() {
        if seen.insert(url.clone()) {
            merged.push(url);
        }
    }
    merged
}
