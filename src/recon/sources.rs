use std::path::PathBuf;
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};
use crate::errors::HunterError;
use super::tools::{merge_unique, non_empty_lines};
use super::ReconSource;

/// Newline-separated URL list. Blank lines and `#` comments are ignored.
pub struct FileRecon {
    path: PathBuf,
}

impl FileRecon {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ReconSource for FileRecon {
    fn name(&self) -> &str {
        "file"
    }

    async fn discover(&self, _domain: &str) -> Result<Vec<String>, HunterError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let urls: Vec<String> = non_empty_lines(&content)
            .into_iter()
            .filter(|l| !l.starts_with('#'))
            .collect();
        info!(path = %self.path.display(), count = urls.len(), "Loaded URL list");
        Ok(urls)
    }
}

/// Fixed list of URLs.
pub struct StaticRecon {
    urls: Vec<String>,
}

impl StaticRecon {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { urls: urls.into_iter().map(Into::into).collect() }
    }

    /// Mock endpoints covering every target type, for dry runs.
    pub fn dry_run(domain: &str) -> Self {
        Self::new([
            format!("https://{}/login.php", domain),
            format!("https://{}/search.php?q=test", domain),
            format!("https://{}/api/v1/users", domain),
            format!("https://{}/wp-content/plugins/test", domain),
            format!("https://{}/static/app.js", domain),
        ])
    }
}

#[async_trait]
impl ReconSource for StaticRecon {
    fn name(&self) -> &str {
        "static"
    }

    async fn discover(&self, _domain: &str) -> Result<Vec<String>, HunterError> {
        Ok(self.urls.clone())
    }
}

/// Runs every source concurrently and merges the results. Fails only when
/// every source failed.
pub struct CombinedRecon {
    sources: Vec<Box<dyn ReconSource>>,
}

impl CombinedRecon {
    pub fn new(sources: Vec<Box<dyn ReconSource>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl ReconSource for CombinedRecon {
    fn name(&self) -> &str {
        "combined"
    }

    async fn discover(&self, domain: &str) -> Result<Vec<String>, HunterError> {
        let results = join_all(self.sources.iter().map(|s| s.discover(domain))).await;

        let mut lists = Vec::new();
        let mut last_error = None;
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(urls) => lists.push(urls),
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Recon source failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if lists.is_empty() => Err(e),
            _ => Ok(merge_unique(lists)),
        }
    }
}
