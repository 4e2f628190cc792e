use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio_util::task::TaskTracker;
use crate::models::finding::Severity;
use super::Notifier;
use tracing::{debug, warn};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_USERNAME: &str = "Hunter Bot";

/// Discord-compatible webhook. Each alert is posted on its own task.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    username: String,
    tasks: TaskTracker,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            tasks: TaskTracker::new(),
        }
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }
}

pub fn severity_color(severity: Severity) -> u32 {
    match severity {
        Severity::Critical => 15158332,
        Severity::High => 15105570,
        Severity::Medium => 3447003,
        Severity::Low | Severity::Info => 3066993,
    }
}

pub fn build_payload(username: &str, title: &str, description: &str, severity: Severity) -> Value {
    json!({
        "username": username,
        "embeds": [{
            "title": format!("[{}] {}", severity, title),
            "description": description,
            "color": severity_color(severity),
            "footer": { "text": "The Hunter's Loop Pipeline" }
        }]
    })
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn notify(&self, title: &str, description: &str, severity: Severity) {
        let payload = build_payload(&self.username, title, description, severity);
        let request = self.client.post(&self.url).json(&payload).timeout(WEBHOOK_TIMEOUT);

        self.tasks.spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!("Alert delivered");
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    warn!(status = %status, body = %body, "Webhook rejected alert");
                }
                Err(e) => {
                    warn!(error = %e, "Webhook delivery failed");
                }
            }
        });
    }

    async fn flush(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }
}
