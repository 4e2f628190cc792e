pub mod webhook;

use async_trait::async_trait;
use crate::models::finding::Severity;
use tracing::info;

pub use webhook::WebhookNotifier;

/// Alert sink. `notify` never blocks the caller and never fails it.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, description: &str, severity: Severity);

    /// Wait for alerts still in flight. Called once at the end of a run.
    async fn flush(&self) {}
}

/// Used when no webhook is configured.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    fn notify(&self, title: &str, _description: &str, severity: Severity) {
        info!(title = %title, severity = %severity, "No webhook configured, alert not sent");
    }
}
