use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use crate::audit::AuditLogger;
use crate::config::Settings;
use crate::db::Store;

/// Shared handles for one run. Cloning is cheap; every stage gets its own copy.
#[derive(Clone)]
pub struct RunContext {
    pub store: Store,
    pub audit: AuditLogger,
    pub settings: Arc<Settings>,
    pub cancel: CancellationToken,
}

impl RunContext {
    pub fn new(store: Store, audit: AuditLogger, settings: Settings) -> Self {
        Self {
            store,
            audit,
            settings: Arc::new(settings),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
