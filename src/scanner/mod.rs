pub mod exec;
pub mod tools;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use async_trait::async_trait;
use crate::config::Settings;
use crate::errors::HunterError;
use crate::models::finding::FindingRecord;
use crate::models::target::{RoutedTarget, TargetType};

pub use tools::{DalfoxAdapter, HydraAdapter, NucleiAdapter, SequenceAdapter, SqlmapAdapter};

/// A scanning unit: run a tool (or tools) against one routed target and
/// report what it found. Implementations do not touch the store.
#[async_trait]
pub trait ScanAdapter: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, target: &RoutedTarget) -> Result<Vec<FindingRecord>, HunterError>;
}

/// Dispatch table from target type to adapter. A type with no entry is
/// skipped by the scheduler.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<TargetType, Arc<dyn ScanAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adapter(mut self, target_type: TargetType, adapter: Arc<dyn ScanAdapter>) -> Self {
        self.adapters.insert(target_type, adapter);
        self
    }

    pub fn register(&mut self, target_type: TargetType, adapter: Arc<dyn ScanAdapter>) {
        self.adapters.insert(target_type, adapter);
    }

    pub fn get(&self, target_type: TargetType) -> Option<Arc<dyn ScanAdapter>> {
        self.adapters.get(&target_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// The standard tool mapping. Login panels get an adapter only when
    /// brute force is enabled.
    pub fn tools(settings: &Settings, work_dir: &Path) -> Self {
        let timeout = settings.unit_timeout;
        let rate = settings.rate_limit;

        let mut registry = Self::new()
            .with_adapter(TargetType::Cms, Arc::new(NucleiAdapter::new(&["cms", "wordpress", "joomla"], rate, timeout)))
            .with_adapter(TargetType::Api, Arc::new(NucleiAdapter::new(&["api", "exposure"], rate, timeout)))
            .with_adapter(TargetType::JsFile, Arc::new(NucleiAdapter::secrets(rate, timeout)))
            .with_adapter(TargetType::Static, Arc::new(NucleiAdapter::new(&["info", "tech"], rate, timeout)))
            .with_adapter(TargetType::Dynamic, Arc::new(SequenceAdapter::new("dalfox+sqlmap", vec![
                Box::new(DalfoxAdapter::new(timeout)),
                Box::new(SqlmapAdapter::new(work_dir.join("sqlmap"), timeout)),
            ])));
        if settings.enable_bruteforce {
            registry.register(TargetType::Login, Arc::new(HydraAdapter));
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HunterConfig, Overrides, PipelineConfig};

    fn settings(bruteforce: bool) -> Settings {
        let config = HunterConfig {
            pipeline: Some(PipelineConfig { enable_bruteforce: Some(bruteforce), ..Default::default() }),
            ..Default::default()
        };
        Settings::resolve(&config, &Overrides::default()).unwrap()
    }

    #[test]
    fn test_tool_registry_mapping() {
        let registry = AdapterRegistry::tools(&settings(false), Path::new("/tmp/hunter"));
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.get(TargetType::Cms).unwrap().name(), "nuclei");
        assert_eq!(registry.get(TargetType::Dynamic).unwrap().name(), "dalfox+sqlmap");
        assert!(registry.get(TargetType::Login).is_none());
    }

    #[test]
    fn test_bruteforce_registers_login_adapter() {
        let registry = AdapterRegistry::tools(&settings(true), Path::new("/tmp/hunter"));
        assert_eq!(registry.get(TargetType::Login).unwrap().name(), "hydra");
    }
}
