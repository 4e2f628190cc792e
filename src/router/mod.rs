pub mod classifier;
pub mod signature;

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use crate::db::Store;
use crate::models::target::{RoutedTarget, TargetType, TaskStatus};
use tracing::{debug, info, warn};

pub use classifier::classify;

/// Stage label for targets dropped as static assets.
pub const SKIPPED_STATIC_STAGE: &str = "skipped_static";
/// Stage label for targets dropped as a variant of an already routed endpoint.
pub const DUPLICATE_STAGE: &str = "duplicate";

/// Per-type scan queues. Each queue keeps insertion order.
pub type RouteQueues = BTreeMap<TargetType, Vec<RoutedTarget>>;

/// Deduplicates, classifies and queues raw URLs. The set of seen signatures
/// lives for the lifetime of the router, so repeated calls keep deduplicating
/// against everything routed so far.
#[derive(Debug, Default)]
pub struct Router {
    store: Option<Store>,
    /// Signature -> the url that claimed it.
    seen: HashMap<String, String>,
    queues: RouteQueues,
    skipped_static: usize,
    duplicates: usize,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror each routing decision into the store: routed urls stay
    /// `pending` with the target type as the stage label, dropped urls are
    /// completed so they are never picked up as pending work again.
    pub fn with_store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    pub fn route_targets<I, S>(&mut self, urls: I) -> &RouteQueues
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut received = 0usize;
        for raw in urls {
            received += 1;
            let url = raw.as_ref().trim();
            if url.is_empty() {
                continue;
            }
            if signature::is_static_asset(url) {
                self.skipped_static += 1;
                self.retire(url, SKIPPED_STATIC_STAGE);
                continue;
            }
            let repeat_of_other = match self.seen.entry(signature::signature_or_raw(url)) {
                // The same url seen twice is still the routed target.
                Entry::Occupied(first) => Some(first.get() != url),
                Entry::Vacant(slot) => {
                    slot.insert(url.to_string());
                    None
                }
            };
            if let Some(other) = repeat_of_other {
                self.duplicates += 1;
                if other {
                    self.retire(url, DUPLICATE_STAGE);
                }
                continue;
            }

            let routed = classify(url);
            debug!(url = %url, target_type = %routed.target_type, "Routed");
            self.mirror(&routed);
            self.queues.entry(routed.target_type).or_default().push(routed);
        }

        info!(
            received = received,
            static_skipped = self.skipped_static,
            duplicates = self.duplicates,
            "Routing complete"
        );
        for (target_type, queue) in &self.queues {
            if !queue.is_empty() {
                info!(target_type = %target_type, count = queue.len(), "Queue");
            }
        }
        &self.queues
    }

    fn mirror(&self, routed: &RoutedTarget) {
        if let Some(store) = &self.store {
            if let Err(e) = store.update_task_status(
                &routed.url,
                TaskStatus::Pending,
                Some(routed.target_type.as_str()),
            ) {
                warn!(url = %routed.url, error = %e, "Failed to record routing decision");
            }
        }
    }

    fn retire(&self, url: &str, stage: &str) {
        if let Some(store) = &self.store {
            if let Err(e) = store.update_task_status(url, TaskStatus::Completed, Some(stage)) {
                warn!(url = %url, error = %e, "Failed to retire dropped target");
            }
        }
    }

    pub fn queue(&self, target_type: TargetType) -> &[RoutedTarget] {
        self.queues.get(&target_type).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn queues(&self) -> &RouteQueues {
        &self.queues
    }

    /// All queued targets, queue by queue in type order.
    pub fn into_flat(self) -> Vec<RoutedTarget> {
        self.queues.into_values().flatten().collect()
    }

    pub fn total(&self) -> usize {
        self.queues.values().map(Vec::len).sum()
    }
}
