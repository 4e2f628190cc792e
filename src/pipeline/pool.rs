use std::future::Future;
use std::sync::Arc;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// What a unit reports back to the pool.
#[derive(Debug)]
pub enum UnitOutcome<T> {
    Completed(T),
    Failed,
    /// Nothing to do for this unit (no adapter, already finished).
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub submitted: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Completed after cancellation; results dropped.
    pub discarded: usize,
    /// Never started because cancellation came first.
    pub not_submitted: usize,
}

impl PoolStats {
    pub fn finished(&self) -> usize {
        self.completed + self.failed + self.skipped + self.discarded
    }
}

/// Bounded pool of async units. At most `width` units run at once. The
/// cancellation token is checked before each submission and before each
/// completion is accepted; units already running are left to finish.
pub struct WorkerPool {
    name: &'static str,
    width: usize,
    cancel: CancellationToken,
}

impl WorkerPool {
    pub fn new(name: &'static str, width: usize, cancel: CancellationToken) -> Self {
        Self { name, width: width.max(1), cancel }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, unit: F) -> (Vec<T>, PoolStats)
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut,
        Fut: Future<Output = UnitOutcome<T>> + Send + 'static,
    {
        let total = items.len();
        info!(pool = self.name, units = total, width = self.width, "Pool started");

        let semaphore = Arc::new(Semaphore::new(self.width));
        let mut set: JoinSet<UnitOutcome<T>> = JoinSet::new();
        let mut results = Vec::new();
        let mut stats = PoolStats::default();
        let mut pending = items.into_iter();
        let mut next = pending.next();

        loop {
            if next.is_none() && set.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = self.cancel.cancelled(), if next.is_some() => {
                    stats.not_submitted = 1 + pending.len();
                    next = None;
                    info!(pool = self.name, not_submitted = stats.not_submitted, in_flight = set.len(), "Pool cancelled, draining in-flight units");
                }

                Some(joined) = set.join_next(), if !set.is_empty() => {
                    self.accept(joined, &mut results, &mut stats);
                }

                permit = semaphore.clone().acquire_owned(), if next.is_some() => {
                    let Ok(permit) = permit else { break };
                    if self.cancel.is_cancelled() {
                        continue;
                    }
                    if let Some(item) = next.take() {
                        let fut = unit(item);
                        set.spawn(async move {
                            let _permit = permit;
                            fut.await
                        });
                        stats.submitted += 1;
                        next = pending.next();
                    }
                }

                else => break,
            }
        }

        info!(
            pool = self.name,
            submitted = stats.submitted,
            completed = stats.completed,
            failed = stats.failed,
            skipped = stats.skipped,
            discarded = stats.discarded,
            "Pool finished"
        );
        (results, stats)
    }

    fn accept<T>(
        &self,
        joined: Result<UnitOutcome<T>, tokio::task::JoinError>,
        results: &mut Vec<T>,
        stats: &mut PoolStats,
    ) {
        match joined {
            Ok(UnitOutcome::Completed(value)) => {
                if self.cancel.is_cancelled() {
                    debug!(pool = self.name, "Discarding result after cancellation");
                    stats.discarded += 1;
                } else {
                    stats.completed += 1;
                    results.push(value);
                }
            }
            Ok(UnitOutcome::Failed) => stats.failed += 1,
            Ok(UnitOutcome::Skipped) => stats.skipped += 1,
            Err(e) => {
                error!(pool = self.name, error = %e, "Unit panicked");
                stats.failed += 1;
            }
        }
    }
}
