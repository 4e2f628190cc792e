use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

/// Run `fut` and log how long it took. The elapsed time is returned with the
/// output so callers can fold it into run totals.
pub async fn timed<F, T>(label: &str, fut: F) -> (T, Duration)
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let output = fut.await;
    let elapsed = start.elapsed();
    debug!(unit = %label, duration_ms = elapsed.as_millis() as u64, "Unit finished");
    (output, elapsed)
}
