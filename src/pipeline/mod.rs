pub mod context;
pub mod metrics;
pub mod orchestrator;
pub mod phase;
pub mod pool;
pub mod state;

pub use context::RunContext;
pub use orchestrator::PipelineOrchestrator;
pub use pool::{PoolStats, UnitOutcome, WorkerPool};
pub use state::{PipelineStage, RunOutcome, RunSummary};
