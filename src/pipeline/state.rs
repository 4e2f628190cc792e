use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use super::pool::PoolStats;

/// Stages of one run, in order. `ShuttingDown` is entered from `Scan` or
/// `Triage` when the run is interrupted and always leads to `Done`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Init,
    ResumeCheck,
    Ingest,
    Route,
    Scan,
    Triage,
    Report,
    ShuttingDown,
    Done,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::ResumeCheck => "RESUME_CHECK",
            Self::Ingest => "INGEST",
            Self::Route => "ROUTE",
            Self::Scan => "SCAN",
            Self::Triage => "TRIAGE",
            Self::Report => "REPORT",
            Self::ShuttingDown => "SHUTTING_DOWN",
            Self::Done => "DONE",
        }
    }

    /// SHUTTING_DOWN is entered only from SCAN or TRIAGE. An interrupt that
    /// arrives earlier is carried through ROUTE and SCAN with no work left.
    pub fn can_transition_to(&self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        matches!(
            (self, next),
            (Init, ResumeCheck)
                | (ResumeCheck, Ingest)
                | (ResumeCheck, Scan)
                | (Ingest, Route)
                | (Route, Scan)
                | (Scan, Triage)
                | (Scan, ShuttingDown)
                | (Triage, Report)
                | (Triage, ShuttingDown)
                | (Report, Done)
                | (ShuttingDown, Done)
        )
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    /// Reached DONE, but some scan units failed or the report could not be
    /// written.
    PartialFailure,
    Interrupted,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialFailure => "partial_failure",
            Self::Interrupted => "interrupted",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub domain: String,
    pub outcome: RunOutcome,
    pub resumed: bool,
    pub ingested: usize,
    pub routed: usize,
    pub scan: PoolStats,
    pub triage: PoolStats,
    pub findings: usize,
    pub report: Option<PathBuf>,
    pub duration_ms: u64,
    pub stages: Vec<PipelineStage>,
}
