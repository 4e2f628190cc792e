use super::state::PipelineStage;

pub struct StageDefinition {
    pub stage: PipelineStage,
    pub display_name: &'static str,
    pub description: &'static str,
}

pub static STAGES: &[StageDefinition] = &[
    StageDefinition {
        stage: PipelineStage::ResumeCheck,
        display_name: "Resume Check",
        description: "Pick up pending targets left by an earlier run",
    },
    StageDefinition {
        stage: PipelineStage::Ingest,
        display_name: "Ingestion",
        description: "Discover, validate and scope-filter candidate URLs",
    },
    StageDefinition {
        stage: PipelineStage::Route,
        display_name: "Routing",
        description: "Deduplicate and classify URLs into per-type scan queues",
    },
    StageDefinition {
        stage: PipelineStage::Scan,
        display_name: "Scanning",
        description: "Run the scan adapter for each target on a bounded pool",
    },
    StageDefinition {
        stage: PipelineStage::Triage,
        display_name: "Triage",
        description: "Review findings above the severity gate",
    },
    StageDefinition {
        stage: PipelineStage::Report,
        display_name: "Reporting",
        description: "Write the severity-grouped report",
    },
];

pub fn display_name(stage: PipelineStage) -> &'static str {
    STAGES
        .iter()
        .find(|s| s.stage == stage)
        .map(|s| s.display_name)
        .unwrap_or_else(|| stage.as_str())
}
