use std::sync::Arc;
use async_trait::async_trait;
use tracing::debug;
use crate::errors::HunterError;
use crate::llm::provider::LLMProvider;
use crate::models::finding::FindingRecord;
use crate::models::verdict::TriageVerdict;
use super::parser::parse_verdict;

const RAW_OUTPUT_LIMIT: usize = 1000;

const SYSTEM_PROMPT: &str = "You are a senior penetration tester reviewing automated scanner output. \
Be skeptical: generic error pages, WAF blocks and reflected-but-encoded payloads are false positives.";

/// Reviews one finding and returns a verdict.
#[async_trait]
pub trait TriageService: Send + Sync {
    fn name(&self) -> &str;
    async fn triage(&self, finding: &FindingRecord) -> Result<TriageVerdict, HunterError>;
}

/// Triage backed by a language model.
pub struct LlmTriageService {
    provider: Arc<dyn LLMProvider>,
}

impl LlmTriageService {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

pub fn build_prompt(finding: &FindingRecord) -> String {
    let raw: String = finding.raw_output.as_deref()
        .unwrap_or("N/A")
        .chars()
        .take(RAW_OUTPUT_LIMIT)
        .collect();

    format!(
        "Analyze this security finding and decide whether it is a real vulnerability.\n\n\
         Tool: {tool}\n\
         Target: {target}\n\
         Severity: {severity}\n\
         Description: {description}\n\
         Raw output:\n{raw}\n\n\
         Reply with a single JSON object:\n\
         {{\"is_valid\": true|false, \"confidence\": \"HIGH\"|\"MEDIUM\"|\"LOW\", \
         \"reasoning\": \"...\", \"recommendation\": \"...\"}}",
        tool = finding.tool,
        target = finding.target,
        severity = finding.severity,
        description = finding.description,
    )
}

#[async_trait]
impl TriageService for LlmTriageService {
    fn name(&self) -> &str {
        self.provider.provider_name()
    }

    async fn triage(&self, finding: &FindingRecord) -> Result<TriageVerdict, HunterError> {
        let prompt = build_prompt(finding);
        let response = self.provider.complete(&prompt, Some(SYSTEM_PROMPT)).await?;
        debug!(
            model = %response.model,
            input_tokens = ?response.input_tokens,
            output_tokens = ?response.output_tokens,
            "Triage reply received"
        );
        Ok(parse_verdict(&response.content))
    }
}

/// Used when no model is configured. Every finding is kept for manual review.
pub struct DisabledTriage;

#[async_trait]
impl TriageService for DisabledTriage {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn triage(&self, _finding: &FindingRecord) -> Result<TriageVerdict, HunterError> {
        Ok(TriageVerdict::not_configured())
    }
}
