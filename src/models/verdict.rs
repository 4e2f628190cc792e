use serde::{Deserialize, Serialize};
use super::finding::{Confidence, FindingRecord};

/// Verdict returned by the triage service for a single finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageVerdict {
    pub is_valid: bool,
    pub confidence: Confidence,
    pub reasoning: String,
    pub recommendation: String,
}

impl TriageVerdict {
    /// Used when no triage service is configured. Keeps the finding.
    pub fn not_configured() -> Self {
        Self {
            is_valid: true,
            confidence: Confidence::Medium,
            reasoning: "AI not configured - Manual review required".to_string(),
            recommendation: "Verify manually".to_string(),
        }
    }

    /// Used when the service call fails or the reply is unusable. Keeps the
    /// finding, flagged for manual review.
    pub fn fallback(reason: &str) -> Self {
        Self {
            is_valid: true,
            confidence: Confidence::Low,
            reasoning: reason.to_string(),
            recommendation: "Manual review required".to_string(),
        }
    }

    /// Only valid, high-confidence verdicts raise an alert.
    pub fn is_alertable(&self) -> bool {
        self.is_valid && self.confidence == Confidence::High
    }
}

/// A finding paired with the verdict it received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriagedFinding {
    pub finding: FindingRecord,
    pub verdict: TriageVerdict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_keeps_finding() {
        let v = TriageVerdict::fallback("AI error: timeout");
        assert!(v.is_valid);
        assert_eq!(v.confidence, Confidence::Low);
        assert!(!v.is_alertable());
    }

    #[test]
    fn test_alertable_requires_high_confidence() {
        let mut v = TriageVerdict::not_configured();
        assert!(!v.is_alertable());
        v.confidence = Confidence::High;
        assert!(v.is_alertable());
        v.is_valid = false;
        assert!(!v.is_alertable());
    }
}
