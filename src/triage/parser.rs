use serde_json::Value;
use crate::models::finding::Confidence;
use crate::models::verdict::TriageVerdict;

const REASONING_LIMIT: usize = 500;

/// Byte range of the balanced `{...}` starting at `start`, honoring string
/// literals and escapes.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// First balanced JSON object in `text` that actually parses.
pub fn extract_json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    for (start, _) in text.match_indices('{') {
        if let Some(end) = balanced_object_end(text, start) {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text[start..end]) {
                return Some(map);
            }
        }
    }
    None
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn as_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "valid" => Some(true),
            "false" | "no" | "invalid" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Turn a free-form model reply into a verdict. Never fails: a reply with no
/// usable JSON falls back to a keyword check, and an empty reply keeps the
/// finding for manual review.
pub fn parse_verdict(reply: &str) -> TriageVerdict {
    if reply.trim().is_empty() {
        return TriageVerdict::fallback("Empty response from triage service");
    }

    if let Some(obj) = extract_json_object(reply) {
        let text = |key: &str| obj.get(key).and_then(Value::as_str).unwrap_or("").to_string();
        return TriageVerdict {
            is_valid: as_bool(obj.get("is_valid")).unwrap_or(true),
            confidence: obj.get("confidence")
                .and_then(Value::as_str)
                .and_then(Confidence::parse)
                .unwrap_or(Confidence::Medium),
            reasoning: text("reasoning"),
            recommendation: text("recommendation"),
        };
    }

    TriageVerdict {
        is_valid: !reply.to_lowercase().contains("false positive"),
        confidence: Confidence::Medium,
        reasoning: truncate(reply, REASONING_LIMIT),
        recommendation: "Review AI output manually".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_fenced_json() {
        let reply = "Here is my analysis:\n```json\n{\"is_valid\": false, \"confidence\": \"HIGH\", \"reasoning\": \"WAF page\", \"recommendation\": \"Ignore\"}\n```";
        let verdict = parse_verdict(reply);
        assert!(!verdict.is_valid);
        assert_eq!(verdict.confidence, Confidence::High);
        assert_eq!(verdict.reasoning, "WAF page");
        assert_eq!(verdict.recommendation, "Ignore");
    }

    #[test]
    fn test_braces_inside_strings() {
        let reply = r#"{"is_valid": true, "confidence": "high", "reasoning": "payload {x} reflected \"}\" unescaped", "recommendation": "Fix"}"#;
        let verdict = parse_verdict(reply);
        assert!(verdict.is_valid);
        assert_eq!(verdict.confidence, Confidence::High);
        assert!(verdict.reasoning.contains("{x}"));
    }

    #[test]
    fn test_skips_unparseable_candidates() {
        let reply = "template {name} gave {\"is_valid\": false, \"confidence\": \"LOW\"}";
        let verdict = parse_verdict(reply);
        assert!(!verdict.is_valid);
        assert_eq!(verdict.confidence, Confidence::Low);
        assert_eq!(verdict.reasoning, "");
    }

    #[test]
    fn test_missing_fields_default() {
        let verdict = parse_verdict("{}");
        assert!(verdict.is_valid);
        assert_eq!(verdict.confidence, Confidence::Medium);
    }

    #[test]
    fn test_keyword_heuristic() {
        let verdict = parse_verdict("This looks like a False Positive caused by a generic error page.");
        assert!(!verdict.is_valid);
        assert_eq!(verdict.confidence, Confidence::Medium);
        assert_eq!(verdict.recommendation, "Review AI output manually");

        let long = "confirmed ".repeat(100);
        let verdict = parse_verdict(&long);
        assert!(verdict.is_valid);
        assert_eq!(verdict.reasoning.chars().count(), 500);
    }

    #[test]
    fn test_empty_reply_falls_back() {
        let verdict = parse_verdict("   ");
        assert!(verdict.is_valid);
        assert_eq!(verdict.confidence, Confidence::Low);
    }

    #[test]
    fn test_unbalanced_json_uses_heuristic() {
        let verdict = parse_verdict("{\"is_valid\": false, \"confidence\": ");
        assert!(verdict.is_valid);
        assert_eq!(verdict.recommendation, "Review AI output manually");
    }
}
