use std::sync::LazyLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Rejections at this level are written to the audit log.
    pub fn is_audited(&self) -> bool {
        *self >= ThreatLevel::High
    }
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub sanitized: Option<String>,
    pub threat_level: ThreatLevel,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn accept(value: String) -> Self {
        Self { is_valid: true, sanitized: Some(value), threat_level: ThreatLevel::Safe, warnings: Vec::new() }
    }

    fn reject(threat_level: ThreatLevel, warning: impl Into<String>) -> Self {
        Self { is_valid: false, sanitized: None, threat_level, warnings: vec![warning.into()] }
    }
}

/// Characters never legitimate in a URL handed to a subprocess. `&` is
/// absent so that ordinary query strings pass; chained commands are still
/// caught by `&&` in the injection patterns.
const URL_DANGEROUS_CHARS: &[char] = &[';', '|', '$', '`', '<', '>', '\\', '\n', '\r', '\0'];

/// Domains get the strict set.
const DOMAIN_DANGEROUS_CHARS: &[char] = &[
    ';', '|', '&', '$', '`', '(', ')', '{', '}', '[', ']',
    '<', '>', '!', '\\', '\n', '\r', '\0',
];

static INJECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i);\s*(rm|cat|ls|wget|curl|nc|bash|sh|python|perl|php)",
        r"\$\([^)]+\)",
        r"`[^`]+`",
        r"\|\s*\w+",
        r">\s*/",
        r"&&\s*\w+",
        r"\|\|\s*\w+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static DOMAIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?(\.[a-z0-9]([a-z0-9-]*[a-z0-9])?)*$").unwrap()
});

fn check_injection(value: &str, dangerous: &[char]) -> ThreatLevel {
    if let Some(c) = value.chars().find(|c| dangerous.contains(c)) {
        warn!(character = ?c, "Dangerous character detected");
        return ThreatLevel::High;
    }
    for pattern in INJECTION_PATTERNS.iter() {
        if pattern.is_match(value) {
            warn!(pattern = %pattern.as_str(), "Injection pattern detected");
            return ThreatLevel::Critical;
        }
    }
    ThreatLevel::Safe
}

/// Accept only http(s) URLs free of shell metacharacters. The sanitized value
/// is the percent-encoded serialization of the parsed URL.
pub fn validate_url(raw: &str) -> ValidationResult {
    let raw = raw.trim();
    if raw.is_empty() {
        return ValidationResult::reject(ThreatLevel::Safe, "Empty URL");
    }

    let threat = check_injection(raw, URL_DANGEROUS_CHARS);
    if threat != ThreatLevel::Safe {
        return ValidationResult::reject(threat, "Potential command injection detected in URL");
    }

    let parsed = match Url::parse(raw) {
        Ok(u) => u,
        Err(e) => return ValidationResult::reject(ThreatLevel::Low, format!("URL parsing error: {}", e)),
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return ValidationResult::reject(
            ThreatLevel::Medium,
            format!("Invalid URL scheme: {}. Only HTTP(S) allowed.", parsed.scheme()),
        );
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return ValidationResult::reject(ThreatLevel::Low, "URL has no host");
    }

    ValidationResult::accept(parsed.to_string())
}

/// Strict hostname grammar, lowercased.
pub fn validate_domain(raw: &str) -> ValidationResult {
    let domain = raw.trim().to_lowercase();
    if domain.is_empty() {
        return ValidationResult::reject(ThreatLevel::Safe, "Empty domain");
    }

    let threat = check_injection(&domain, DOMAIN_DANGEROUS_CHARS);
    if threat != ThreatLevel::Safe {
        return ValidationResult::reject(threat, "Dangerous characters in domain");
    }
    if !DOMAIN_PATTERN.is_match(&domain) {
        return ValidationResult::reject(ThreatLevel::Low, "Invalid domain format");
    }
    ValidationResult::accept(domain)
}
