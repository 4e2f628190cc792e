use crate::errors::HunterError;

const DANGEROUS_PATTERNS: &[&str] = &[
    "../",
    "..\\",
    "<script",
    "javascript:",
    "data:",
    "file:",
    "vbscript:",
];

/// Reject a configuration tree if any string value carries a path traversal
/// or script-injection marker.
pub fn validate_security_patterns(value: &serde_yaml::Value) -> Result<(), HunterError> {
    check_value(value, &mut Vec::new())
}

fn check_value(value: &serde_yaml::Value, path: &mut Vec<String>) -> Result<(), HunterError> {
    match value {
        serde_yaml::Value::String(s) => {
            let lower = s.to_lowercase();
            if let Some(pattern) = DANGEROUS_PATTERNS.iter().find(|p| lower.contains(*p)) {
                let path_str = if path.is_empty() { "root".to_string() } else { path.join(".") };
                return Err(HunterError::Config(
                    format!("Dangerous pattern '{}' found at config path: {}", pattern, path_str)
                ));
            }
            Ok(())
        }
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                path.push(k.as_str().unwrap_or("unknown").to_string());
                check_value(v, path)?;
                path.pop();
            }
            Ok(())
        }
        serde_yaml::Value::Sequence(seq) => {
            for (i, v) in seq.iter().enumerate() {
                path.push(format!("[{}]", i));
                check_value(v, path)?;
                path.pop();
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
