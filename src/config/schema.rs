use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "scope": {
                "type": "object",
                "properties": {
                    "allowed_domains": { "type": "array", "items": { "type": "string" } },
                    "excluded_domains": { "type": "array", "items": { "type": "string" } }
                }
            },
            "pipeline": {
                "type": "object",
                "properties": {
                    "max_threads": { "type": "integer", "minimum": 1, "maximum": 50 },
                    "unit_timeout_secs": { "type": "integer", "minimum": 10 },
                    "rate_limit": { "type": "integer", "minimum": 1, "maximum": 1000 },
                    "triage_workers": { "type": "integer", "minimum": 1 },
                    "triage_timeout_secs": { "type": "integer", "minimum": 1 },
                    "min_triage_severity": { "type": "string", "enum": ["CRITICAL", "HIGH", "MEDIUM", "LOW", "INFO"] },
                    "resume_threshold": { "type": "integer", "minimum": 0 },
                    "resume_limit": { "type": "integer", "minimum": 1 },
                    "enable_bruteforce": { "type": "boolean" }
                }
            },
            "storage": {
                "type": "object",
                "properties": {
                    "db_path": { "type": "string" },
                    "data_dir": { "type": "string" },
                    "busy_timeout_secs": { "type": "integer", "minimum": 1 }
                }
            },
            "llm": {
                "type": "object",
                "properties": {
                    "provider": { "type": "string", "enum": ["gemini", "openai"] },
                    "model": { "type": "string" },
                    "api_key": { "type": "string" },
                    "base_url": { "type": "string" }
                }
            },
            "notifications": {
                "type": "object",
                "properties": {
                    "webhook_url": { "type": "string" },
                    "username": { "type": "string" }
                }
            },
            "output": {
                "type": "object",
                "properties": {
                    "directory": { "type": "string" }
                }
            }
        }
    })
});
