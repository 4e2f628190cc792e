use hunter::models::finding::{Confidence, FindingRecord, Severity};
use hunter::models::verdict::{TriageVerdict, TriagedFinding};
use hunter::reporting::{attach_verdicts, write_report};
use tempfile::TempDir;

fn finding(tool: &str, severity: Severity, description: &str) -> FindingRecord {
    FindingRecord::new(tool, "https://app.example.com/item?id=1", severity, description)
}

#[tokio::test]
async fn report_groups_findings_by_descending_severity() {
    let dir = TempDir::new().unwrap();
    let findings = vec![
        finding("nuclei", Severity::Info, "nginx detected"),
        finding("nuclei", Severity::Low, "missing header"),
        finding("dalfox", Severity::High, "XSS: q - reflected"),
        finding("sqlmap", Severity::Critical, "SQL Injection detected"),
        finding("nuclei", Severity::Medium, "exposed panel"),
    ];
    let triaged = vec![TriagedFinding {
        finding: findings[3].clone(),
        verdict: TriageVerdict {
            is_valid: true,
            confidence: Confidence::High,
            reasoning: "error-based payload confirmed".to_string(),
            recommendation: "use bound parameters".to_string(),
        },
    }];
    let entries = attach_verdicts(&findings, triaged);

    let paths = write_report(dir.path(), "example.com", &entries).await.unwrap();
    let report = std::fs::read_to_string(&paths.markdown).unwrap();

    let positions: Vec<usize> = ["## CRITICAL", "## HIGH", "## MEDIUM", "## LOW", "## INFO"]
        .iter()
        .map(|h| report.find(h).unwrap_or_else(|| panic!("missing {}", h)))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(report.contains("error-based payload confirmed"));

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn empty_buckets_are_omitted() {
    let dir = TempDir::new().unwrap();
    let entries = attach_verdicts(&[finding("nuclei", Severity::Low, "missing header")], Vec::new());
    let paths = write_report(dir.path(), "example.com", &entries).await.unwrap();
    let report = std::fs::read_to_string(&paths.markdown).unwrap();

    assert!(report.contains("## LOW (1)"));
    for absent in ["## CRITICAL", "## HIGH", "## MEDIUM", "## INFO"] {
        assert!(!report.contains(absent));
    }
}
