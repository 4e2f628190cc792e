use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::models::finding::{FindingRecord, Severity};
use crate::models::verdict::{TriageVerdict, TriagedFinding};

/// One line of the report: a finding and, when it went through triage, its
/// verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    #[serde(flatten)]
    pub finding: FindingRecord,
    pub verdict: Option<TriageVerdict>,
}

type FindingKey = (String, String, Severity, String);

fn key(f: &FindingRecord) -> FindingKey {
    (f.tool.clone(), f.target.clone(), f.severity, f.description.clone())
}

/// Pair every aggregated finding with the verdict it received, if any.
/// Findings below the triage gate, or left untriaged by an interrupt, keep
/// `None`.
pub fn attach_verdicts(findings: &[FindingRecord], triaged: Vec<TriagedFinding>) -> Vec<ReportEntry> {
    let mut verdicts: HashMap<FindingKey, Vec<TriageVerdict>> = HashMap::new();
    for t in triaged {
        verdicts.entry(key(&t.finding)).or_default().push(t.verdict);
    }

    findings
        .iter()
        .map(|f| ReportEntry {
            finding: f.clone(),
            verdict: verdicts.get_mut(&key(f)).and_then(Vec::pop),
        })
        .collect()
}

/// Entries bucketed CRITICAL, HIGH, MEDIUM, LOW, INFO. Empty buckets are left
/// out.
pub fn group_by_severity(entries: &[ReportEntry]) -> Vec<(Severity, Vec<&ReportEntry>)> {
    Severity::ALL
        .iter()
        .map(|sev| (*sev, entries.iter().filter(|e| e.finding.severity == *sev).collect::<Vec<_>>()))
        .filter(|(_, bucket)| !bucket.is_empty())
        .collect()
}

pub fn format_entry_markdown(entry: &ReportEntry) -> String {
    let f = &entry.finding;
    let mut out = format!(
        "### [{}] {}\n\n- **Target:** {}\n- **Tool confidence:** {}\n",
        f.tool.to_uppercase(),
        f.description,
        f.target,
        f.confidence.as_str(),
    );
    if let Some(v) = &entry.verdict {
        let label = if v.is_valid { "Valid" } else { "False positive" };
        out.push_str(&format!(
            "- **Triage:** {} ({} confidence)\n- **Reasoning:** {}\n- **Recommendation:** {}\n",
            label,
            v.confidence.as_str(),
            v.reasoning,
            v.recommendation,
        ));
    }
    out
}

pub fn format_summary_table(entries: &[ReportEntry]) -> String {
    let mut out = String::from("| Severity | Count |\n|---|---|\n");
    for sev in Severity::ALL {
        let count = entries.iter().filter(|e| e.finding.severity == sev).count();
        out.push_str(&format!("| {} | {} |\n", sev, count));
    }
    out.push_str(&format!("| **Total** | **{}** |\n", entries.len()));
    out
}

pub fn format_report(domain: &str, generated_at: &str, entries: &[ReportEntry]) -> String {
    let mut report = format!("# Hunter Report: {}\n\nGenerated: {}\n\n", domain, generated_at);
    report.push_str(&format_summary_table(entries));

    if entries.is_empty() {
        report.push_str("\nNo findings were recorded.\n");
        return report;
    }

    for (severity, bucket) in group_by_severity(entries) {
        report.push_str(&format!("\n## {} ({})\n\n", severity, bucket.len()));
        for entry in bucket {
            report.push_str(&format_entry_markdown(entry));
            report.push('\n');
        }
    }
    report
}
