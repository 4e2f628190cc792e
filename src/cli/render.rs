use std::collections::HashMap;
use console::style;
use crate::config::Settings;
use crate::models::finding::Severity;
use crate::models::target::TaskStatus;
use crate::pipeline::{RunOutcome, RunSummary};

pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else if ms < 3_600_000 {
        format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1000)
    } else {
        format!("{}h {}m", ms / 3_600_000, (ms % 3_600_000) / 60_000)
    }
}

pub fn severity_badge(severity: Severity) -> String {
    let label = format!("{:<8}", severity.as_str());
    match severity {
        Severity::Critical => style(label).red().bold().to_string(),
        Severity::High => style(label).red().to_string(),
        Severity::Medium => style(label).yellow().to_string(),
        Severity::Low => style(label).blue().to_string(),
        Severity::Info => style(label).dim().to_string(),
    }
}

/// Commit and build time embedded by the build script.
pub fn build_label() -> String {
    let git_hash = option_env!("GIT_HASH").unwrap_or("dev");
    match option_env!("BUILD_TIMESTAMP") {
        Some(built) => format!("{}, built {}", git_hash, built),
        None => git_hash.to_string(),
    }
}

pub fn print_banner(domain: &str, settings: &Settings, dry_run: bool) {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "\n{} {} {}",
        style("HUNTER").color256(209).bold(),
        style(format!("v{}", version)).dim(),
        style(format!("({})", build_label())).dim(),
    );
    println!("  {} {}", style("Target:").dim(), style(domain).white().bold());
    println!(
        "  {} {} scan / {} triage, {}s unit timeout, {} req/s",
        style("Pool:").dim(),
        settings.max_threads,
        settings.effective_triage_workers(),
        settings.unit_timeout.as_secs(),
        settings.rate_limit,
    );
    println!("  {} {}", style("Store:").dim(), settings.db_path.display());
    println!(
        "  {} {}",
        style("Triage:").dim(),
        settings.llm.as_ref().map(|l| l.provider.as_str()).unwrap_or("disabled"),
    );
    if dry_run {
        println!("  {}", style("DRY RUN: nothing will be scanned").yellow().bold());
    }
    println!();
}

pub fn print_summary(summary: &RunSummary) {
    let outcome = match summary.outcome {
        RunOutcome::Success => style("completed").green().bold(),
        RunOutcome::PartialFailure => style("completed with failures").yellow().bold(),
        RunOutcome::Interrupted => style("interrupted").red().bold(),
    };
    println!("\n{} Run {} in {}", style("▶").green().bold(), outcome, format_duration(summary.duration_ms));
    if summary.resumed {
        println!("  {} resumed {} pending targets", style("↻").cyan(), summary.routed);
    } else {
        println!("  ingested {}, routed {}", summary.ingested, summary.routed);
    }
    println!(
        "  scan: {} completed, {} failed, {} skipped, {} not started",
        summary.scan.completed, summary.scan.failed, summary.scan.skipped, summary.scan.not_submitted,
    );
    println!("  triage: {} reviewed", summary.triage.completed);
    println!("  findings: {}", style(summary.findings).bold());
    if let Some(path) = &summary.report {
        println!("  report: {}", style(path.display()).cyan());
    }
}

pub fn print_status(targets: &HashMap<TaskStatus, usize>, findings: &HashMap<Severity, usize>) {
    println!("{}", style("Targets").bold());
    for status in [TaskStatus::Pending, TaskStatus::Processing, TaskStatus::Completed, TaskStatus::Failed] {
        println!("  {:<12} {}", status.as_str(), targets.get(&status).copied().unwrap_or(0));
    }
    println!("{}", style("Findings").bold());
    for severity in Severity::ALL {
        println!("  {} {}", severity_badge(severity), findings.get(&severity).copied().unwrap_or(0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(250), "250ms");
        assert_eq!(format_duration(1500), "1.5s");
        assert_eq!(format_duration(125_000), "2m 5s");
        assert_eq!(format_duration(3_720_000), "1h 2m");
    }

    #[test]
    fn test_build_label_carries_build_time() {
        let label = build_label();
        assert!(label.contains(env!("BUILD_TIMESTAMP")));
        assert!(label.contains(", built "));
    }
}
