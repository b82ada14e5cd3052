//! Terminal output utilities

use crate::sync::SyncReport;
use console::style;
use mapper_k8s::WriteOutcome;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Print the end-of-run summary
pub fn summary(report: &SyncReport) {
    let verb = match report.outcome {
        WriteOutcome::Created => "Created",
        WriteOutcome::Updated => "Updated",
        WriteOutcome::DryRun => "Would write",
    };
    success(&format!(
        "{} Secret {}/{} with {} keys",
        verb,
        report.namespace,
        report.name,
        report.keys.len()
    ));
    for key in &report.keys {
        kv("key", key);
    }
    for warning_item in &report.warnings {
        warning(&warning_item.to_string());
    }
}
