//! Run statistics.

use console::style;

use crate::download::{ItemOutcome, RunReport};
use crate::sync::SyncPlan;

/// Print what the planner found.
pub fn print_plan(plan: &SyncPlan) {
    println!(
        "Checked {} groups ({} refreshed), {} files to download",
        plan.groups_total,
        plan.groups_refreshed,
        style(plan.files_to_download).green()
    );
}

/// Print the final report: problem items first, then the totals.
pub fn print_report(report: &RunReport) {
    let problems: Vec<_> = report.problems().collect();
    if !problems.is_empty() {
        println!();
        println!("{}", style("Problems:").bold());
        for record in problems {
            match &record.outcome {
                ItemOutcome::Skipped { reason } => println!(
                    "  {} {} ({})",
                    style("skipped").yellow(),
                    record.path.display(),
                    reason
                ),
                ItemOutcome::Failed { error } => println!(
                    "  {} {} ({})",
                    style("failed").red(),
                    record.path.display(),
                    error
                ),
                _ => {}
            }
        }
    }

    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Summary:").bold());
    println!(
        "  Downloaded:      {} ({} bytes)",
        style(report.downloaded()).green(),
        report.bytes()
    );
    println!("  Already present: {}", report.already_present());
    println!("  Skipped:         {}", style(report.skipped()).yellow());
    if report.failed() > 0 {
        println!("  Failed:          {}", style(report.failed()).red());
    }
    if report.unsupported > 0 {
        println!("  Unsupported:     {}", report.unsupported);
    }
    println!("{}", style("═".repeat(50)).dim());
}
