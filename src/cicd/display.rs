//! Display formatting for weigh-in results

use super::output::DiffReport;
use crate::fmt::{
    format_signed_percent, format_signed_size, format_size, CHECKMARK, CROSSMARK, SCALE,
};
use console::style;

/// Print the asset table and threshold verdict
pub fn print_diff_report(report: &DiffReport) {
    println!("\n{}{}", SCALE, style("Asset size weigh-in").bold());

    let width = report
        .asset_diffs
        .keys()
        .map(|asset_id| asset_id.len())
        .max()
        .unwrap_or(0);

    for (asset_id, diff) in &report.asset_diffs {
        let change = format!(
            "{}, {}",
            format_signed_size(diff.difference),
            format_signed_percent(diff.percent_change)
        );
        let change = if diff.difference > 0 {
            style(change).red()
        } else if diff.difference < 0 {
            style(change).green()
        } else {
            style(change).dim()
        };

        println!(
            "   {:<width$}  {:>10}  ({})",
            asset_id,
            format_size(diff.current),
            change,
            width = width
        );
    }

    if report.passed() {
        println!("\n{}{}", CHECKMARK, style("All failure thresholds hold").green());
    } else {
        println!(
            "\n{}{}",
            CROSSMARK,
            style(format!(
                "{} failure threshold(s) exceeded",
                report.threshold_failures.len()
            ))
            .red()
            .bold()
        );
        for failure in &report.threshold_failures {
            println!("   {}", style(&failure.message).red());
        }
    }
}
