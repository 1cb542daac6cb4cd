//! Compare command implementation
//!
//! Handles the `circleci-weigh-in compare` command which diffs two asset
//! size reports on disk, without talking to GitHub or CircleCI.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

use crate::assets::{parse_report, AssetSizeReport};
use crate::cicd::budget::BudgetChecker;
use crate::cicd::diff::diff_reports;
use crate::cicd::display::print_diff_report;
use crate::cicd::output::DiffReport;
use crate::config::validator::parse_failure_thresholds;
use crate::infra::{FileSystem, RealFileSystem};

/// Compare a base report with a current report
///
/// Returns the exit code: 1 when a threshold fails, 0 otherwise.
///
/// # Examples
///
/// ```no_run
/// use circleci_weigh_in::cmd::compare::cmd_compare;
/// use serde_json::json;
/// use std::path::Path;
///
/// let thresholds = json!([{"targets": ".js", "maxSize": 512000}]);
/// let exit_code = cmd_compare(
///     Path::new("base/asset-stats.json"),
///     Path::new("artifacts/asset-stats.json"),
///     &thresholds,
///     false,
/// )?;
/// std::process::exit(exit_code);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn cmd_compare(base: &Path, current: &Path, thresholds: &Value, json: bool) -> Result<i32> {
    let report = compare_with_fs(base, current, thresholds, &RealFileSystem)?;

    if json {
        report.print();
    } else {
        print_diff_report(&report);
    }
    Ok(report.exit_code())
}

/// Build the diff report of two report files
pub fn compare_with_fs(
    base: &Path,
    current: &Path,
    thresholds: &Value,
    fs: &dyn FileSystem,
) -> Result<DiffReport> {
    let thresholds = parse_failure_thresholds(thresholds)?;
    let base_report = load_report(base, fs, "Base report")?;
    let current_report = load_report(current, fs, "Current report")?;

    Ok(DiffReport {
        asset_diffs: diff_reports(&base_report, &current_report),
        threshold_failures: BudgetChecker::new(&current_report).evaluate(&thresholds)?,
    })
}

fn load_report(path: &Path, fs: &dyn FileSystem, label: &str) -> Result<AssetSizeReport> {
    let contents = fs
        .read_to_string(path)
        .with_context(|| format!("{} not found: {}", label, path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON: {}", label, path.display()))?;
    Ok(parse_report(value, &format!("report {}", path.display()))?)
}
