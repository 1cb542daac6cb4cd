//! Artifact files and JSON output for CI/CD integration

use crate::cicd::budget::ThresholdFailure;
use crate::cicd::diff::AssetDiffs;
use crate::error::WeighInError;
use crate::infra::FileSystem;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File holding the current asset size report
pub const ASSET_STATS_FILENAME: &str = "asset-stats.json";

/// Name of the diff report, per project in multi-project mode
///
/// ```
/// use circleci_weigh_in::cicd::output::diff_report_filename;
///
/// assert_eq!(diff_report_filename(None), "asset-diffs.json");
/// assert_eq!(diff_report_filename(Some("admin")), "asset-diffs-admin.json");
/// ```
pub fn diff_report_filename(project_name: Option<&str>) -> String {
    match project_name {
        Some(project) => format!("asset-diffs-{}.json", project),
        None => "asset-diffs.json".to_string(),
    }
}

/// Contents of the diff report artifact, also printed by `--json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    /// Asset id → diff
    pub asset_diffs: AssetDiffs,
    /// Violated thresholds
    pub threshold_failures: Vec<ThresholdFailure>,
}

impl DiffReport {
    /// Whether every threshold holds
    pub fn passed(&self) -> bool {
        self.threshold_failures.is_empty()
    }

    /// Exit code for CI/CD (0 = pass, 1 = threshold failures)
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, WeighInError> {
        serialize(self, "diff report")
    }

    /// Print JSON to stdout
    pub fn print(&self) {
        match self.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error formatting JSON: {}", e),
        }
    }
}

fn serialize<T: Serialize>(value: &T, context: &str) -> Result<String, WeighInError> {
    serde_json::to_string_pretty(value).map_err(|source| WeighInError::MalformedReport {
        context: context.to_string(),
        source,
    })
}

/// Writer for the files stored as CI artifacts
pub struct ArtifactWriter<'a> {
    root: &'a Path,
    fs: &'a dyn FileSystem,
}

impl<'a> ArtifactWriter<'a> {
    /// Writer rooted at the artifacts directory
    pub fn new(root: &'a Path, fs: &'a dyn FileSystem) -> Self {
        Self { root, fs }
    }

    /// Create the artifacts directory
    pub fn make_directory(&self) -> Result<(), WeighInError> {
        self.fs
            .create_dir_all(self.root)
            .map_err(|source| WeighInError::Io {
                context: format!("creating artifacts directory {}", self.root.display()),
                source,
            })
    }

    /// Serialize `value` as pretty JSON into `filename`
    pub fn write_json<T: Serialize>(&self, filename: &str, value: &T) -> Result<PathBuf, WeighInError> {
        let path = self.root.join(filename);
        let contents = serialize(value, filename)?;

        self.fs
            .write(&path, contents.as_bytes())
            .map_err(|source| WeighInError::Io {
                context: format!("writing {}", path.display()),
                source,
            })?;

        log::debug!("Wrote {}", path.display());
        Ok(path)
    }
}
