//! Configuration file data structures

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = ".weigh-in.toml";

/// `.weigh-in.toml` structure
///
/// Every field is a default for the matching `run` option; command-line
/// flags and environment variables win. Tokens are never read from here.
///
/// ```toml
/// manifest = "dist/manifest.json"
/// output-directory = "dist"
/// label = "asset sizes"
///
/// [[failure-thresholds]]
/// targets = ".js"
/// maxSize = 512000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WeighInConfig {
    /// Bundler manifest (asset id → emitted filename)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,

    /// Directory the manifest filenames are relative to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_directory: Option<PathBuf>,

    /// Directory the report files are written to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts_directory: Option<PathBuf>,

    /// Artifact path suffix of the base build's report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_stats_path: Option<String>,

    /// Project name (multi-project mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    /// Commit status context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Local stats store file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_store: Option<PathBuf>,

    /// Raw failure thresholds, validated before use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_thresholds: Option<Value>,
}
