//! Asset size reports and the collaborators that build them
//!
//! The bundler manifest maps asset ids to emitted filenames. Every listed
//! file is stat'ed under the output directory to form the current
//! [`AssetSizeReport`].

use crate::effect::Effect;
use crate::env::HasFileSystem;
use crate::error::WeighInError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Size of one emitted asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetStat {
    /// Emitted filename (not part of the stored report)
    #[serde(default, skip_serializing)]
    pub filename: String,
    /// Path of the file relative to the working directory
    pub path: String,
    /// Size in bytes
    pub size: u64,
}

/// Asset id → stat, sorted by asset id
pub type AssetSizeReport = BTreeMap<String, AssetStat>;

/// Project name → report, used when several projects share one CI build
pub type ProjectSizeReports = BTreeMap<String, AssetSizeReport>;

/// Asset id → emitted filename
pub type Manifest = BTreeMap<String, String>;

/// Parse a single-project report
pub fn parse_report(value: Value, context: &str) -> Result<AssetSizeReport, WeighInError> {
    serde_json::from_value(value).map_err(|source| WeighInError::MalformedReport {
        context: context.to_string(),
        source,
    })
}

/// Parse a multi-project report map
pub fn parse_project_reports(
    value: Value,
    context: &str,
) -> Result<ProjectSizeReports, WeighInError> {
    serde_json::from_value(value).map_err(|source| WeighInError::MalformedReport {
        context: context.to_string(),
        source,
    })
}

/// Read and parse the bundler manifest
pub fn read_manifest<E>(path: PathBuf) -> Effect<E, Manifest, WeighInError>
where
    E: HasFileSystem + Send + Sync + 'static,
{
    Effect::from_env_fn(move |env: Arc<E>| {
        let result = load_manifest(env.as_ref(), &path);
        async move { result }
    })
}

fn load_manifest<E: HasFileSystem>(env: &E, path: &Path) -> Result<Manifest, WeighInError> {
    let manifest_error = |reason: String| WeighInError::ManifestRead {
        path: path.to_path_buf(),
        reason,
    };

    let contents = env
        .file_system()
        .read_to_string(path)
        .map_err(|e| manifest_error(e.to_string()))?;
    let manifest: Manifest =
        serde_json::from_str(&contents).map_err(|e| manifest_error(e.to_string()))?;

    log::debug!("Manifest {} lists {} assets", path.display(), manifest.len());
    Ok(manifest)
}

/// Stat every manifest entry under `output_directory`
pub fn collect_asset_stats<E>(
    output_directory: PathBuf,
    manifest: Manifest,
) -> Effect<E, AssetSizeReport, WeighInError>
where
    E: HasFileSystem + Send + Sync + 'static,
{
    Effect::from_env_fn(move |env: Arc<E>| {
        let result = stat_assets(env.as_ref(), &output_directory, &manifest);
        async move { result }
    })
}

fn stat_assets<E: HasFileSystem>(
    env: &E,
    output_directory: &Path,
    manifest: &Manifest,
) -> Result<AssetSizeReport, WeighInError> {
    manifest
        .iter()
        .map(|(asset_id, filename)| {
            let path = output_directory.join(filename);
            let size = env
                .file_system()
                .file_size(&path)
                .map_err(|source| WeighInError::Io {
                    context: format!("reading size of {}", path.display()),
                    source,
                })?;

            Ok((
                asset_id.clone(),
                AssetStat {
                    filename: filename.clone(),
                    path: path.to_string_lossy().into_owned(),
                    size,
                },
            ))
        })
        .collect()
}
