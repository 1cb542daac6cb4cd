//! Local stats store for multi-project builds
//!
//! When several projects are weighed in one CI build, each run records its
//! project's report in a JSON file (`.weigh-in/stats.json` by default) so the
//! last run can publish a combined `asset-stats.json` holding every project.

use crate::assets::{AssetSizeReport, ProjectSizeReports};
use crate::error::WeighInError;
use crate::infra::FileSystem;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Default location of the stats store, relative to the working directory
pub const DEFAULT_STATS_STORE: &str = ".weigh-in/stats.json";

/// Project reports recorded by earlier runs of the same build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsStore {
    /// Project name → report
    pub projects: ProjectSizeReports,
}

impl StatsStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store; a missing file is an empty store
    pub fn load_with_fs(path: &Path, fs: &dyn FileSystem) -> Result<Self, WeighInError> {
        let contents = match fs.read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No stats store at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(WeighInError::Io {
                    context: format!("reading stats store {}", path.display()),
                    source,
                })
            }
        };

        serde_json::from_str(&contents).map_err(|source| WeighInError::MalformedReport {
            context: format!("stats store {}", path.display()),
            source,
        })
    }

    /// Save the store, creating its directory when needed
    pub fn save_with_fs(&self, path: &Path, fs: &dyn FileSystem) -> Result<(), WeighInError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs.create_dir_all(dir).map_err(|source| WeighInError::Io {
                context: format!("creating {}", dir.display()),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(|source| {
            WeighInError::MalformedReport {
                context: "stats store".to_string(),
                source,
            }
        })?;

        fs.write(path, contents.as_bytes())
            .map_err(|source| WeighInError::Io {
                context: format!("writing stats store {}", path.display()),
                source,
            })
    }

    /// Record the report of `project`, replacing any earlier one
    pub fn record(&mut self, project: &str, report: AssetSizeReport) {
        self.projects.insert(project.to_string(), report);
    }

    /// Combine base reports with the locally recorded ones
    ///
    /// Local entries win over base entries for the same project.
    ///
    /// # Examples
    ///
    /// ```
    /// use circleci_weigh_in::assets::{AssetSizeReport, ProjectSizeReports};
    /// use circleci_weigh_in::cicd::history::StatsStore;
    ///
    /// let base = ProjectSizeReports::from([
    ///     ("other-proj".to_string(), AssetSizeReport::new()),
    ///     ("my-proj".to_string(), AssetSizeReport::new()),
    /// ]);
    /// let mut store = StatsStore::new();
    /// store.record("my-proj", AssetSizeReport::new());
    ///
    /// let merged = store.merged_over(&base);
    /// assert_eq!(merged.len(), 2);
    /// ```
    pub fn merged_over(&self, base: &ProjectSizeReports) -> ProjectSizeReports {
        let mut merged = base.clone();
        merged.extend(
            self.projects
                .iter()
                .map(|(project, report)| (project.clone(), report.clone())),
        );
        merged
    }
}

/// Resolve the store path against the working directory
pub fn stats_store_path(working_dir: &Path, configured: Option<&Path>) -> PathBuf {
    working_dir.join(configured.unwrap_or_else(|| Path::new(DEFAULT_STATS_STORE)))
}
