//! Weigh-in workflow orchestration
//!
//! This module composes the complete weigh-in as a single [`Effect`] and
//! provides the one error boundary that turns its outcome into a
//! [`RunOutcome`]. It separates business logic from presentation concerns,
//! so the run can be driven programmatically or via the CLI.
//!
//! # Architecture
//!
//! 1. **Pre-flight**: failure thresholds and the artifact pattern are
//!    validated before any I/O.
//! 2. **Measure**: the bundler manifest is read and every listed asset is
//!    stat'ed, after a `pending` status is posted.
//! 3. **Compare**: the base branch report is fetched from CircleCI, diffed
//!    against the current report and checked against the thresholds.
//! 4. **Publish**: report files are written as artifacts and the final
//!    commit status is posted.
//!
//! # Examples
//!
//! ```no_run
//! use circleci_weigh_in::cmd::workflow::{RunOutcome, WeighInSettings, WeighInWorkflow};
//! use circleci_weigh_in::env::Environment;
//! use circleci_weigh_in::infra::{RealFileSystem, ReqwestSender};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let env = Arc::new(Environment {
//!     request: Arc::new(ReqwestSender::new(Duration::from_secs(30))?),
//!     fs: Arc::new(RealFileSystem),
//!     github_api_token: "gh-token".to_string(),
//!     circle_api_token: "circle-token".to_string(),
//!     repo_owner: "acme".to_string(),
//!     repo_name: "web".to_string(),
//! });
//!
//! let settings = WeighInSettings::new("dist/manifest.json", "dist", "artifacts");
//! match WeighInWorkflow::new(settings).execute(env).await? {
//!     RunOutcome::Completed(comparison) => println!("{} assets", comparison.current.len()),
//!     RunOutcome::Skipped => println!("no pull request"),
//! }
//! # Ok(())
//! # }
//! ```

use crate::assets::{
    collect_asset_stats, parse_project_reports, parse_report, read_manifest, AssetSizeReport,
    ProjectSizeReports,
};
use crate::cicd::base_build::{retrieve_base_asset_stats, ArtifactPattern, BaseBuildQuery};
use crate::cicd::budget::BudgetChecker;
use crate::cicd::diff::diff_reports;
use crate::cicd::history::{StatsStore, DEFAULT_STATS_STORE};
use crate::cicd::output::{diff_report_filename, ArtifactWriter, DiffReport, ASSET_STATS_FILENAME};
use crate::cicd::status::{post_status, StatusInput, StatusPayload};
use crate::config::threshold::FailureThreshold;
use crate::config::validator::parse_failure_thresholds;
use crate::effect::Effect;
use crate::env::{Environment, HasFileSystem};
use crate::error::WeighInError;
use futures::future;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Default commit status context
pub const DEFAULT_LABEL: &str = "Asset Sizes";

/// Everything a weigh-in run needs besides the environment
#[derive(Debug, Clone, PartialEq)]
pub struct WeighInSettings {
    /// Bundler manifest (asset id → emitted filename)
    pub manifest_path: PathBuf,
    /// Directory the manifest filenames are relative to
    pub output_directory: PathBuf,
    /// Directory the report files are written to
    pub artifacts_directory: PathBuf,
    /// Artifact path suffix of the base build's report
    pub asset_stats_path: String,
    /// Project name; enables multi-project mode
    pub project_name: Option<String>,
    /// Raw failure thresholds, validated during pre-flight
    pub failure_thresholds: Value,
    /// Commit status context
    pub label: String,
    /// Pull request number, absent when the build has no open PR
    pub pull_request_id: Option<String>,
    /// Commit the statuses are attached to
    pub build_sha: Option<String>,
    /// CI build URL used as the status link
    pub build_url: Option<String>,
    /// Local stats store file
    pub stats_store: PathBuf,
    /// Whether commit statuses are posted
    pub post_status: bool,
}

impl WeighInSettings {
    /// Settings with defaults for everything but the three paths
    pub fn new(
        manifest_path: impl Into<PathBuf>,
        output_directory: impl Into<PathBuf>,
        artifacts_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            output_directory: output_directory.into(),
            artifacts_directory: artifacts_directory.into(),
            asset_stats_path: ASSET_STATS_FILENAME.to_string(),
            project_name: None,
            failure_thresholds: Value::Array(Vec::new()),
            label: DEFAULT_LABEL.to_string(),
            pull_request_id: None,
            build_sha: None,
            build_url: None,
            stats_store: PathBuf::from(DEFAULT_STATS_STORE),
            post_status: true,
        }
    }

    /// Commit to post statuses for, when posting applies to this run
    fn status_sha(&self) -> Option<&str> {
        if self.post_status && self.pull_request_id.is_some() {
            self.build_sha.as_deref()
        } else {
            None
        }
    }
}

/// Extract a pull request number from `CIRCLE_PULL_REQUEST`
///
/// Accepts a bare number or a pull request URL.
///
/// ```
/// use circleci_weigh_in::cmd::workflow::parse_pull_request_id;
///
/// assert_eq!(parse_pull_request_id("https://github.com/acme/web/pull/45"), Some("45".to_string()));
/// assert_eq!(parse_pull_request_id("45"), Some("45".to_string()));
/// assert_eq!(parse_pull_request_id("  "), None);
/// ```
pub fn parse_pull_request_id(raw: &str) -> Option<String> {
    raw.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Result of a completed comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Current asset report
    pub current: AssetSizeReport,
    /// Diffs and threshold failures
    pub report: DiffReport,
    /// Final status payload
    pub status: StatusPayload,
    /// Whether the final status was posted
    pub status_posted: bool,
}

/// How a weigh-in ended without error
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Comparison completed (thresholds may have failed)
    Completed(Comparison),
    /// No open pull request; only the current report was written
    Skipped,
}

#[derive(Debug, Clone)]
struct Preflight {
    thresholds: Vec<FailureThreshold>,
    pattern: ArtifactPattern,
}

impl Preflight {
    fn check(settings: &WeighInSettings) -> Result<Self, WeighInError> {
        Ok(Self {
            thresholds: parse_failure_thresholds(&settings.failure_thresholds)?,
            pattern: ArtifactPattern::new(&settings.asset_stats_path)?,
        })
    }
}

/// Base build report, split per project in multi-project mode
#[derive(Debug, Clone, Default)]
struct BaseStats {
    projects: ProjectSizeReports,
    report: AssetSizeReport,
}

impl BaseStats {
    fn from_body(body: Value, project_name: Option<&str>) -> Result<Self, WeighInError> {
        match project_name {
            None => Ok(Self {
                projects: ProjectSizeReports::new(),
                report: parse_report(body, "base asset stats")?,
            }),
            Some(project) => {
                let projects = parse_project_reports(body, "base asset stats")?;
                let report = projects.get(project).cloned().unwrap_or_else(|| {
                    log::warn!(
                        "Base build has no asset stats for project {}; treating every asset as new",
                        project
                    );
                    AssetSizeReport::new()
                });
                Ok(Self { projects, report })
            }
        }
    }
}

/// Weigh-in workflow orchestrator
pub struct WeighInWorkflow {
    settings: Arc<WeighInSettings>,
}

impl WeighInWorkflow {
    /// Create a workflow for `settings`
    pub fn new(settings: WeighInSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    /// The complete weigh-in as one effect
    ///
    /// Fails with [`WeighInError::NoOpenPullRequest`] after writing the
    /// current report when the build has no pull request.
    pub fn pipeline(&self) -> Effect<Environment, Comparison, WeighInError> {
        let settings = Arc::clone(&self.settings);
        let preflight_settings = Arc::clone(&settings);

        Effect::of(())
            .try_map(move |_| Preflight::check(&preflight_settings))
            .chain(move |preflight| {
                let preflight = Arc::new(preflight);
                let settings = Arc::clone(&settings);

                post_pending_status(&settings)
                    .chain({
                        let settings = Arc::clone(&settings);
                        move |_| measure_current(&settings)
                    })
                    .chain(move |current| match settings.pull_request_id.clone() {
                        None => record_without_base(Arc::clone(&settings), current),
                        Some(pull_request_id) => compare_with_base(
                            Arc::clone(&settings),
                            Arc::clone(&preflight),
                            pull_request_id,
                            current,
                        ),
                    })
            })
    }

    /// Run the pipeline behind the error boundary
    ///
    /// A missing pull request is logged at info level and reported as
    /// [`RunOutcome::Skipped`]. Every other error is logged once, reported
    /// as an `error` commit status when possible, and returned.
    pub async fn execute(&self, env: Arc<Environment>) -> Result<RunOutcome, WeighInError> {
        match self.pipeline().run(Arc::clone(&env)).await {
            Ok(comparison) => Ok(RunOutcome::Completed(comparison)),
            Err(err) if err.is_benign() => {
                log::info!("{}", err);
                Ok(RunOutcome::Skipped)
            }
            Err(err) => {
                log::error!("{}", err);
                self.post_error_status(env, &err).await;
                Err(err)
            }
        }
    }

    async fn post_error_status(&self, env: Arc<Environment>, err: &WeighInError) {
        // Pre-flight errors happen before the pending status and any I/O.
        if matches!(
            err,
            WeighInError::InvalidFailureThresholdOption { .. }
                | WeighInError::InvalidArtifactPattern { .. }
        ) {
            return;
        }

        let Some(sha) = self.settings.status_sha() else {
            return;
        };

        let payload = StatusPayload::error(
            &self.settings.label,
            self.settings.build_url.as_deref(),
            &err.to_string(),
        );
        if let Err(post_err) = post_status(sha, &payload).run(env).await {
            log::warn!("Failed to post error status: {}", post_err);
        }
    }
}

/// Effect over the filesystem of the environment
fn with_fs<T, F>(f: F) -> Effect<Environment, T, WeighInError>
where
    T: Send + 'static,
    F: Fn(&Environment) -> Result<T, WeighInError> + Send + Sync + 'static,
{
    Effect::from_env_fn(move |env: Arc<Environment>| future::ready(f(env.as_ref())))
}

fn post_pending_status(settings: &WeighInSettings) -> Effect<Environment, (), WeighInError> {
    match settings.status_sha() {
        Some(sha) => post_status(
            sha,
            &StatusPayload::pending(&settings.label, settings.build_url.as_deref()),
        )
        .map(|_| ()),
        None => Effect::of(()),
    }
}

fn measure_current(settings: &WeighInSettings) -> Effect<Environment, AssetSizeReport, WeighInError> {
    let output_directory = settings.output_directory.clone();

    read_manifest(settings.manifest_path.clone()).chain(move |manifest| {
        collect_asset_stats(output_directory.clone(), manifest)
    })
}

/// Write the current report (merged through the stats store in
/// multi-project mode) into the artifacts directory
fn write_current_stats(
    env: &Environment,
    settings: &WeighInSettings,
    base_projects: &ProjectSizeReports,
    current: &AssetSizeReport,
) -> Result<(), WeighInError> {
    let writer = ArtifactWriter::new(&settings.artifacts_directory, env.file_system());
    writer.make_directory()?;

    match settings.project_name.as_deref() {
        None => {
            writer.write_json(ASSET_STATS_FILENAME, current)?;
        }
        Some(project) => {
            let mut store = StatsStore::load_with_fs(&settings.stats_store, env.file_system())?;
            store.record(project, current.clone());
            store.save_with_fs(&settings.stats_store, env.file_system())?;
            writer.write_json(ASSET_STATS_FILENAME, &store.merged_over(base_projects))?;
        }
    }
    Ok(())
}

fn record_without_base(
    settings: Arc<WeighInSettings>,
    current: AssetSizeReport,
) -> Effect<Environment, Comparison, WeighInError> {
    with_fs(move |env| {
        write_current_stats(env, &settings, &ProjectSizeReports::new(), &current)?;
        Err(WeighInError::NoOpenPullRequest)
    })
}

fn compare_with_base(
    settings: Arc<WeighInSettings>,
    preflight: Arc<Preflight>,
    pull_request_id: String,
    current: AssetSizeReport,
) -> Effect<Environment, Comparison, WeighInError> {
    let query = BaseBuildQuery {
        pull_request_id,
        artifact_pattern: preflight.pattern.clone(),
    };
    let current = Arc::new(current);
    let decode_settings = Arc::clone(&settings);

    retrieve_base_asset_stats(query)
        .escalate()
        .try_map(move |body| BaseStats::from_body(body, decode_settings.project_name.as_deref()))
        .chain(move |base| {
            let settings = Arc::clone(&settings);
            let preflight = Arc::clone(&preflight);
            let current = Arc::clone(&current);

            with_fs({
                let settings = Arc::clone(&settings);
                let current = Arc::clone(&current);
                move |env| {
                    write_current_stats(env, &settings, &base.projects, &current)?;

                    let report = DiffReport {
                        asset_diffs: diff_reports(&base.report, &current),
                        threshold_failures: BudgetChecker::new(&current)
                            .evaluate(&preflight.thresholds)?,
                    };

                    ArtifactWriter::new(&settings.artifacts_directory, env.file_system())
                        .write_json(
                            &diff_report_filename(settings.project_name.as_deref()),
                            &report,
                        )?;
                    Ok(report)
                }
            })
            .chain(move |report| publish(&settings, (*current).clone(), report))
        })
}

fn publish(
    settings: &WeighInSettings,
    current: AssetSizeReport,
    report: DiffReport,
) -> Effect<Environment, Comparison, WeighInError> {
    let status = StatusPayload::from_results(StatusInput {
        asset_diffs: &report.asset_diffs,
        threshold_failures: &report.threshold_failures,
        label: &settings.label,
        target_url: settings.build_url.as_deref(),
    });

    let comparison = Comparison {
        current,
        report,
        status: status.clone(),
        status_posted: false,
    };

    match settings.status_sha() {
        Some(sha) => post_status(sha, &status).map(move |_| Comparison {
            status_posted: true,
            ..comparison.clone()
        }),
        None => Effect::of(comparison),
    }
}
