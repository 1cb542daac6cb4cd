//! Run command implementation
//!
//! Handles `circleci-weigh-in run`: resolves settings from flags, CircleCI
//! environment variables and `.weigh-in.toml`, builds the run environment
//! and drives the workflow.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::workflow::{parse_pull_request_id, RunOutcome, WeighInSettings, WeighInWorkflow};
use crate::cicd::display::print_diff_report;
use crate::cicd::history::stats_store_path;
use crate::config::{ConfigLoader, WeighInConfig};
use crate::env::Environment;
use crate::error::WeighInError;
use crate::fmt::INFO;
use crate::infra::{RealFileSystem, ReqwestSender};

/// Options of the `run` command
///
/// Flags win over environment variables, which win over `.weigh-in.toml`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Bundler manifest mapping asset ids to emitted filenames
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Directory the manifest filenames are relative to [default: manifest's directory]
    #[arg(long, value_name = "DIR")]
    pub output_directory: Option<PathBuf>,

    /// Directory the report files are written to
    #[arg(long, env = "CIRCLE_ARTIFACTS", value_name = "DIR")]
    pub artifacts_directory: Option<PathBuf>,

    /// Artifact path suffix (regular expression) of the base build's report
    #[arg(long, value_name = "PATTERN")]
    pub asset_stats_path: Option<String>,

    /// Project name, for builds that weigh several projects
    #[arg(long)]
    pub project_name: Option<String>,

    /// Failure thresholds as a JSON array
    #[arg(long, value_name = "JSON")]
    pub failure_thresholds: Option<String>,

    /// Commit status context
    #[arg(long)]
    pub label: Option<String>,

    /// Pull request number or URL
    #[arg(long, env = "CIRCLE_PULL_REQUEST")]
    pub pull_request: Option<String>,

    /// Commit the statuses are posted for
    #[arg(long, env = "CIRCLE_SHA1")]
    pub build_sha: Option<String>,

    /// CI build URL linked from the status
    #[arg(long, env = "CIRCLE_BUILD_URL")]
    pub build_url: Option<String>,

    /// Repository owner
    #[arg(long, env = "CIRCLE_PROJECT_USERNAME")]
    pub repo_owner: String,

    /// Repository name
    #[arg(long, env = "CIRCLE_PROJECT_REPONAME")]
    pub repo_name: String,

    /// GitHub API token
    #[arg(long, env = "GITHUB_API_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// CircleCI API token
    #[arg(long, env = "CIRCLE_API_TOKEN", hide_env_values = true)]
    pub circle_token: String,

    /// Local stats store file [default: .weigh-in/stats.json]
    #[arg(long, value_name = "FILE")]
    pub stats_store: Option<PathBuf>,

    /// Do not post commit statuses
    #[arg(long)]
    pub no_status: bool,

    /// Print the diff report as JSON
    #[arg(long)]
    pub json: bool,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

impl RunArgs {
    /// Merge flags with the config file into workflow settings
    pub fn into_settings(self, working_dir: &Path, config: WeighInConfig) -> Result<WeighInSettings> {
        let manifest = self
            .manifest
            .or(config.manifest)
            .context("Missing manifest: pass --manifest or set `manifest` in .weigh-in.toml")?;
        let output_directory = self
            .output_directory
            .or(config.output_directory)
            .unwrap_or_else(|| {
                manifest
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default()
            });
        let artifacts_directory = self.artifacts_directory.or(config.artifacts_directory).context(
            "Missing artifacts directory: pass --artifacts-directory or set CIRCLE_ARTIFACTS",
        )?;

        let mut settings = WeighInSettings::new(
            working_dir.join(manifest),
            working_dir.join(output_directory),
            working_dir.join(artifacts_directory),
        );

        if let Some(path) = self.asset_stats_path.or(config.asset_stats_path) {
            settings.asset_stats_path = path;
        }
        if let Some(label) = self.label.or(config.label) {
            settings.label = label;
        }
        settings.project_name = self.project_name.or(config.project_name);
        settings.failure_thresholds = match self.failure_thresholds {
            Some(raw) => parse_thresholds_flag(&raw)?,
            None => config
                .failure_thresholds
                .unwrap_or_else(|| Value::Array(Vec::new())),
        };
        settings.pull_request_id = self.pull_request.as_deref().and_then(parse_pull_request_id);
        settings.build_sha = self.build_sha.filter(|sha| !sha.is_empty());
        settings.build_url = self.build_url.filter(|url| !url.is_empty());
        settings.stats_store = stats_store_path(
            working_dir,
            self.stats_store.or(config.stats_store).as_deref(),
        );
        settings.post_status = !self.no_status;

        Ok(settings)
    }
}

fn parse_thresholds_flag(raw: &str) -> Result<Value, WeighInError> {
    serde_json::from_str(raw).map_err(|e| WeighInError::InvalidFailureThresholdOption {
        message: format!("--failure-thresholds is not valid JSON: {}", e),
    })
}

/// Execute the weigh-in
///
/// Returns the exit code: 1 when a threshold fails, 0 otherwise.
pub async fn cmd_run(args: RunArgs) -> Result<i32> {
    let working_dir = std::env::current_dir().context("Failed to determine working directory")?;
    let config = ConfigLoader::load(&working_dir)?;

    let json = args.json;
    let env = Arc::new(Environment {
        request: Arc::new(ReqwestSender::new(Duration::from_secs(args.timeout))?),
        fs: Arc::new(RealFileSystem),
        github_api_token: args.github_token.clone(),
        circle_api_token: args.circle_token.clone(),
        repo_owner: args.repo_owner.clone(),
        repo_name: args.repo_name.clone(),
    });
    let settings = args.into_settings(&working_dir, config)?;

    log::debug!("Weighing in {:?} with {:?}", env, settings);

    match WeighInWorkflow::new(settings).execute(env).await? {
        RunOutcome::Completed(comparison) => {
            if json {
                comparison.report.print();
            } else {
                print_diff_report(&comparison.report);
            }
            Ok(comparison.report.exit_code())
        }
        RunOutcome::Skipped => {
            if !json {
                println!("{}Asset stats written; nothing to compare against", INFO);
            }
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        run: RunArgs,
    }

    fn parse(extra: &[&str]) -> RunArgs {
        let mut argv = vec![
            "test",
            "--repo-owner",
            "acme",
            "--repo-name",
            "web",
            "--github-token",
            "gh",
            "--circle-token",
            "cc",
        ];
        argv.extend_from_slice(extra);
        TestCli::try_parse_from(argv).unwrap().run
    }

    #[test]
    fn test_flags_are_resolved_against_working_dir() {
        let args = parse(&[
            "--manifest",
            "dist/manifest.json",
            "--artifacts-directory",
            "artifacts",
            "--pull-request",
            "https://github.com/acme/web/pull/45",
            "--build-sha",
            "abc123",
        ]);

        let settings = args
            .into_settings(Path::new("/work"), WeighInConfig::default())
            .unwrap();

        assert_eq!(settings.manifest_path, Path::new("/work/dist/manifest.json"));
        assert_eq!(settings.output_directory, Path::new("/work/dist"));
        assert_eq!(settings.artifacts_directory, Path::new("/work/artifacts"));
        assert_eq!(settings.pull_request_id.as_deref(), Some("45"));
        assert_eq!(settings.build_sha.as_deref(), Some("abc123"));
        assert_eq!(settings.stats_store, Path::new("/work/.weigh-in/stats.json"));
        assert!(settings.post_status);
    }

    #[test]
    fn test_config_file_supplies_defaults() {
        let config = WeighInConfig {
            manifest: Some(PathBuf::from("build/manifest.json")),
            artifacts_directory: Some(PathBuf::from("out")),
            label: Some("bundle".to_string()),
            failure_thresholds: Some(json!([{"targets": ".js", "maxSize": 10}])),
            ..WeighInConfig::default()
        };

        let settings = parse(&["--label", "sizes"])
            .into_settings(Path::new("/work"), config)
            .unwrap();

        assert_eq!(settings.manifest_path, Path::new("/work/build/manifest.json"));
        assert_eq!(settings.label, "sizes");
        assert_eq!(settings.failure_thresholds, json!([{"targets": ".js", "maxSize": 10}]));
    }

    #[test]
    fn test_threshold_flag_overrides_config() {
        let config = WeighInConfig {
            failure_thresholds: Some(json!([{"targets": ".js", "maxSize": 10}])),
            ..WeighInConfig::default()
        };
        let settings = parse(&[
            "--manifest",
            "m.json",
            "--artifacts-directory",
            "a",
            "--failure-thresholds",
            r#"[{"targets": "app.js", "maxSize": 50}]"#,
        ])
        .into_settings(Path::new("/work"), config)
        .unwrap();

        assert_eq!(
            settings.failure_thresholds,
            json!([{"targets": "app.js", "maxSize": 50}])
        );
    }

    #[test]
    fn test_invalid_threshold_json_is_option_error() {
        let err = parse(&[
            "--manifest",
            "m.json",
            "--artifacts-directory",
            "a",
            "--failure-thresholds",
            "[{",
        ])
        .into_settings(Path::new("/work"), WeighInConfig::default())
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<WeighInError>(),
            Some(WeighInError::InvalidFailureThresholdOption { .. })
        ));
    }

    #[test]
    fn test_missing_manifest_is_reported() {
        let err = parse(&["--artifacts-directory", "a"])
            .into_settings(Path::new("/work"), WeighInConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("--manifest"));
    }

    #[test]
    fn test_empty_pull_request_means_no_pull_request() {
        let settings = parse(&[
            "--manifest",
            "m.json",
            "--artifacts-directory",
            "a",
            "--pull-request",
            "",
            "--no-status",
        ])
        .into_settings(Path::new("/work"), WeighInConfig::default())
        .unwrap();

        assert_eq!(settings.pull_request_id, None);
        assert!(!settings.post_status);
    }
}
