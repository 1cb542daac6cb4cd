//! Base branch build resolution
//!
//! Walks from a pull request to the asset size report stored as an artifact
//! of the most recent successful CircleCI build of the PR's base branch:
//!
//! 1. GitHub: pull request → base branch name
//! 2. CircleCI: recent builds of the base branch (only the newest is used)
//! 3. CircleCI: artifacts of the chosen build → first path matching the pattern
//! 4. CircleCI: artifact body
//!
//! Expected dead ends (no builds, no artifact) are returned as
//! `Ok(Err(BaseBuildError))` so callers can decide whether to recover.

use crate::effect::Effect;
use crate::env::{HasCircleToken, HasGitHubToken, HasRepository, HasRequestSender};
use crate::error::WeighInError;
use crate::remote::{circleci, github, RequestDescriptor};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// CircleCI status of a successful build
pub const SUCCESS_STATUS: &str = "success";

/// Expected reasons a base branch cannot provide a size report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BaseBuildError {
    /// CircleCI has no builds for the base branch
    #[error("No recent builds found for the base branch: {branch}!")]
    NoRecentBuilds {
        /// Base branch
        branch: String,
    },

    /// The newest build failed and names no earlier successful build
    #[error(
        "Latest build of the base branch {branch} (build number: {build_num}) did not succeed and has no previous successful build"
    )]
    NoPreviousSuccessfulBuild {
        /// Base branch
        branch: String,
        /// Number of the unsuccessful build
        build_num: String,
    },

    /// The chosen build stored no artifact matching the pattern
    #[error("No bundle size artifact found for latest build of: {branch}. Build number: {build_num}")]
    NoAssetStatsArtifact {
        /// Base branch
        branch: String,
        /// Build whose artifacts were searched
        build_num: String,
    },
}

/// Pull request as returned by GitHub (camelized)
#[derive(Debug, Clone, Deserialize)]
pub struct PrResource {
    /// Base of the pull request
    pub base: PrBase,
}

/// Base of a pull request
#[derive(Debug, Clone, Deserialize)]
pub struct PrBase {
    /// Base branch name
    #[serde(rename = "ref")]
    pub git_ref: String,
}

/// One entry of a CircleCI build history
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResource {
    /// Build number
    #[serde(deserialize_with = "build_number")]
    pub build_num: String,
    /// Build status ("success", "failed", "running", ...)
    #[serde(default)]
    pub status: String,
    /// Most recent successful build before this one
    #[serde(default)]
    pub previous_successful_build: Option<PreviousBuild>,
}

/// Back-reference from a build to an earlier successful build
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousBuild {
    /// Build number
    #[serde(deserialize_with = "build_number")]
    pub build_num: String,
}

/// A stored build artifact
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactResource {
    /// Path of the artifact inside the build container
    pub path: String,
    /// Download URL
    pub url: String,
}

/// CircleCI reports build numbers as integers; fixtures often use strings
fn build_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BuildNumber {
        Number(u64),
        Text(String),
    }

    Ok(match BuildNumber::deserialize(deserializer)? {
        BuildNumber::Number(n) => n.to_string(),
        BuildNumber::Text(s) => s,
    })
}

/// Input of the resolver
#[derive(Debug, Clone)]
pub struct BaseBuildQuery {
    /// Pull request number
    pub pull_request_id: String,
    /// Compiled artifact path pattern (anchored at the end)
    pub artifact_pattern: ArtifactPattern,
}

/// Suffix pattern matched against artifact paths
#[derive(Debug, Clone)]
pub struct ArtifactPattern {
    regex: Regex,
}

impl ArtifactPattern {
    /// Compile `<pattern>$`
    ///
    /// # Examples
    ///
    /// ```
    /// use circleci_weigh_in::cicd::base_build::ArtifactPattern;
    ///
    /// let pattern = ArtifactPattern::new("dist/app.js").unwrap();
    /// assert!(pattern.matches("home/ubuntu/project/dist/app.js"));
    /// assert!(!pattern.matches("dist/app.js.map"));
    /// ```
    pub fn new(pattern: &str) -> Result<Self, WeighInError> {
        Regex::new(&format!("{}$", pattern))
            .map(|regex| Self { regex })
            .map_err(|source| WeighInError::InvalidArtifactPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Whether an artifact path ends with the pattern
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Pick the build whose artifacts hold the base report
///
/// Only the newest history entry is considered: its own number when it
/// succeeded, otherwise its previous successful build.
pub fn select_build(branch: &str, builds: &[BuildResource]) -> Result<String, BaseBuildError> {
    let latest = builds.first().ok_or_else(|| BaseBuildError::NoRecentBuilds {
        branch: branch.to_string(),
    })?;

    if latest.status == SUCCESS_STATUS {
        return Ok(latest.build_num.clone());
    }

    latest
        .previous_successful_build
        .as_ref()
        .map(|previous| previous.build_num.clone())
        .ok_or_else(|| BaseBuildError::NoPreviousSuccessfulBuild {
            branch: branch.to_string(),
            build_num: latest.build_num.clone(),
        })
}

/// First artifact (in listing order) whose path matches the pattern
pub fn find_artifact<'a>(
    artifacts: &'a [ArtifactResource],
    pattern: &ArtifactPattern,
) -> Option<&'a ArtifactResource> {
    artifacts
        .iter()
        .find(|artifact| pattern.matches(&artifact.path))
}

/// Retrieve the raw asset size report of the base branch's last successful build
pub fn retrieve_base_asset_stats<E>(
    query: BaseBuildQuery,
) -> Effect<E, Result<Value, BaseBuildError>, WeighInError>
where
    E: HasRequestSender + HasGitHubToken + HasCircleToken + HasRepository + Send + Sync + 'static,
{
    let query = Arc::new(query);

    Effect::ask().chain(move |env: Arc<E>| {
        let project = env.repo_project_path();
        let query = Arc::clone(&query);

        get_base_branch(&project, &query.pull_request_id).chain(move |branch| {
            let project = project.clone();
            let query = Arc::clone(&query);

            get_recent_builds(&project, &branch).chain(move |builds| {
                let build_num = match select_build(&branch, &builds) {
                    Ok(build_num) => build_num,
                    Err(err) => return Effect::of(Err(err)),
                };
                log::info!(
                    "Comparing against build {} of base branch {}",
                    build_num,
                    branch
                );

                let branch = branch.clone();
                let query = Arc::clone(&query);
                get_build_artifacts(&project, &build_num).chain(move |artifacts| {
                    match find_artifact(&artifacts, &query.artifact_pattern) {
                        Some(artifact) => get_artifact_body(&artifact.url).map(Ok),
                        None => Effect::of(Err(BaseBuildError::NoAssetStatsArtifact {
                            branch: branch.clone(),
                            build_num: build_num.clone(),
                        })),
                    }
                })
            })
        })
    })
}

fn get_base_branch<E>(project: &str, pull_request_id: &str) -> Effect<E, String, WeighInError>
where
    E: HasRequestSender + HasGitHubToken + Send + Sync + 'static,
{
    github::request(
        RequestDescriptor::path(format!("repos/{}/pulls", project)).segment(pull_request_id),
    )
    .try_map(|body| decode::<PrResource>(body, "pull request"))
    .map(|pr| pr.base.git_ref)
}

fn get_recent_builds<E>(project: &str, branch: &str) -> Effect<E, Vec<BuildResource>, WeighInError>
where
    E: HasRequestSender + HasCircleToken + Send + Sync + 'static,
{
    circleci::request(
        RequestDescriptor::path(format!("project/github/{}/tree", project)).segment(branch),
    )
    .try_map(|body| decode(body, "build history"))
}

fn get_build_artifacts<E>(
    project: &str,
    build_num: &str,
) -> Effect<E, Vec<ArtifactResource>, WeighInError>
where
    E: HasRequestSender + HasCircleToken + Send + Sync + 'static,
{
    circleci::request(
        RequestDescriptor::path(format!("project/github/{}", project))
            .segment(build_num)
            .segment("artifacts"),
    )
    .try_map(|body| decode(body, "artifact list"))
}

fn get_artifact_body<E>(url: &str) -> Effect<E, Value, WeighInError>
where
    E: HasRequestSender + HasCircleToken + Send + Sync + 'static,
{
    circleci::request(RequestDescriptor::url(url).raw())
}

fn decode<T: DeserializeOwned>(body: Value, context: &str) -> Result<T, WeighInError> {
    serde_json::from_value(body).map_err(|source| WeighInError::MalformedReport {
        context: context.to_string(),
        source,
    })
}
