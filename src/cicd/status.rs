//! GitHub commit status payloads

use super::budget::ThresholdFailure;
use super::diff::AssetDiffs;
use crate::effect::Effect;
use crate::env::{HasGitHubToken, HasRepository, HasRequestSender};
use crate::error::WeighInError;
use crate::fmt::{compact_and_join, format_signed_percent, format_signed_size, format_size, truncate};
use crate::infra::Method;
use crate::remote::{github, RequestDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// GitHub limits status descriptions to 140 characters
pub const MAX_DESCRIPTION_LENGTH: usize = 140;

const DESCRIPTION_SEPARATOR: &str = " \n";

/// Commit status state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    /// All thresholds hold
    Success,
    /// At least one threshold failed
    Failure,
    /// Weigh-in in progress
    Pending,
    /// Weigh-in could not complete
    Error,
}

/// Inputs of the final status
#[derive(Debug, Clone, Copy)]
pub struct StatusInput<'a> {
    /// Diffs of the current build
    pub asset_diffs: &'a AssetDiffs,
    /// Violated thresholds
    pub threshold_failures: &'a [ThresholdFailure],
    /// Status context
    pub label: &'a str,
    /// Link shown next to the status
    pub target_url: Option<&'a str>,
}

/// Body of `POST repos/{owner}/{repo}/statuses/{sha}`
///
/// Serialized camelCase; the GitHub adapter decamelizes it on the way out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    /// State
    pub state: StatusState,
    /// Context (the configured label)
    pub context: String,
    /// Summary, at most 140 characters
    pub description: String,
    /// Link to the CI build, empty when unknown
    pub target_url: String,
}

impl StatusPayload {
    /// Final status of a completed weigh-in
    ///
    /// # Examples
    ///
    /// ```
    /// use circleci_weigh_in::cicd::diff::{AssetDiff, AssetDiffs};
    /// use circleci_weigh_in::cicd::status::{StatusInput, StatusPayload, StatusState};
    ///
    /// let diffs = AssetDiffs::from([("vendor.js".to_string(), AssetDiff::between(3497, 4336))]);
    /// let payload = StatusPayload::from_results(StatusInput {
    ///     asset_diffs: &diffs,
    ///     threshold_failures: &[],
    ///     label: "asset sizes",
    ///     target_url: None,
    /// });
    ///
    /// assert_eq!(payload.state, StatusState::Success);
    /// assert_eq!(payload.description, "vendor.js: 4.23KB (+839B, +23.99%)");
    /// assert_eq!(payload.target_url, "");
    /// ```
    pub fn from_results(input: StatusInput<'_>) -> Self {
        let (state, description) = if input.threshold_failures.is_empty() {
            (StatusState::Success, describe_diffs(input.asset_diffs))
        } else {
            (
                StatusState::Failure,
                compact_and_join(
                    DESCRIPTION_SEPARATOR,
                    input.threshold_failures.iter().map(|f| f.message.as_str()),
                ),
            )
        };

        Self::new(state, input.label, input.target_url, &description)
    }

    /// Status posted before the weigh-in starts
    pub fn pending(label: &str, target_url: Option<&str>) -> Self {
        Self::new(
            StatusState::Pending,
            label,
            target_url,
            "Calculating asset sizes...",
        )
    }

    /// Status posted when the weigh-in fails with an error
    pub fn error(label: &str, target_url: Option<&str>, message: &str) -> Self {
        Self::new(StatusState::Error, label, target_url, message)
    }

    fn new(state: StatusState, label: &str, target_url: Option<&str>, description: &str) -> Self {
        Self {
            state,
            context: label.to_string(),
            description: truncate(description, MAX_DESCRIPTION_LENGTH),
            target_url: target_url.unwrap_or_default().to_string(),
        }
    }

    fn to_body(&self) -> Value {
        json!({
            "state": self.state,
            "context": self.context,
            "description": self.description,
            "targetUrl": self.target_url,
        })
    }
}

fn describe_diffs(asset_diffs: &AssetDiffs) -> String {
    compact_and_join(
        DESCRIPTION_SEPARATOR,
        asset_diffs.iter().map(|(asset_id, diff)| {
            format!(
                "{}: {} ({}, {})",
                asset_id,
                format_size(diff.current),
                format_signed_size(diff.difference),
                format_signed_percent(diff.percent_change)
            )
        }),
    )
}

/// Post `payload` as the commit status of `sha`
pub fn post_status<E>(sha: &str, payload: &StatusPayload) -> Effect<E, Value, WeighInError>
where
    E: HasRequestSender + HasGitHubToken + HasRepository + Send + Sync + 'static,
{
    let sha = sha.to_string();
    let body = payload.to_body();
    log::debug!("Posting {:?} status for {}", payload.state, sha);

    Effect::ask().chain(move |env: Arc<E>| {
        github::request(
            RequestDescriptor::path(format!("repos/{}/statuses", env.repo_project_path()))
                .segment(sha.as_str())
            .method(Method::Post)
            .json_body(body.clone()),
        )
    })
}
