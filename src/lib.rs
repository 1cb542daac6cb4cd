#![warn(missing_docs)]
#![warn(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! circleci-weigh-in library
//!
//! Measures the assets a bundler emitted, compares them with the assets of
//! the latest base branch build on CircleCI, enforces failure thresholds and
//! reports the outcome as a GitHub commit status.
//!
//! Every remote call runs through an [`effect::Effect`] over an injected
//! [`env::Environment`], so the whole weigh-in can be driven with a fake
//! request sender and filesystem.
//!
//! # Basic Example
//!
//! Diffing two reports and checking a threshold:
//!
//! ```
//! use circleci_weigh_in::assets::{AssetSizeReport, AssetStat};
//! use circleci_weigh_in::cicd::{diff_reports, BudgetChecker};
//! use circleci_weigh_in::config::FailureThreshold;
//!
//! let stat = |size| AssetStat {
//!     filename: "app.js".to_string(),
//!     path: "dist/app.js".to_string(),
//!     size,
//! };
//! let base = AssetSizeReport::from([("app.js".to_string(), stat(1000))]);
//! let current = AssetSizeReport::from([("app.js".to_string(), stat(1500))]);
//!
//! let diffs = diff_reports(&base, &current);
//! assert_eq!(diffs["app.js"].difference, 500);
//!
//! let failures = BudgetChecker::new(&current)
//!     .evaluate(&[FailureThreshold::new(".js", 1200)])
//!     .unwrap();
//! assert_eq!(failures.len(), 1);
//! ```
//!
//! # Advanced Example: Commit Status
//!
//! ```
//! use circleci_weigh_in::cicd::{AssetDiff, AssetDiffs, StatusInput, StatusPayload, StatusState};
//!
//! let diffs = AssetDiffs::from([("app.js".to_string(), AssetDiff::between(2048, 1024))]);
//! let status = StatusPayload::from_results(StatusInput {
//!     asset_diffs: &diffs,
//!     threshold_failures: &[],
//!     label: "Asset Sizes",
//!     target_url: Some("https://circleci.com/gh/acme/web/42"),
//! });
//!
//! assert_eq!(status.state, StatusState::Success);
//! assert_eq!(status.description, "app.js: 1.00KB (-1.00KB, -50.00%)");
//! ```

/// Asset size reports, manifests and measurement
pub mod assets;
/// CI/CD integration: base builds, diffs, thresholds and statuses
pub mod cicd;
/// Command handlers for CLI operations
pub mod cmd;
/// Configuration file and failure threshold validation
pub mod config;
/// Deferred computations over an injected environment
pub mod effect;
/// Capabilities of the run environment
pub mod env;
/// Error types with contextual suggestions
pub mod error;
/// Shared formatting utilities
pub mod fmt;
/// Infrastructure traits for filesystem and HTTP
pub mod infra;
/// GitHub and CircleCI API adapters
pub mod remote;
