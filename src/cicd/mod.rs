//! CI/CD integration module
//!
//! Provides:
//! - Base branch build resolution through GitHub and CircleCI
//! - Per-asset size diffs and failure threshold enforcement
//! - Commit status payloads
//! - Artifact files and the multi-project stats store

pub mod base_build;
pub mod budget;
pub mod diff;
pub mod display;
pub mod history;
pub mod output;
pub mod status;

pub use base_build::{retrieve_base_asset_stats, BaseBuildError, BaseBuildQuery};
pub use budget::{BudgetChecker, ThresholdFailure};
pub use diff::{diff_reports, AssetDiff, AssetDiffs};
pub use history::StatsStore;
pub use output::{ArtifactWriter, DiffReport};
pub use status::{post_status, StatusInput, StatusPayload, StatusState};
