//! Common test utilities and helpers
//!
//! This module provides shared functionality for integration tests:
//! - A scripted request sender standing in for GitHub and CircleCI
//! - Project fixtures with a manifest and emitted assets on disk
//!
//! # Usage
//!
//! ```rust,no_run
//! mod common;
//! use common::fixtures::Project;
//! use common::scripted::ScriptedSender;
//!
//! let project = Project::new(&[("app.js", "app.3f2a.js", 1200)]);
//! let sender = ScriptedSender::new().on_get("pulls/45", 200, json!({"base": {"ref": "main"}}));
//! let env = project.env(sender.clone());
//! ```

pub mod fixtures;
pub mod scripted;

/// Owner of the repository every fixture environment points at
pub const OWNER: &str = "acme";
/// Name of the repository every fixture environment points at
pub const REPO: &str = "web";
/// GitHub token of the fixture environment
pub const GITHUB_TOKEN: &str = "gh-token";
/// CircleCI token of the fixture environment
pub const CIRCLE_TOKEN: &str = "circle-token";
