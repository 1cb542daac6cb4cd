//! Configuration for circleci-weigh-in
//!
//! This module provides:
//! - .weigh-in.toml config file support
//! - Failure threshold types and shape validation

pub mod file;
pub mod loader;
pub mod threshold;
pub mod validator;

pub use file::{WeighInConfig, CONFIG_FILE_NAME};
pub use loader::ConfigLoader;
pub use threshold::{FailureThreshold, Strategy, Targets};
pub use validator::{
    parse_failure_thresholds, validate_failure_thresholds, ValidationIssue, ValidationResult,
    ValidationSeverity,
};
