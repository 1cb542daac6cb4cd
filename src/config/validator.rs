//! Failure threshold shape validation
//!
//! Thresholds arrive as untyped JSON (CLI flag or config file), so their
//! shape is checked field by field before deserialization. Every problem is
//! reported with the path of the offending field; unknown keys are only
//! warnings.

use super::threshold::{byte_count, FailureThreshold};
use crate::error::WeighInError;
use serde_json::{Map, Value};
use std::fmt;

const ROOT: &str = "failureThresholds";
const KNOWN_KEYS: [&str; 3] = ["targets", "maxSize", "strategy"];
const STRATEGIES: [&str; 1] = ["any"];

/// Validation severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    /// Warning - should be addressed but not blocking
    Warning,
    /// Error - must be fixed
    Error,
}

/// A validation issue found in the threshold configuration
///
/// # Examples
///
/// ```
/// use circleci_weigh_in::config::validator::{ValidationIssue, ValidationSeverity};
///
/// let issue = ValidationIssue::error("failureThresholds[0]", "should have required property 'maxSize'");
/// assert_eq!(issue.severity, ValidationSeverity::Error);
/// assert_eq!(
///     issue.to_string(),
///     "failureThresholds[0] should have required property 'maxSize'"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Severity level
    pub severity: ValidationSeverity,
    /// Path of the field that has the issue
    pub field: String,
    /// Description of the issue
    pub message: String,
}

impl ValidationIssue {
    /// Create a new validation issue
    pub fn new(
        severity: ValidationSeverity,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an error issue
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationSeverity::Error, field, message)
    }

    /// Create a warning issue
    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationSeverity::Warning, field, message)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Result of threshold validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether validation passed (no errors)
    pub valid: bool,
    /// Issues found during validation
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn success() -> Self {
        Self {
            valid: true,
            issues: Vec::new(),
        }
    }

    /// Add an issue
    pub fn add_issue(&mut self, issue: ValidationIssue) {
        if issue.severity == ValidationSeverity::Error {
            self.valid = false;
        }
        self.issues.push(issue);
    }

    /// Get only errors
    pub fn errors(&self) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Error)
            .collect()
    }

    /// Get only warnings
    pub fn warnings(&self) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Warning)
            .collect()
    }
}

/// Check the shape of a raw threshold list
pub fn validate_failure_thresholds(value: &Value) -> ValidationResult {
    let mut result = ValidationResult::success();

    let Some(entries) = value.as_array() else {
        result.add_issue(ValidationIssue::error(ROOT, "should be array"));
        return result;
    };

    for (index, entry) in entries.iter().enumerate() {
        let field = format!("{}[{}]", ROOT, index);
        match entry.as_object() {
            Some(object) => validate_entry(&field, object, &mut result),
            None => result.add_issue(ValidationIssue::error(field, "should be object")),
        }
    }

    result
}

fn validate_entry(field: &str, object: &Map<String, Value>, result: &mut ValidationResult) {
    match object.get("targets") {
        None => result.add_issue(ValidationIssue::error(
            field,
            "should have required property 'targets'",
        )),
        Some(Value::String(_)) => {}
        Some(Value::Array(targets)) if targets.is_empty() => result.add_issue(
            ValidationIssue::error(
                format!("{}.targets", field),
                "should NOT have fewer than 1 items",
            ),
        ),
        Some(Value::Array(targets)) if targets.iter().all(Value::is_string) => {}
        Some(_) => result.add_issue(ValidationIssue::error(
            format!("{}.targets", field),
            "should be string or array of strings",
        )),
    }

    match object.get("maxSize") {
        None => result.add_issue(ValidationIssue::error(
            field,
            "should have required property 'maxSize'",
        )),
        Some(size) if byte_count(size).is_some() => {}
        Some(_) => result.add_issue(ValidationIssue::error(
            format!("{}.maxSize", field),
            "should be a non-negative integer",
        )),
    }

    if let Some(strategy) = object.get("strategy") {
        if !strategy.as_str().is_some_and(|s| STRATEGIES.contains(&s)) {
            result.add_issue(ValidationIssue::error(
                format!("{}.strategy", field),
                format!(
                    "should be equal to one of the allowed values: {}",
                    STRATEGIES.join(", ")
                ),
            ));
        }
    }

    for key in object.keys() {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            result.add_issue(ValidationIssue::warning(
                field,
                format!("has unknown property '{}'", key),
            ));
        }
    }
}

/// Validate and deserialize a raw threshold list
///
/// Warnings are logged; any error rejects the whole list.
///
/// # Examples
///
/// ```
/// use circleci_weigh_in::config::validator::parse_failure_thresholds;
/// use serde_json::json;
///
/// let thresholds = parse_failure_thresholds(&json!([{"targets": "app.js", "maxSize": 50}])).unwrap();
/// assert_eq!(thresholds[0].max_size, 50);
///
/// let err = parse_failure_thresholds(&json!([{"targets": ".js"}])).unwrap_err();
/// assert!(err.to_string().contains("failureThresholds[0] should have required property 'maxSize'"));
/// ```
pub fn parse_failure_thresholds(value: &Value) -> Result<Vec<FailureThreshold>, WeighInError> {
    let result = validate_failure_thresholds(value);

    for warning in result.warnings() {
        log::warn!("{}", warning);
    }

    if !result.valid {
        let message = result
            .errors()
            .iter()
            .map(|issue| issue.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(WeighInError::InvalidFailureThresholdOption { message });
    }

    serde_json::from_value(value.clone()).map_err(|e| WeighInError::InvalidFailureThresholdOption {
        message: e.to_string(),
    })
}
