//! Enhanced error types with contextual suggestions
//!
//! Provides structured error types that include:
//! - Actionable error messages
//! - Suggested fixes and recovery actions
//! - Proper exit codes for CI/CD
//!
//! # Examples
//!
//! ```
//! use circleci_weigh_in::error::WeighInError;
//!
//! let err = WeighInError::InvalidFailureThresholdTarget {
//!     target: ".css".to_string(),
//! };
//! assert_eq!(err.exit_code(), 78);
//! assert!(err.suggestion().is_some());
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::cicd::base_build::BaseBuildError;
use crate::remote::RequestError;

/// Every failure a weigh-in run can end with
#[derive(Error, Debug)]
pub enum WeighInError {
    /// The build is not attached to an open pull request
    #[error("No open pull request found for this build. Skipping asset size comparison.")]
    NoOpenPullRequest,

    /// The failure threshold configuration does not have the expected shape
    #[error("Invalid failure threshold option: {message}")]
    InvalidFailureThresholdOption {
        /// Description naming the offending field
        message: String,
    },

    /// A failure threshold target matches no asset
    #[error("Invalid failure threshold target: \"{target}\" does not match any asset")]
    InvalidFailureThresholdTarget {
        /// Unmatched target
        target: String,
    },

    /// The asset stats artifact pattern is not a valid regular expression
    #[error("Invalid asset stats artifact pattern: '{pattern}'")]
    InvalidArtifactPattern {
        /// Pattern as configured
        pattern: String,
        #[source]
        /// Regex compilation error
        source: regex::Error,
    },

    /// The bundler manifest could not be read or parsed
    #[error("Unable to read manifest {path}: {reason}")]
    ManifestRead {
        /// Manifest path
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// A size report (local or downloaded) is not valid JSON of the right shape
    #[error("Malformed {context}")]
    MalformedReport {
        /// Which report
        context: String,
        #[source]
        /// Parse error
        source: serde_json::Error,
    },

    /// Generic I/O error with context
    #[error("I/O error: {context}")]
    Io {
        /// Context about where the error occurred
        context: String,
        #[source]
        /// IO error source
        source: std::io::Error,
    },

    /// Remote request failure
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Base branch build could not provide a size report
    #[error(transparent)]
    BaseBuild(#[from] BaseBuildError),
}

impl WeighInError {
    /// Whether the run should be treated as a successful no-op
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::NoOpenPullRequest)
    }

    /// Get actionable suggestion for resolving this error.
    ///
    /// Returns a user-friendly suggestion for how to fix the error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NoOpenPullRequest => None,
            Self::InvalidFailureThresholdOption { .. } => Some(
                "Each failure threshold needs 'targets' (string or list) and a numeric 'maxSize'"
                    .to_string(),
            ),
            Self::InvalidFailureThresholdTarget { target } => Some(format!(
                "Use an asset name from the manifest or an extension such as '.js' instead of '{}'",
                target
            )),
            Self::InvalidArtifactPattern { .. } => Some(
                "Escape regex metacharacters in --asset-stats-path or use a plain file name"
                    .to_string(),
            ),
            Self::ManifestRead { path, .. } => Some(format!(
                "Ensure the build wrote {} before running circleci-weigh-in",
                path.display()
            )),
            Self::MalformedReport { .. } => Some(
                "Delete the stored stats or re-run the base branch build to regenerate them"
                    .to_string(),
            ),
            Self::Io { context, .. } => Some(format!(
                "Check file permissions and that {} is accessible",
                context
            )),
            Self::Request(e) if e.is_authorization() => {
                Some("Check that GITHUB_API_TOKEN is set and has the 'repo:status' scope".to_string())
            }
            Self::Request(_) => Some(
                "Check network access and that GITHUB_API_TOKEN / CIRCLE_API_TOKEN are valid"
                    .to_string(),
            ),
            Self::BaseBuild(_) => Some(
                "Make sure the base branch builds on CircleCI and stores asset-stats.json as an artifact"
                    .to_string(),
            ),
        }
    }

    /// Get appropriate exit code for this error.
    ///
    /// Returns Unix-style exit codes based on the error type, following sysexits.h conventions.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoOpenPullRequest => 0,
            Self::InvalidFailureThresholdOption { .. } => 78, // EX_CONFIG
            Self::InvalidFailureThresholdTarget { .. } => 78, // EX_CONFIG
            Self::InvalidArtifactPattern { .. } => 78,        // EX_CONFIG
            Self::ManifestRead { .. } => 66,                  // EX_NOINPUT
            Self::MalformedReport { .. } => 65,               // EX_DATAERR
            Self::Io { .. } => 74,                            // EX_IOERR
            Self::Request(e) if e.is_authorization() => 77,   // EX_NOPERM
            Self::Request(RequestError::MalformedBody { .. }) => 65,
            Self::Request(_) => 69,  // EX_UNAVAILABLE
            Self::BaseBuild(_) => 66, // EX_NOINPUT
        }
    }
}

/// Error formatter with colors and structured output
pub struct ErrorFormatter;

impl ErrorFormatter {
    /// Format error with its cause chain and suggestion
    pub fn format(error: &anyhow::Error) -> String {
        use console::style;

        let mut output = String::new();

        // Main error message
        output.push_str(&format!("{} {}\n", style("error:").red().bold(), error));

        // Error chain (caused by)
        let mut source = error.source();
        let mut indent = 1;
        while let Some(err) = source {
            output.push_str(&format!(
                "{}{} {}\n",
                "  ".repeat(indent),
                style("caused by:").yellow(),
                err
            ));
            source = err.source();
            indent += 1;
        }

        if let Some(suggestion) = error
            .downcast_ref::<WeighInError>()
            .and_then(WeighInError::suggestion)
        {
            output.push_str(&format!(
                "\n{} {}\n",
                style("help:").cyan().bold(),
                suggestion
            ));
        }

        output
    }

    /// Get exit code from error
    pub fn exit_code(error: &anyhow::Error) -> i32 {
        if let Some(err) = error.downcast_ref::<WeighInError>() {
            err.exit_code()
        } else {
            1 // Generic error
        }
    }
}
