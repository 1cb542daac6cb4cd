//! Failure classification for remote requests

use thiserror::Error;

/// Errors produced by the GitHub and CircleCI adapters
///
/// URLs carried here never include a query string.
#[derive(Error, Debug)]
pub enum RequestError {
    /// The request could not be sent or no response arrived
    #[error("GitHub request to {url} failed: {reason}")]
    GitHubFetch {
        /// Requested URL
        url: String,
        /// Transport failure description
        reason: String,
    },

    /// GitHub answered 401 or 403
    #[error("GitHub rejected the API token for {url}: {status_text}")]
    GitHubAuthorization {
        /// Requested URL
        url: String,
        /// Reason phrase of the response
        status_text: String,
    },

    /// GitHub answered with any other non-2xx status
    #[error("Invalid response from GitHub for {url}: {status_text}")]
    GitHubInvalidResponse {
        /// Requested URL
        url: String,
        /// Reason phrase of the response
        status_text: String,
    },

    /// The request could not be sent or no response arrived
    #[error("CircleCI request to {url} failed: {reason}")]
    CircleCiFetch {
        /// Requested URL
        url: String,
        /// Transport failure description
        reason: String,
    },

    /// CircleCI answered with a non-2xx status
    #[error("Invalid response from CircleCI for {url}: {status_text}")]
    CircleCiInvalidResponse {
        /// Requested URL
        url: String,
        /// Reason phrase of the response
        status_text: String,
    },

    /// A 2xx response whose body is not JSON
    #[error("Malformed JSON body from {url}")]
    MalformedBody {
        /// Requested URL
        url: String,
        #[source]
        /// Parse error
        source: serde_json::Error,
    },
}

impl RequestError {
    /// Whether the failure is an authorization problem
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::GitHubAuthorization { .. })
    }

    /// The (redacted) URL the failed request targeted
    pub fn url(&self) -> &str {
        match self {
            Self::GitHubFetch { url, .. }
            | Self::GitHubAuthorization { url, .. }
            | Self::GitHubInvalidResponse { url, .. }
            | Self::CircleCiFetch { url, .. }
            | Self::CircleCiInvalidResponse { url, .. }
            | Self::MalformedBody { url, .. } => url,
        }
    }
}
