//! Run environment threaded through every effect
//!
//! Adapters and collaborators declare the capabilities they need as trait
//! bounds (`HasRequestSender + HasGitHubToken`, ...) instead of depending on
//! the concrete [`Environment`]. Tests supply the same struct with fake I/O.

use crate::infra::{FileSystem, RequestSender};
use std::fmt;
use std::sync::Arc;

/// Access to the injected request sender
pub trait HasRequestSender {
    /// The request sender used for every remote call
    fn request_sender(&self) -> &dyn RequestSender;
}

/// Access to the GitHub API token
pub trait HasGitHubToken {
    /// GitHub API token
    fn github_api_token(&self) -> &str;
}

/// Access to the CircleCI API token
pub trait HasCircleToken {
    /// CircleCI API token
    fn circle_api_token(&self) -> &str;
}

/// Access to the repository coordinates
pub trait HasRepository {
    /// Repository owner (user or organisation)
    fn repo_owner(&self) -> &str;
    /// Repository name
    fn repo_name(&self) -> &str;

    /// `owner/name`
    fn repo_project_path(&self) -> String {
        format!("{}/{}", self.repo_owner(), self.repo_name())
    }
}

/// Access to the injected filesystem
pub trait HasFileSystem {
    /// The filesystem used by file collaborators
    fn file_system(&self) -> &dyn FileSystem;
}

/// Concrete environment used by the CLI and the integration tests
#[derive(Clone)]
pub struct Environment {
    /// Request sender for GitHub and CircleCI
    pub request: Arc<dyn RequestSender>,
    /// Filesystem for manifest, stats and artifact files
    pub fs: Arc<dyn FileSystem>,
    /// GitHub API token
    pub github_api_token: String,
    /// CircleCI API token
    pub circle_api_token: String,
    /// Repository owner
    pub repo_owner: String,
    /// Repository name
    pub repo_name: String,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("repo_owner", &self.repo_owner)
            .field("repo_name", &self.repo_name)
            .finish_non_exhaustive()
    }
}

impl HasRequestSender for Environment {
    fn request_sender(&self) -> &dyn RequestSender {
        self.request.as_ref()
    }
}

impl HasGitHubToken for Environment {
    fn github_api_token(&self) -> &str {
        &self.github_api_token
    }
}

impl HasCircleToken for Environment {
    fn circle_api_token(&self) -> &str {
        &self.circle_api_token
    }
}

impl HasRepository for Environment {
    fn repo_owner(&self) -> &str {
        &self.repo_owner
    }

    fn repo_name(&self) -> &str {
        &self.repo_name
    }
}

impl HasFileSystem for Environment {
    fn file_system(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{HttpRequest, HttpResponse, RealFileSystem, TransportError};
    use async_trait::async_trait;

    struct NoNetwork;

    #[async_trait]
    impl RequestSender for NoNetwork {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError("offline".to_string()))
        }
    }

    #[test]
    fn test_repo_project_path_joins_owner_and_name() {
        let env = Environment {
            request: Arc::new(NoNetwork),
            fs: Arc::new(RealFileSystem),
            github_api_token: "gh".to_string(),
            circle_api_token: "cc".to_string(),
            repo_owner: "acme".to_string(),
            repo_name: "web".to_string(),
        };
        assert_eq!(env.repo_project_path(), "acme/web");
    }

    #[test]
    fn test_debug_output_hides_tokens() {
        let env = Environment {
            request: Arc::new(NoNetwork),
            fs: Arc::new(RealFileSystem),
            github_api_token: "very-secret".to_string(),
            circle_api_token: "also-secret".to_string(),
            repo_owner: "acme".to_string(),
            repo_name: "web".to_string(),
        };
        let debug = format!("{:?}", env);
        assert!(debug.contains("acme"));
        assert!(!debug.contains("secret"));
    }
}
