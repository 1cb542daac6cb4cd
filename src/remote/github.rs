//! GitHub REST adapter

use super::casing::{camelize_keys, decamelize_keys};
use super::{decode_body, RequestDescriptor, RequestError};
use crate::effect::Effect;
use crate::env::{HasGitHubToken, HasRequestSender};
use crate::error::WeighInError;
use crate::infra::{redact_query, HttpRequest};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// GitHub API root
pub const GITHUB_API_ROOT: &str = "https://api.github.com";

const UNAUTHORIZED: u16 = 401;
const FORBIDDEN: u16 = 403;

/// Build an effect that performs a GitHub API request
///
/// The body (if any) is sent with snake_case keys; the response comes back
/// with camelCase keys unless the descriptor is raw.
pub fn request<E>(descriptor: RequestDescriptor) -> Effect<E, Value, WeighInError>
where
    E: HasRequestSender + HasGitHubToken + Send + Sync + 'static,
{
    let resolved = descriptor.target.resolve(GITHUB_API_ROOT);
    let body = descriptor
        .options
        .body
        .clone()
        .map(|body| decamelize_keys(body).to_string());
    let descriptor = Arc::new(descriptor);

    Effect::from_env_fn(move |env: Arc<E>| {
        let resolved = resolved.clone();
        let descriptor = Arc::clone(&descriptor);
        let body = body.clone();
        async move {
            let url = resolved.map_err(|e| RequestError::GitHubFetch {
                url: redact_query(&e.target).to_string(),
                reason: e.reason,
            })?;

            let mut headers = BTreeMap::from([
                (
                    "Accept".to_string(),
                    "application/vnd.github.v3+json".to_string(),
                ),
                (
                    "Authorization".to_string(),
                    format!("Bearer {}", env.github_api_token()),
                ),
            ]);
            if body.is_some() {
                headers.insert("Content-Type".to_string(), "application/json".to_string());
            }
            headers.extend(descriptor.options.headers.clone());

            let request = HttpRequest {
                method: descriptor.options.method,
                url: url.into(),
                headers,
                body,
            };
            send(env, request, descriptor.raw).await
        }
    })
}

async fn send<E>(env: Arc<E>, request: HttpRequest, raw: bool) -> Result<Value, WeighInError>
where
    E: HasRequestSender + Send + Sync,
{
    let url = redact_query(&request.url).to_string();
    let response = env
        .request_sender()
        .send(request)
        .await
        .map_err(|e| RequestError::GitHubFetch {
            url: url.clone(),
            reason: e.to_string(),
        })?;

    if !response.ok() {
        let status_text = response.status_text;
        return Err(if matches!(response.status, UNAUTHORIZED | FORBIDDEN) {
            RequestError::GitHubAuthorization { url, status_text }
        } else {
            RequestError::GitHubInvalidResponse { url, status_text }
        }
        .into());
    }

    let value = decode_body(&url, &response.body)?;
    Ok(if raw { value } else { camelize_keys(value) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{HttpResponse, Method, RequestSender, TransportError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct Scripted {
        response: Result<HttpResponse, TransportError>,
        sent: Mutex<Vec<HttpRequest>>,
    }

    struct TestEnv {
        sender: Scripted,
    }

    impl HasRequestSender for TestEnv {
        fn request_sender(&self) -> &dyn RequestSender {
            &self.sender
        }
    }

    impl HasGitHubToken for TestEnv {
        fn github_api_token(&self) -> &str {
            "gh-token"
        }
    }

    #[async_trait]
    impl RequestSender for Scripted {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.sent.lock().unwrap().push(request);
            self.response.clone()
        }
    }

    fn env_answering(response: Result<HttpResponse, TransportError>) -> Arc<TestEnv> {
        Arc::new(TestEnv {
            sender: Scripted {
                response,
                sent: Mutex::new(Vec::new()),
            },
        })
    }

    fn respond(status: u16, status_text: &str, body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status,
            status_text: status_text.to_string(),
            body: body.to_string(),
        })
    }

    #[tokio::test]
    async fn test_sends_bearer_token_to_fixed_host() {
        let env = env_answering(respond(200, "OK", r#"{"base": {"ref": "main"}}"#));

        request(RequestDescriptor::path("repos/acme/web/pulls/45"))
            .run(Arc::clone(&env))
            .await
            .unwrap();

        let sent = env.sender.sent.lock().unwrap();
        assert_eq!(sent[0].url, "https://api.github.com/repos/acme/web/pulls/45");
        assert_eq!(sent[0].headers["Authorization"], "Bearer gh-token");
        assert_eq!(sent[0].headers["Accept"], "application/vnd.github.v3+json");
        assert_eq!(sent[0].method, Method::Get);
    }

    #[tokio::test]
    async fn test_request_body_is_decamelized_and_response_camelized() {
        let env = env_answering(respond(201, "Created", r#"{"target_url": "http://ci/1"}"#));

        let value = request(
            RequestDescriptor::path("repos/acme/web/statuses/abc")
                .method(Method::Post)
                .json_body(json!({"targetUrl": "http://ci/1", "state": "success"})),
        )
        .run(Arc::clone(&env))
        .await
        .unwrap();

        assert_eq!(value, json!({"targetUrl": "http://ci/1"}));
        let sent = env.sender.sent.lock().unwrap();
        let body: Value = serde_json::from_str(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"target_url": "http://ci/1", "state": "success"}));
        assert_eq!(sent[0].headers["Content-Type"], "application/json");
    }

    #[tokio::test]
    async fn test_raw_mode_skips_camelization() {
        let env = env_answering(respond(200, "OK", r#"{"some_key": 1}"#));
        let value = request(RequestDescriptor::path("x").raw())
            .run(env)
            .await
            .unwrap();
        assert_eq!(value, json!({"some_key": 1}));
    }

    #[tokio::test]
    async fn test_transport_failure_is_fetch_error() {
        let env = env_answering(Err(TransportError("connection refused".to_string())));
        let err = request(RequestDescriptor::path("repos/acme/web/pulls/1"))
            .run(env)
            .await
            .unwrap_err();

        match err {
            WeighInError::Request(RequestError::GitHubFetch { url, reason }) => {
                assert_eq!(url, "https://api.github.com/repos/acme/web/pulls/1");
                assert!(reason.contains("connection refused"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_401_and_403_are_authorization_errors() {
        for (status, text) in [(401, "Unauthorized"), (403, "Forbidden")] {
            let env = env_answering(respond(status, text, ""));
            let err = request(RequestDescriptor::path("user"))
                .run(env)
                .await
                .unwrap_err();
            assert!(
                matches!(
                    &err,
                    WeighInError::Request(RequestError::GitHubAuthorization { status_text, .. })
                        if status_text == text
                ),
                "unexpected error: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_other_statuses_are_invalid_response_errors() {
        let env = env_answering(respond(404, "Not Found", r#"{"message": "Not Found"}"#));
        let err = request(RequestDescriptor::path("repos/acme/web/pulls/999"))
            .run(env)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WeighInError::Request(RequestError::GitHubInvalidResponse { ref status_text, .. })
                if status_text == "Not Found"
        ));
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_malformed() {
        let env = env_answering(respond(200, "OK", "<html>"));
        let err = request(RequestDescriptor::path("x"))
            .run(env)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WeighInError::Request(RequestError::MalformedBody { .. })
        ));
    }
}
