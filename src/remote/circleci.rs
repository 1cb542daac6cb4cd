//! CircleCI v1.1 REST adapter

use super::casing::camelize_keys;
use super::{decode_body, RequestDescriptor, RequestError};
use crate::effect::Effect;
use crate::env::{HasCircleToken, HasRequestSender};
use crate::error::WeighInError;
use crate::infra::{redact_query, HttpRequest};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// CircleCI API root
pub const CIRCLE_API_ROOT: &str = "https://circleci.com/api/v1.1";

/// Build an effect that performs a CircleCI API request
///
/// The API token travels as the `circle-token` query parameter. Raw
/// descriptors return the body exactly as received.
pub fn request<E>(descriptor: RequestDescriptor) -> Effect<E, Value, WeighInError>
where
    E: HasRequestSender + HasCircleToken + Send + Sync + 'static,
{
    let resolved = descriptor.target.resolve(CIRCLE_API_ROOT);
    let body = descriptor
        .options
        .body
        .as_ref()
        .map(|body| body.to_string());
    let descriptor = Arc::new(descriptor);

    Effect::from_env_fn(move |env: Arc<E>| {
        let resolved = resolved.clone();
        let descriptor = Arc::clone(&descriptor);
        let body = body.clone();
        async move {
            let mut url = resolved.map_err(|e| RequestError::CircleCiFetch {
                url: redact_query(&e.target).to_string(),
                reason: e.reason,
            })?;
            url.query_pairs_mut()
                .append_pair("circle-token", env.circle_api_token());

            let mut headers =
                BTreeMap::from([("Accept".to_string(), "application/json".to_string())]);
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
        .map_err(|e| RequestError::CircleCiFetch {
            url: url.clone(),
            reason: e.to_string(),
        })?;

    if !response.ok() {
        return Err(RequestError::CircleCiInvalidResponse {
            url,
            status_text: response.status_text,
        }
        .into());
    }

    let value = decode_body(&url, &response.body)?;
    Ok(if raw { value } else { camelize_keys(value) })
}
