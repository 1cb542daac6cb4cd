//! Remote request adapters for GitHub and CircleCI
//!
//! Each adapter turns a [`RequestDescriptor`] into an [`Effect`] that needs an
//! environment providing a request sender and the relevant API token. HTTP
//! failures are classified into [`RequestError`] variants.
//!
//! [`Effect`]: crate::effect::Effect

pub mod casing;
pub mod circleci;
pub mod descriptor;
pub mod error;
pub mod github;

pub use descriptor::{InvalidTarget, RequestDescriptor, RequestOptions, Target};
pub use error::RequestError;

use serde_json::Value;

/// Decode a successful response body; an empty body decodes to `null`
pub(crate) fn decode_body(url: &str, body: &str) -> Result<Value, RequestError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|source| RequestError::MalformedBody {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_body_treats_blank_as_null() {
        assert_eq!(decode_body("u", "  \n").unwrap(), Value::Null);
    }

    #[test]
    fn test_decode_body_reports_url_on_failure() {
        let err = decode_body("https://api.github.com/x", "not json").unwrap_err();
        assert_eq!(err.url(), "https://api.github.com/x");
    }
}
