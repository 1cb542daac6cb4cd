//! Declarative request descriptors consumed by the adapters

use crate::infra::Method;
use reqwest::Url;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Where a request goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Path segments relative to the adapter's API root
    Path(Vec<String>),
    /// Absolute URL
    Url(String),
}

/// A target that does not form a valid URL
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{target} is not a valid URL: {reason}")]
pub struct InvalidTarget {
    /// The target as written
    pub target: String,
    /// Parser message
    pub reason: String,
}

impl Target {
    /// Resolve against an API root
    ///
    /// Path segments are percent-encoded, so a `/`, `?` or `#` inside a
    /// segment stays part of that segment.
    pub fn resolve(&self, api_root: &str) -> Result<Url, InvalidTarget> {
        match self {
            Target::Path(segments) => {
                let invalid = |reason: String| InvalidTarget {
                    target: format!("{}/{}", api_root.trim_end_matches('/'), segments.join("/")),
                    reason,
                };
                let mut url = Url::parse(api_root).map_err(|e| invalid(e.to_string()))?;
                url.path_segments_mut()
                    .map_err(|()| invalid("API root cannot be a base URL".to_string()))?
                    .pop_if_empty()
                    .extend(segments);
                Ok(url)
            }
            Target::Url(url) => Url::parse(url).map_err(|e| InvalidTarget {
                target: url.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Method, extra headers and JSON body of a request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// HTTP method
    pub method: Method,
    /// Headers merged over the adapter defaults
    pub headers: BTreeMap<String, String>,
    /// JSON body, sent with decamelized keys by the GitHub adapter
    pub body: Option<Value>,
}

/// Adapter input: target, raw mode and request options
///
/// # Examples
///
/// ```
/// use circleci_weigh_in::remote::RequestDescriptor;
/// use circleci_weigh_in::infra::Method;
/// use serde_json::json;
///
/// let descriptor = RequestDescriptor::path("repos/acme/web/statuses/abc123")
///     .method(Method::Post)
///     .json_body(json!({"state": "pending"}));
///
/// assert_eq!(descriptor.options.method, Method::Post);
/// assert!(!descriptor.raw);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// Request target
    pub target: Target,
    /// Skip response key camelization
    pub raw: bool,
    /// Method, headers and body
    pub options: RequestOptions,
}

impl RequestDescriptor {
    /// Request a path relative to the API root
    ///
    /// Every `/`-separated part becomes one segment. Use [`segment`] for
    /// values that may contain a `/` themselves.
    ///
    /// [`segment`]: RequestDescriptor::segment
    pub fn path(path: impl AsRef<str>) -> Self {
        let segments = path
            .as_ref()
            .split('/')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
        Self::new(Target::Path(segments))
    }

    /// Request an absolute URL
    pub fn url(url: impl Into<String>) -> Self {
        Self::new(Target::Url(url.into()))
    }

    fn new(target: Target) -> Self {
        Self {
            target,
            raw: false,
            options: RequestOptions::default(),
        }
    }

    /// Append one path segment, kept whole
    ///
    /// Absolute URL targets are left untouched.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        if let Target::Path(segments) = &mut self.target {
            segments.push(segment.into());
        }
        self
    }

    /// Return the response body without key transformation
    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    /// Set the HTTP method
    pub fn method(mut self, method: Method) -> Self {
        self.options.method = method;
        self
    }

    /// Add or override a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.insert(name.into(), value.into());
        self
    }

    /// Attach a JSON body
    pub fn json_body(mut self, body: Value) -> Self {
        self.options.body = Some(body);
        self
    }
}
