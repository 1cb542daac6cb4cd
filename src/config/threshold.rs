//! Failure threshold configuration

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Asset ids (or `.ext` suffixes) a threshold applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Targets {
    /// A single target
    One(String),
    /// Several targets
    Many(Vec<String>),
}

impl Targets {
    /// Targets as a slice, in configured order
    pub fn as_slice(&self) -> &[String] {
        match self {
            Targets::One(target) => std::slice::from_ref(target),
            Targets::Many(targets) => targets,
        }
    }
}

/// How matched assets are combined when checking a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Fail when any matched asset exceeds the limit
    #[default]
    Any,
}

/// A maximum size applied to one or more assets
///
/// # Examples
///
/// ```
/// use circleci_weigh_in::config::threshold::{FailureThreshold, Strategy, Targets};
///
/// let threshold: FailureThreshold =
///     serde_json::from_str(r#"{"targets": ".js", "maxSize": 50}"#).unwrap();
/// assert_eq!(threshold.targets, Targets::One(".js".to_string()));
/// assert_eq!(threshold.strategy, Strategy::Any);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureThreshold {
    /// Targets
    pub targets: Targets,
    /// Maximum allowed size in bytes (inclusive)
    #[serde(deserialize_with = "deserialize_byte_count")]
    pub max_size: u64,
    /// Combination strategy
    #[serde(default)]
    pub strategy: Strategy,
}

impl FailureThreshold {
    /// Threshold on a single target
    pub fn new(target: impl Into<String>, max_size: u64) -> Self {
        Self {
            targets: Targets::One(target.into()),
            max_size,
            strategy: Strategy::Any,
        }
    }
}

/// Read a byte count from an integer or a whole non-negative float
///
/// `51200`, `51200.0` and `5.12e4` all give 51200.
pub fn byte_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n < u64::MAX as f64)
            .map(|n| n as u64)
    })
}

fn deserialize_byte_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    byte_count(&value).ok_or_else(|| {
        de::Error::custom(format!("maxSize should be a non-negative integer, got {}", value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_targets_accept_string_or_list() {
        let one: Targets = serde_json::from_value(json!("app.js")).unwrap();
        let many: Targets = serde_json::from_value(json!(["app.js", ".css"])).unwrap();

        assert_eq!(one.as_slice(), ["app.js".to_string()]);
        assert_eq!(many.as_slice().len(), 2);
    }

    #[test]
    fn test_max_size_accepts_whole_floats() {
        for raw in [r#"51200"#, r#"51200.0"#, r#"5.12e4"#] {
            let threshold: FailureThreshold =
                serde_json::from_str(&format!(r#"{{"targets": ".js", "maxSize": {}}}"#, raw))
                    .unwrap();
            assert_eq!(threshold.max_size, 51200, "maxSize {}", raw);
        }
    }

    #[test]
    fn test_max_size_rejects_fractions_and_negatives() {
        for bad in [json!(1.5), json!(-1), json!(-2.0), json!("100"), json!(1e20)] {
            assert_eq!(byte_count(&bad), None, "{}", bad);
            let parsed = serde_json::from_value::<FailureThreshold>(
                json!({"targets": ".js", "maxSize": bad}),
            );
            assert!(parsed.is_err());
        }
    }

    #[test]
    fn test_serializes_with_default_strategy() {
        let value = serde_json::to_value(FailureThreshold::new("app.js", 50)).unwrap();
        assert_eq!(
            value,
            json!({"targets": "app.js", "maxSize": 50, "strategy": "any"})
        );
    }
}
