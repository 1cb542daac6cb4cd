//! JSON key casing transforms
//!
//! GitHub and CircleCI speak snake_case; the rest of the crate reads
//! camelCase keys. Only object keys are rewritten, values are untouched.
//! Numeric keys are left as they are.

use serde_json::{Map, Value};

/// Rewrite every object key (recursively) to camelCase
pub fn camelize_keys(value: Value) -> Value {
    transform_keys(value, &camelize)
}

/// Rewrite every object key (recursively) to snake_case
pub fn decamelize_keys(value: Value) -> Value {
    transform_keys(value, &decamelize)
}

fn transform_keys(value: Value, rename: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| (rename(&key), transform_keys(inner, rename)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| transform_keys(item, rename))
                .collect(),
        ),
        other => other,
    }
}

fn is_numeric(key: &str) -> bool {
    key.parse::<f64>().is_ok()
}

fn is_separator(ch: char) -> bool {
    ch == '_' || ch == '-' || ch.is_whitespace()
}

/// `build_num` → `buildNum`
pub fn camelize(key: &str) -> String {
    if is_numeric(key) {
        return key.to_string();
    }

    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if is_separator(ch) {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }

    let mut chars = out.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => out,
    }
}

/// `targetUrl` → `target_url`
pub fn decamelize(key: &str) -> String {
    if is_numeric(key) {
        return key.to_string();
    }

    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
