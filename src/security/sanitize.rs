//! Input sanitization.
//!
//! Best-effort cleanup of user-supplied JSON before it reaches an upstream
//! API. Never fails; only transforms.
//!
//! - Strings: strip `<`/`>`, `javascript:` and inline `on*=` handlers until
//!   none remain, trim, truncate to [`MAX_STRING_CHARS`]
//! - Objects: drop keys outside `[A-Za-z0-9_]+`, recurse into values
//! - Arrays: recurse into items

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Longest string kept after sanitizing, in characters.
pub const MAX_STRING_CHARS: usize = 1000;

static ANGLE_BRACKETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[<>]").expect("valid regex"));
static JAVASCRIPT_URI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("valid regex"));
static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)on[a-z0-9_]+=").expect("valid regex"));

/// Sanitize an arbitrary JSON value.
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_str(s)),
        Value::Object(map) => Value::Object(sanitize_map(map)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        other => other.clone(),
    }
}

/// Sanitize an object, dropping keys that are not plain identifiers.
pub fn sanitize_map(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .filter(|(key, _)| is_valid_key(key))
        .map(|(key, value)| (key.clone(), sanitize(value)))
        .collect()
}

/// Sanitize a single string.
pub fn sanitize_str(input: &str) -> String {
    let stripped = strip_patterns(input);
    let truncated: String = stripped.trim().chars().take(MAX_STRING_CHARS).collect();
    truncated.trim_end().to_string()
}

/// Keys must match `^[A-Za-z0-9_]+$`.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// Removing one pattern can splice another together ("javajavascript:script:"),
// so strip until nothing changes. Every pass that changes the text shortens it.
fn strip_patterns(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let without_brackets = ANGLE_BRACKETS.replace_all(&current, "");
        let without_uris = JAVASCRIPT_URI.replace_all(&without_brackets, "");
        let next = EVENT_HANDLER.replace_all(&without_uris, "").into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}
