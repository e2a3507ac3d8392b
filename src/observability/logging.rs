//! Structured logging.
//!
//! Pretty output for development, JSON lines for production. The level comes
//! from `RUST_LOG` when set, otherwise from configuration.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

const REDACTED: &str = "[REDACTED]";
const SENSITIVE_KEYS: [&str; 5] = ["key", "token", "password", "secret", "authorization"];

static LONG_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z0-9]{20,}").expect("valid regex"));

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    });

    let (json, pretty) = match config.log_format {
        LogFormat::Json => (Some(fmt::layer().json().flatten_event(true)), None),
        LogFormat::Pretty => (None, Some(fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()
}

/// Copy of `value` safe to log: credential-looking keys are masked and long
/// opaque tokens inside strings are replaced.
pub fn redact_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(redact_str(s)),
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        Value::Object(map) => {
            let redacted: Map<String, Value> = map
                .iter()
                .map(|(key, value)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String(REDACTED.to_string()))
                    } else {
                        (key.clone(), redact_value(value))
                    }
                })
                .collect();
            Value::Object(redacted)
        }
        other => other.clone(),
    }
}

pub fn redact_str(s: &str) -> String {
    LONG_TOKEN.replace_all(s, REDACTED).into_owned()
}

fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|needle| key.contains(needle))
}
