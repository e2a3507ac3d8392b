//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{Environment, GatewayConfig, Secret};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Environment variables consulted by [`apply_env_overrides`].
pub const ENV_API_KEY: &str = "MONDAY_API_KEY";
pub const ENV_BOARD_ID: &str = "MONDAY_BOARD_ID";
pub const ENV_API_URL: &str = "MONDAY_API_URL";
pub const ENV_CONTENT_URL: &str = "GHOST_API_URL";
pub const ENV_CONTENT_KEY: &str = "GHOST_API_KEY";
pub const ENV_PORT: &str = "PORT";
pub const ENV_ENVIRONMENT: &str = "GATEWAY_ENV";

/// Parse a TOML configuration file.
pub fn read_config_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment values onto `config`. `lookup` returns a variable's
/// value, or `None` when unset.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(ENV_API_KEY) {
        config.upstream.api_key = Secret::new(key.trim());
    }
    if let Some(board_id) = lookup(ENV_BOARD_ID) {
        config.upstream.board_id = board_id.trim().to_string();
    }
    if let Some(url) = lookup(ENV_API_URL) {
        config.upstream.url = url.trim().to_string();
    }
    if let Some(url) = lookup(ENV_CONTENT_URL) {
        config.content.url = url.trim().to_string();
    }
    if let Some(key) = lookup(ENV_CONTENT_KEY) {
        config.content.api_key = Some(Secret::new(key.trim()));
    }
    if let Some(port) = lookup(ENV_PORT) {
        let port: u16 = port.trim().parse().map_err(|_| ConfigError::Env {
            var: ENV_PORT,
            reason: format!("'{port}' is not a port number"),
        })?;
        config.listener.bind_address = format!("0.0.0.0:{port}");
    }
    if let Some(env) = lookup(ENV_ENVIRONMENT) {
        config.environment = env
            .parse::<Environment>()
            .map_err(|reason| ConfigError::Env { var: ENV_ENVIRONMENT, reason })?;
    }
    Ok(())
}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
