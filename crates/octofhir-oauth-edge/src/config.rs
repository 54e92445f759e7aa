//! Edge configuration.
//!
//! Policy switches for credential extraction and response encoding. Values
//! are loaded from an optional TOML file and `OAUTH_EDGE__*` environment
//! variables.
//!
//! # Example (TOML)
//!
//! ```toml
//! allow_client_secret_in_params = true
//! error_status_code = 400
//! redirect_in_fragment = false
//! ```

use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Default configuration file looked up by [`load_config`].
pub const DEFAULT_CONFIG_FILE: &str = "oauth-edge.toml";

/// Prefix of environment overrides, e.g. `OAUTH_EDGE__ERROR_STATUS_CODE=400`.
pub const ENV_PREFIX: &str = "OAUTH_EDGE";

/// Credential and response policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Accept `client_id`/`client_secret` request parameters as client
    /// authentication. Intended for clients that cannot set headers.
    pub allow_client_secret_in_params: bool,

    /// Status code used once an error is recorded on an envelope.
    pub error_status_code: u16,

    /// Put redirect parameters in the URL fragment instead of the query.
    pub redirect_in_fragment: bool,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            allow_client_secret_in_params: false,
            error_status_code: 200,
            redirect_in_fragment: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// The configuration sources could not be read or merged.
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl EdgeConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `error_status_code` is not a
    /// valid HTTP status.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=599).contains(&self.error_status_code) {
            return Err(ConfigError::InvalidValue(format!(
                "error_status_code must be between 100 and 599, got {}",
                self.error_status_code
            )));
        }
        Ok(())
    }
}

/// Loads configuration from `path` (or [`DEFAULT_CONFIG_FILE`]) and the
/// environment, then validates it.
///
/// A missing file is not an error; defaults and environment overrides apply.
///
/// # Errors
///
/// Returns `ConfigError::Load` if a source cannot be parsed and
/// `ConfigError::InvalidValue` if validation fails.
pub fn load_config(path: Option<&str>) -> Result<EdgeConfig, ConfigError> {
    let path = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));

    let mut builder = Config::builder();
    if path.exists() {
        builder = builder.add_source(File::from(path));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__"),
    );

    let config: EdgeConfig = builder
        .build()
        .and_then(|cfg| cfg.try_deserialize())
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = EdgeConfig::default();
        assert!(!config.allow_client_secret_in_params);
        assert_eq!(config.error_status_code, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_status_code() {
        let config = EdgeConfig {
            error_status_code: 42,
            ..EdgeConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("error_status_code"));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("oauth-edge.toml");
        fs::write(
            &path,
            "allow_client_secret_in_params = true\nerror_status_code = 400\n",
        )
        .expect("write toml");

        let config = load_config(path.to_str()).expect("should parse config");
        assert!(config.allow_client_secret_in_params);
        assert_eq!(config.error_status_code, 400);
        assert!(!config.redirect_in_fragment);
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("oauth-edge.toml");
        fs::write(&path, "error_status_code = 1000\n").expect("write toml");

        assert!(matches!(
            load_config(path.to_str()),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("absent.toml");
        let config = load_config(path.to_str()).expect("defaults");
        assert_eq!(config, EdgeConfig::default());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = EdgeConfig {
            allow_client_secret_in_params: true,
            error_status_code: 401,
            redirect_in_fragment: true,
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EdgeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
