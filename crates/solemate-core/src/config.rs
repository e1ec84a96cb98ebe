//! Application configuration management.
//!
//! Handles loading and validating SoleMate configuration:
//! - HTTP listener address
//! - Identity provider project settings
//! - Data directory for profiles and settings
//! - Device scan timing

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/solemate/config.toml";

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// The configuration file could not be read.
    #[error("Failed to read {path}: {source}")]
    ReadError {
        /// File path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`Config`].
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A single field is invalid.
    #[error("Invalid {field}: {message}")]
    ValidationError {
        /// Dotted field name.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Several fields are invalid.
    #[error("Configuration has {} validation errors", .0.len())]
    MultipleValidationErrors(Vec<ConfigError>),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Identity provider settings.
    pub identity: IdentityConfig,
    /// Persistent storage settings.
    pub storage: StorageConfig,
    /// Smart-shoe device settings.
    pub devices: DeviceConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Production logging (JSON files) instead of pretty stdout.
    pub production: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            production: false,
        }
    }
}

/// Identity provider project settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Provider API key. Empty means the provider is not configured.
    pub api_key: String,
    /// Provider project identifier.
    pub project_id: String,
    /// Domain used by interactive sign-in flows.
    pub auth_domain: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_key: "development".to_string(),
            project_id: "solemate".to_string(),
            auth_domain: "solemate.localhost".to_string(),
        }
    }
}

/// Persistent storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory. `None` uses the platform default.
    pub data_dir: Option<PathBuf>,
}

/// Smart-shoe device settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// How long a discovery scan runs.
    pub scan_duration_secs: u64,

    /// Whether the Bluetooth radio is on at startup.
    pub bluetooth_enabled: bool,

    /// Whether the location permission needed for scanning is already granted.
    pub location_permitted: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            scan_duration_secs: 3,
            bluetooth_enabled: true,
            location_permitted: true,
        }
    }
}

impl Config {
    /// Loads configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file does not exist, or a
    /// read, parse, or validation error.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Loads configuration from `path`, falling back to defaults if the file
    /// is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or validated.
    pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Self> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::NotFound(p)) => {
                debug!(path = %p, "No configuration file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Checks every field and reports all problems at once.
    ///
    /// # Errors
    ///
    /// Returns a single [`ConfigError::ValidationError`], or
    /// [`ConfigError::MultipleValidationErrors`] when more than one field is invalid.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if self.server.host.trim().is_empty() {
            errors.push(invalid("server.host", "must not be empty"));
        }
        if self.server.port == 0 {
            errors.push(invalid("server.port", "must be between 1 and 65535"));
        }
        if self.identity.project_id.trim().is_empty() {
            errors.push(invalid("identity.project_id", "must not be empty"));
        }
        if !(1..=60).contains(&self.devices.scan_duration_secs) {
            errors.push(invalid(
                "devices.scan_duration_secs",
                "must be between 1 and 60 seconds",
            ));
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::MultipleValidationErrors(errors)),
        }
    }

    /// The data directory, falling back to the platform default.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(crate::storage::default_data_dir)
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_default(dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.devices.scan_duration_secs, 3);
    }

    #[test]
    fn test_device_radio_flags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[devices]\nbluetooth_enabled = false\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(!config.devices.bluetooth_enabled);
        assert!(config.devices.location_permitted);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server = [").unwrap();
        assert!(matches!(
            Config::load_or_default(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = Config::default();
        config.server.port = 0;
        config.devices.scan_duration_secs = 0;
        match config.validate() {
            Err(ConfigError::MultipleValidationErrors(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected multiple errors, got {other:?}"),
        }

        let mut config = Config::default();
        config.identity.project_id = " ".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { field, .. }) if field == "identity.project_id"
        ));
    }
}
