//! Configuration file loading and persistence.

use crate::types::TelemetryConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Loads and saves `config.json`.
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given config file.
    pub fn new(config_path: impl AsRef<Path>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Strict load: defaults when absent, errors on bad JSON or bad values.
    pub fn load(&self) -> Result<TelemetryConfig, ConfigError> {
        if !self.config_path.exists() {
            return Ok(TelemetryConfig::default());
        }

        let contents = std::fs::read_to_string(&self.config_path).map_err(|source| ConfigError::Io {
            path: self.config_path.clone(),
            source,
        })?;

        let config: TelemetryConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: self.config_path.clone(),
                line: e.line(),
                message: e.to_string(),
            })?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Hook-path load that never fails.
    ///
    /// A missing or unparseable file is replaced by the defaults on disk.
    /// Out-of-range values fall back to defaults in memory only, leaving the
    /// user's file for them to fix.
    pub fn load_or_init(&self) -> TelemetryConfig {
        match self.load() {
            Ok(config) => {
                if !self.config_path.exists() {
                    self.write_defaults();
                }
                config
            }
            Err(ConfigError::Validation { message }) => {
                warn!(path = %self.config_path.display(), %message, "invalid config values, using defaults");
                TelemetryConfig::default()
            }
            Err(e) => {
                warn!(error = %e, "unreadable config, restoring defaults");
                self.write_defaults();
                TelemetryConfig::default()
            }
        }
    }

    fn write_defaults(&self) {
        match self.save(&TelemetryConfig::default()) {
            Ok(()) => debug!(path = %self.config_path.display(), "wrote default config"),
            Err(e) => warn!(error = %e, "failed to write default config"),
        }
    }

    /// Validate configuration values.
    pub fn validate(config: &TelemetryConfig) -> Result<(), ConfigError> {
        if config.push_batch_size == 0 {
            return Err(ConfigError::Validation {
                message: "push_batch_size must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration as pretty-printed JSON.
    pub fn save(&self, config: &TelemetryConfig) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: self.config_path.clone(),
            source,
        };

        if let Some(dir) = self.config_path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }

        let mut json = serde_json::to_string_pretty(config).map_err(|e| ConfigError::Parse {
            path: self.config_path.clone(),
            line: 0,
            message: e.to_string(),
        })?;
        json.push('\n');

        std::fs::write(&self.config_path, json).map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrivacyConfig;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_defaults_when_no_file() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path().join("config.json"));
        let config = loader.load().unwrap();
        assert_eq!(config, TelemetryConfig::default());
        assert!(!loader.path().exists());
    }

    #[test]
    fn test_load_or_init_writes_defaults() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path().join("nested/config.json"));

        let config = loader.load_or_init();

        assert_eq!(config, TelemetryConfig::default());
        let written = fs::read_to_string(loader.path()).unwrap();
        assert!(written.contains("\"retention_days\": 30"));
        assert!(written.ends_with('\n'));
    }

    #[test]
    fn test_corrupt_file_is_replaced_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let loader = ConfigLoader::new(&path);

        assert!(matches!(loader.load(), Err(ConfigError::Parse { .. })));

        let config = loader.load_or_init();
        assert_eq!(config, TelemetryConfig::default());
        let reloaded = loader.load().unwrap();
        assert_eq!(reloaded, TelemetryConfig::default());
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"retention_days": 7, "privacy": {"log_prompt_content": true}}"#).unwrap();

        let config = ConfigLoader::new(&path).load().unwrap();

        assert_eq!(config.retention_days, 7);
        assert!(config.privacy.log_prompt_content);
        assert_eq!(config.privacy.tool_input_preview_chars, 100);
        assert_eq!(config.push_batch_size, 100);
        assert!(config.enabled);
    }

    #[test]
    fn test_invalid_values_keep_user_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let original = r#"{"push_batch_size": 0}"#;
        fs::write(&path, original).unwrap();
        let loader = ConfigLoader::new(&path);

        match loader.load() {
            Err(ConfigError::Validation { message }) => assert!(message.contains("push_batch_size")),
            other => panic!("Expected ValidationError, got {:?}", other),
        }

        let config = loader.load_or_init();
        assert_eq!(config.push_batch_size, 100);
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_round_trip_every_option() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path().join("config.json"));

        let config = TelemetryConfig {
            enabled: false,
            privacy: PrivacyConfig {
                log_prompt_content: true,
                tool_input_preview_chars: 42,
                log_tool_results: true,
            },
            retention_days: 3,
            webhook_url: Some("https://hooks.example.com/in".to_string()),
            api_url: Some("https://telemetry.example.com".to_string()),
            api_key: Some("ct_live_123".to_string()),
            push_batch_size: 7,
        };

        loader.save(&config).unwrap();
        let loaded = loader.load().unwrap();

        assert_eq!(loaded, config);
    }
}
