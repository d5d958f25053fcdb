use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::AppSettings;

/// Errors that can occur when loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Settings validation failed: {message}")]
    ValidationError { message: String },
}

impl AppSettings {
    /// Returns the settings file path for `app_name`.
    ///
    /// Uses `dirs::config_dir()` (e.g. `~/.config/<app>/settings.toml` on Linux),
    /// falling back to the current directory when it is unavailable.
    pub fn settings_path(app_name: &str) -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join(app_name).join("settings.toml")
    }

    /// Loads settings for `app_name` from [`settings_path`](Self::settings_path).
    ///
    /// A missing file yields `AppSettings::default()`.
    pub fn load(app_name: &str) -> Result<Self, ConfigError> {
        Self::load_from(&Self::settings_path(app_name))
    }

    /// Loads settings from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(AppSettings::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let settings: AppSettings = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Parses and validates settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: AppSettings = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            source: e,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that `default_command`, when present, is not blank.
    ///
    /// Whether the command exists is only known once the app is built, so that
    /// check happens when the app runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.default_command {
            if name.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    message: "default_command must not be blank".to_string(),
                });
            }
        }
        Ok(())
    }
}
