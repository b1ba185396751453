//! Configuration management for echo-recorder.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, validation, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{PlaybackConfig, ServerConfig, StorageConfig},
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

const CONFIG_FILE_NAME: &str = "config.toml";

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Echo server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Playback speed settings.
    #[serde(default)]
    pub playback: PlaybackConfig,
    /// Artifact storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from the platform config directory, creating a
    /// default file if none exists.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, writing defaults there if missing.
    #[track_caller]
    #[instrument]
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            info!(config_path = ?path, "No config found, creating default");
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?path, "Configuration loaded");

        Ok(config)
    }

    /// Check values that serde cannot: URL scheme, timeout and rate.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn validate(&self) -> AppResult<()> {
        let base_url = self.server.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::ConfigError {
                reason: format!(
                    "server.base_url must start with http:// or https://, got '{}'",
                    self.server.base_url
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if self.server.timeout_secs == 0 {
            return Err(AppError::ConfigError {
                reason: "server.timeout_secs must be greater than zero".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.playback
            .fast_rate()
            .map_err(|e| AppError::ConfigError {
                reason: format!("playback.fast_rate is invalid: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(())
    }

    /// Save configuration to `path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Directory for `recording.wav` and `echo.wav`.
    #[track_caller]
    pub fn artifact_dir(&self) -> AppResult<PathBuf> {
        match &self.storage.artifact_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("artifacts")),
        }
    }

    /// Directory for rolling log files.
    #[track_caller]
    pub fn log_dir() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("logs"))
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "echo-recorder", "Echo-Recorder").ok_or_else(|| {
            AppError::ConfigError {
                reason: "Failed to get project directories".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }
}
