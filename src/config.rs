use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{AppError, AppResult};
use crate::security::InputValidator;

/// Sender name used when no display name is configured.
pub const ANONYMOUS_SENDER: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub display_name: String,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub download_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".to_string(),
            display_name: String::new(),
            poll_interval_ms: 3000,
            request_timeout_secs: 300,
            download_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Display name as sent to the server; blank names become "Anonymous".
    pub fn sender_name(&self) -> String {
        effective_sender(&self.display_name)
    }

    /// Where downloads land when no explicit directory is given.
    pub fn effective_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn effective_sender(display_name: &str) -> String {
    let trimmed = display_name.trim();
    if trimmed.is_empty() {
        ANONYMOUS_SENDER.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn default_config_path() -> AppResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| AppError::Config("Could not find config directory".to_string()))?
        .join("LAN Transfer");

    fs::create_dir_all(&config_dir)?;
    Ok(config_dir.join("config.json"))
}

/// Load the config at `path`, writing defaults there if it does not exist yet.
pub fn load_config_from(path: &Path) -> AppResult<Config> {
    if path.exists() {
        let config = read_config_unvalidated(path)?;
        validate_config(&config)?;
        Ok(config)
    } else {
        let default_config = Config::default();
        save_config_internal(path, &default_config)?;
        Ok(default_config)
    }
}

/// Read the saved config without validating it, so a file holding a bad
/// value can still be edited. Missing or unparsable files read as defaults.
pub fn read_config_unvalidated(path: &Path) -> AppResult<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let config_str = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&config_str).unwrap_or_else(|e| {
        log::warn!("Failed to parse config file: {}. Using defaults.", e);
        Config::default()
    }))
}

pub fn save_config_to(path: &Path, config: &Config) -> AppResult<()> {
    validate_config(config)?;
    save_config_internal(path, config)
}

fn save_config_internal(path: &Path, config: &Config) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    if path.exists() {
        let backup_path = path.with_extension("json.bak");
        if let Err(e) = fs::copy(path, &backup_path) {
            log::warn!("Failed to create config backup: {}", e);
        }
    }

    let config_str = serde_json::to_string_pretty(config)?;
    fs::write(path, config_str)?;

    log::info!("Configuration saved to {}", path.display());
    Ok(())
}

/// Reset configuration to defaults, keeping the old file as a backup.
pub fn reset_config_at(path: &Path) -> AppResult<Config> {
    if path.exists() {
        let backup_path = path.with_extension("json.reset_backup");
        fs::copy(path, &backup_path)?;
        log::info!("Existing config backed up to {}", backup_path.display());
    }

    let default_config = Config::default();
    save_config_internal(path, &default_config)?;

    log::info!("Configuration reset to defaults");
    Ok(default_config)
}

pub fn validate_config(config: &Config) -> AppResult<()> {
    InputValidator::validate_server_url(&config.server_url)?;
    InputValidator::validate_display_name(&config.display_name)?;

    if config.poll_interval_ms < 100 {
        return Err(AppError::validation(
            "poll_interval_ms",
            "Must be at least 100ms",
        ));
    }

    if config.request_timeout_secs == 0 {
        return Err(AppError::validation(
            "request_timeout_secs",
            "Must be greater than 0",
        ));
    }

    let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
    if !valid_log_levels.contains(&config.log_level.as_str()) {
        return Err(AppError::validation("log_level", "Must be a valid log level"));
    }

    Ok(())
}
