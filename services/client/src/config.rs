//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use url::Url;

use job_board_core::config::{LISTING_PAGE_SIZE, MESSAGE_PAGE_SIZE, POLLING_INTERVAL};
use job_board_core::ControllerSettings;

/// Production API base, used when `API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://ag1lcrnsga.execute-api.us-east-1.amazonaws.com/dev/api";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: Url,
    pub store_path: PathBuf,
    pub log_level: Level,
    pub polling_interval: Duration,
    pub listing_page_size: usize,
    pub message_page_size: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- API and storage ---
        let api_url_str = lookup("API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(&api_url_str)
            .map_err(|e| ConfigError::InvalidValue("API_URL".to_string(), e.to_string()))?;

        let store_path = lookup("STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./.job-board-store.json"));

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Controller tuning ---
        let polling_interval = match lookup("POLL_INTERVAL_MS") {
            Some(raw) => Duration::from_millis(parse_positive("POLL_INTERVAL_MS", &raw)?),
            None => POLLING_INTERVAL,
        };
        let listing_page_size = match lookup("LISTING_PAGE_SIZE") {
            Some(raw) => parse_positive("LISTING_PAGE_SIZE", &raw)? as usize,
            None => LISTING_PAGE_SIZE,
        };
        let message_page_size = match lookup("MESSAGE_PAGE_SIZE") {
            Some(raw) => parse_positive("MESSAGE_PAGE_SIZE", &raw)? as usize,
            None => MESSAGE_PAGE_SIZE,
        };

        Ok(Self {
            api_url,
            store_path,
            log_level,
            polling_interval,
            listing_page_size,
            message_page_size,
        })
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            listing_page_size: self.listing_page_size,
            message_page_size: self.message_page_size,
            polling_interval: self.polling_interval,
            ..ControllerSettings::default()
        }
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a positive integer", raw),
        )),
    }
}
