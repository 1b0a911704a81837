//! Configuration loading for the KLAPP client
//!
//! Supports loading account settings from (in order of priority):
//! 1. JSON file (~/.config/ranzen/klapp.json)
//! 2. Runtime environment variables (fallback)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings filename in the Ranzen config directory
const SETTINGS_FILE: &str = "klapp.json";

/// Days of history requested from the server when none is configured
pub const DEFAULT_LOOKBACK_DAYS: u32 = 3;

/// Seconds between scheduled refreshes when none is configured
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Credentials for one KLAPP parent account
#[derive(Debug, Clone)]
pub struct Account {
    pub email: String,
    pub password: String,
}

impl Account {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Settings for the KLAPP poller
#[derive(Debug, Clone, Deserialize)]
pub struct KlappSettings {
    pub email: String,
    pub password: String,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_lookback_days() -> u32 {
    DEFAULT_LOOKBACK_DAYS
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl KlappSettings {
    /// Load settings using the following priority:
    /// 1. JSON file (~/.config/ranzen/klapp.json)
    /// 2. Runtime environment variables
    pub fn load() -> Result<Self> {
        if config::config_exists(SETTINGS_FILE) {
            return config::load_json(SETTINGS_FILE);
        }

        Self::from_env()
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings JSON")
    }

    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        let email =
            std::env::var("KLAPP_EMAIL").context("KLAPP_EMAIL environment variable not set")?;
        let password = std::env::var("KLAPP_PASSWORD")
            .context("KLAPP_PASSWORD environment variable not set")?;

        let lookback_days = match std::env::var("KLAPP_LOOKBACK_DAYS") {
            Ok(raw) => raw.parse().context("KLAPP_LOOKBACK_DAYS is not a number")?,
            Err(_) => DEFAULT_LOOKBACK_DAYS,
        };
        let poll_interval_secs = match std::env::var("KLAPP_POLL_INTERVAL_SECS") {
            Ok(raw) => raw
                .parse()
                .context("KLAPP_POLL_INTERVAL_SECS is not a number")?,
            Err(_) => DEFAULT_POLL_INTERVAL_SECS,
        };

        Ok(Self {
            email,
            password,
            lookback_days,
            poll_interval_secs,
            base_url: std::env::var("KLAPP_BASE_URL").ok(),
        })
    }

    /// Get the default settings file path (~/.config/ranzen/klapp.json)
    pub fn default_settings_path() -> Option<PathBuf> {
        config::config_path(SETTINGS_FILE)
    }

    /// Check if settings are available (file or env vars)
    pub fn is_available() -> bool {
        if config::config_exists(SETTINGS_FILE) {
            return true;
        }
        std::env::var("KLAPP_EMAIL").is_ok() && std::env::var("KLAPP_PASSWORD").is_ok()
    }

    /// The account credentials these settings describe
    pub fn account(&self) -> Account {
        Account::new(&self.email, &self.password)
    }

    /// The scheduled refresh interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let json = r#"{
            "email": "parent@example.com",
            "password": "hunter2",
            "lookback_days": 7,
            "poll_interval_secs": 120,
            "base_url": "https://staging.klapp.mobi"
        }"#;

        let settings = KlappSettings::from_json(json).unwrap();
        assert_eq!(settings.email, "parent@example.com");
        assert_eq!(settings.password, "hunter2");
        assert_eq!(settings.lookback_days, 7);
        assert_eq!(settings.poll_interval_secs, 120);
        assert_eq!(settings.base_url.as_deref(), Some("https://staging.klapp.mobi"));
    }

    #[test]
    fn test_parse_minimal_settings_uses_defaults() {
        let json = r#"{"email": "parent@example.com", "password": "hunter2"}"#;

        let settings = KlappSettings::from_json(json).unwrap();
        assert_eq!(settings.lookback_days, DEFAULT_LOOKBACK_DAYS);
        assert_eq!(settings.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
        assert!(settings.base_url.is_none());
    }

    #[test]
    fn test_missing_credentials_fail() {
        let json = r#"{"email": "parent@example.com"}"#;
        assert!(KlappSettings::from_json(json).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("klapp.json");
        std::fs::write(&path, r#"{"email": "a@b.se", "password": "pw"}"#).unwrap();

        let settings = KlappSettings::from_file(&path).unwrap();
        assert_eq!(settings.email, "a@b.se");
        assert_eq!(settings.account().email, "a@b.se");
    }

    #[test]
    fn test_poll_interval_conversion() {
        let json = r#"{"email": "a@b.se", "password": "pw", "poll_interval_secs": 60}"#;
        let settings = KlappSettings::from_json(json).unwrap();
        assert_eq!(settings.poll_interval(), Duration::from_secs(60));
    }
}
