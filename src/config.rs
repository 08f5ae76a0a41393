use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow, Context};

use crate::platform::{self, DEFAULT_PLATFORM};

/// Flask's default address, where the KMS backend runs in development.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

pub const SERVER_URL_ENV: &str = "KMS_SERVER_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub server_url: Option<String>,
    pub platform: Option<String>,
    pub platforms: Option<Vec<String>>,
    pub request_timeout_secs: Option<u64>,
    /// Set from the command line; beats both the environment and the file.
    #[serde(skip)]
    pub server_override: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            server_url: Some(DEFAULT_SERVER_URL.to_string()),
            platform: Some(DEFAULT_PLATFORM.to_string()),
            platforms: Some(platform::default_platforms()),
            request_timeout_secs: None,
            server_override: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Server URL: command line, then environment, then the config file,
    /// then the default.
    pub fn server_url(&self) -> String {
        self.resolve_server_url(std::env::var(SERVER_URL_ENV).ok())
    }

    fn resolve_server_url(&self, env_value: Option<String>) -> String {
        self.server_override
            .clone()
            .or(env_value)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.server_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }

    /// Configured platform list. An explicit empty list disables the selector.
    pub fn platforms(&self) -> Vec<String> {
        self.platforms
            .clone()
            .unwrap_or_else(platform::default_platforms)
    }

    /// Select `platform`, adding it to a non-empty list that lacks it so the
    /// selector can still show it.
    pub fn prefer_platform(&mut self, platform: &str) {
        self.platform = Some(platform.to_string());

        let mut platforms = self.platforms();
        if !platforms.is_empty() && !platforms.iter().any(|p| p.eq_ignore_ascii_case(platform)) {
            platforms.push(platform.to_string());
            self.platforms = Some(platforms);
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Fails on settings the client cannot start with.
    pub fn validate(&self) -> Result<()> {
        let url = self.server_url();
        let parsed = reqwest::Url::parse(&url)
            .map_err(|e| anyhow!("Invalid server URL '{}': {}", url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!("Server URL '{}' must use http or https", url));
        }
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("kms-chat").join("config.json"))
    }
}
