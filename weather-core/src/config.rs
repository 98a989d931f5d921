use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{dashboard::RacePolicy, model::Coordinates};

pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_FALLBACK_CITY: &str = "Delhi";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// fallback_city = "Delhi"
/// race_policy = "last_response_wins"
///
/// [location]
/// latitude = 28.61
/// longitude = 77.21
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather API key. `OPENWEATHER_API_KEY` takes precedence when set.
    pub api_key: Option<String>,

    pub base_url: String,

    /// City queried when no position is available.
    pub fallback_city: String,

    pub race_policy: RacePolicy,

    /// Position reported as "your location" when none is given on the command line.
    pub location: Option<Coordinates>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            fallback_city: DEFAULT_FALLBACK_CITY.to_string(),
            race_policy: RacePolicy::default(),
            location: None,
        }
    }
}

impl Config {
    /// Load config from the platform config dir and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
        Ok(cfg)
    }

    /// Load config from `path`, or return an empty default if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config dir.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dashboard", "weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// A non-blank value replaces whatever key came from the file.
    pub fn apply_api_key_override(&mut self, value: Option<String>) {
        if let Some(key) = value.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    /// Returns the API key, if present.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key().ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: run `weather configure` or set {API_KEY_ENV}."
            )
        })
    }
}
