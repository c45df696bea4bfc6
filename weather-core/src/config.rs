use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

/// Environment variable that takes precedence over the stored API key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_DATABASE_PATH: &str = "data/weather.db";
pub const DEFAULT_TRACKED_CITIES: &[&str] = &["London", "New York", "Tokyo", "Paris", "Sydney"];

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// database_path = "data/weather.db"
/// tracked_cities = ["London", "Tokyo"]
/// request_delay_secs = 1
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather API key. `WEATHER_API_KEY` overrides it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub base_url: String,

    /// Relative paths resolve against the working directory.
    pub database_path: PathBuf,

    pub tracked_cities: Vec<String>,

    /// Pause between two city requests in one pipeline run.
    pub request_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            tracked_cities: DEFAULT_TRACKED_CITIES.iter().map(|c| c.to_string()).collect(),
            request_delay_secs: 1,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key from the environment, falling back to the stored one.
    pub fn resolved_api_key(&self) -> Option<String> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        pick_api_key(from_env.as_deref(), self.api_key.as_deref())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }
}

fn pick_api_key(from_env: Option<&str>, stored: Option<&str>) -> Option<String> {
    [from_env, stored]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_track_five_cities() {
        let cfg = Config::default();

        assert_eq!(cfg.tracked_cities, ["London", "New York", "Tokyo", "Paris", "Sydney"]);
        assert_eq!(cfg.database_path, PathBuf::from("data/weather.db"));
        assert_eq!(cfg.request_delay(), Duration::from_secs(1));
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let cfg = Config::from_toml("tracked_cities = [\"Oslo\"]\nrequest_delay_secs = 3\n")
            .expect("valid toml");

        assert_eq!(cfg.tracked_cities, ["Oslo"]);
        assert_eq!(cfg.request_delay_secs, 3);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn toml_roundtrip_preserves_api_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("  KEY  ".into());

        let text = toml::to_string_pretty(&cfg).expect("serializes");
        let parsed = Config::from_toml(&text).expect("parses");

        assert_eq!(parsed, cfg);
        assert_eq!(parsed.api_key.as_deref(), Some("KEY"));
    }

    #[test]
    fn env_key_wins_over_stored_key() {
        assert_eq!(pick_api_key(Some("ENV"), Some("FILE")).as_deref(), Some("ENV"));
    }

    #[test]
    fn blank_keys_count_as_missing() {
        assert_eq!(pick_api_key(Some("   "), Some("FILE")).as_deref(), Some("FILE"));
        assert_eq!(pick_api_key(Some(""), None), None);
        assert_eq!(pick_api_key(None, None), None);
    }
}
