use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::{error::WeatherError, model::Coordinates};

/// Environment variable that overrides the API key from the config file.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Value shipped in sample configs; treated the same as a missing key.
pub const API_KEY_PLACEHOLDER: &str = "your_api_key_here";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyStatus {
    Configured,
    Missing,
    Placeholder,
}

/// What to do when the API key is not configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Fail with [`WeatherError::Configuration`].
    Strict,
    /// Log a warning and carry on.
    Lenient,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
///
/// [home]
/// lat = 59.91
/// lon = 10.75
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,

    /// Override for the upstream base URL, e.g. for a proxy.
    pub base_url: Option<String>,

    /// Coordinates reported as "current location".
    pub home: Option<Coordinates>,

    /// Key taken from the environment; never written back to disk.
    #[serde(skip)]
    pub env_api_key: Option<String>,
}

impl Config {
    /// Load config from disk (or defaults if it doesn't exist yet) and apply
    /// the environment override for the API key.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let cfg = Self::load_from(&path)?;
        Ok(cfg.with_env_api_key(std::env::var(API_KEY_ENV).ok()))
    }

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

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

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

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-dashboard", "weather-dash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the persisted preferences (units, recent searches).
    pub fn preferences_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("preferences.json"))
    }

    pub fn with_env_api_key(mut self, value: Option<String>) -> Self {
        self.env_api_key = value.filter(|v| !v.trim().is_empty());
        self
    }

    /// The key in effect: environment first, then the config file.
    pub fn api_key(&self) -> Option<&str> {
        self.env_api_key.as_deref().or(self.api_key.as_deref()).map(str::trim)
    }

    pub fn api_key_status(&self) -> ApiKeyStatus {
        match self.api_key() {
            None | Some("") => ApiKeyStatus::Missing,
            Some(API_KEY_PLACEHOLDER) => ApiKeyStatus::Placeholder,
            Some(_) => ApiKeyStatus::Configured,
        }
    }

    /// Returns the usable API key or a configuration error.
    pub fn require_api_key(&self) -> Result<String, WeatherError> {
        match (self.api_key_status(), self.api_key()) {
            (ApiKeyStatus::Configured, Some(key)) => Ok(key.to_string()),
            (ApiKeyStatus::Placeholder, _) => Err(WeatherError::Configuration(format!(
                "The API key is still the placeholder value. \
                 Set {API_KEY_ENV} or run `weather-dash configure`."
            ))),
            _ => Err(WeatherError::Configuration(format!(
                "No API key configured. Set {API_KEY_ENV} or run `weather-dash configure`."
            ))),
        }
    }

    pub fn validate(&self, mode: ValidationMode) -> Result<(), WeatherError> {
        match (self.require_api_key(), mode) {
            (Ok(_), _) => Ok(()),
            (Err(err), ValidationMode::Strict) => Err(err),
            (Err(err), ValidationMode::Lenient) => {
                tracing::warn!("{err}");
                Ok(())
            }
        }
    }

    /// Convenience helper: set/replace the API key stored in the file.
    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_not_configured() {
        let cfg = Config::default();
        assert_eq!(cfg.api_key_status(), ApiKeyStatus::Missing);

        let err = cfg.require_api_key().unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn placeholder_key_is_not_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key(API_KEY_PLACEHOLDER.into());

        assert_eq!(cfg.api_key_status(), ApiKeyStatus::Placeholder);
        assert!(matches!(cfg.require_api_key(), Err(WeatherError::Configuration(_))));
    }

    #[test]
    fn blank_key_is_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());
        assert_eq!(cfg.api_key_status(), ApiKeyStatus::Missing);
    }

    #[test]
    fn env_key_overrides_file_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());
        let cfg = cfg.with_env_api_key(Some("ENV_KEY".into()));

        assert_eq!(cfg.require_api_key().unwrap(), "ENV_KEY");

        let cfg = cfg.with_env_api_key(Some(String::new()));
        assert_eq!(cfg.require_api_key().unwrap(), "FILE_KEY");
    }

    #[test]
    fn lenient_validation_only_warns() {
        let cfg = Config::default();
        assert!(cfg.validate(ValidationMode::Lenient).is_ok());
        assert!(cfg.validate(ValidationMode::Strict).is_err());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_and_load_keep_file_fields_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config {
            home: Some(Coordinates::new(59.91, 10.75)),
            ..Config::default()
        };
        cfg.set_api_key("FILE_KEY".into());
        let cfg = cfg.with_env_api_key(Some("ENV_KEY".into()));
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("FILE_KEY"));
        assert_eq!(loaded.env_api_key, None);
        assert_eq!(loaded.home, Some(Coordinates::new(59.91, 10.75)));
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
