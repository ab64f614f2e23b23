use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides `weather.api_key`.
pub const API_KEY_ENV: &str = "METEO_OWM_API_KEY";

const APP_DIR_NAME: &str = "meteo";
const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_FILE_NAME: &str = "meteo.log";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config, preferences and logs. Not persisted.
    #[serde(skip)]
    pub config_dir: PathBuf,

    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key. Leave empty and set `METEO_OWM_API_KEY` instead
    /// to keep the credential out of the file.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the provider's 2.5 API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request network timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// IANA zone used to display forecast times
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_timezone() -> String {
    "Africa/Casablanca".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            timezone: default_timezone(),
        }
    }
}

impl WeatherConfig {
    /// API key from the environment, falling back to the config file.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.file_api_key())
    }

    fn file_api_key(&self) -> Option<String> {
        let key = self.api_key.trim();
        (!key.is_empty()).then(|| key.to_string())
    }

    pub fn display_timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Redraw/spinner interval of the event loop
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

fn default_tick_millis() -> u64 {
    120
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME);

        Self {
            config_dir,
            weather: WeatherConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the platform config directory, creating a
    /// default file if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_dir()?)
    }

    /// Load configuration from `dir/config.toml`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            let config = Self {
                config_dir: dir.to_path_buf(),
                ..Self::default()
            };
            config.save()?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;
        config.config_dir = dir.to_path_buf();

        Ok(config)
    }

    /// Validate, failing on errors and logging warnings
    pub fn ensure_valid(&self) -> Result<ValidationResult, ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(validation)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        } else if self.weather.timeout_secs > 60 {
            result.add_warning(
                "weather.timeout_secs",
                "Timeout is unusually long (>60 seconds)",
            );
        }

        if let Err(e) = self.weather.display_timezone() {
            result.add_error("weather.timezone", e.to_string());
        }

        if self.weather.resolved_api_key().is_none() {
            result.add_warning(
                "weather.api_key",
                format!("No API key configured (set {} or weather.api_key)", API_KEY_ENV),
            );
        }

        if self.ui.tick_millis == 0 {
            result.add_error("ui.tick_millis", "Tick interval must be greater than 0");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to `config_dir/config.toml`
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(self.config_dir.join(CONFIG_FILE_NAME), contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Log file written by the tracing subscriber
    pub fn log_path(&self) -> PathBuf {
        self.config_dir.join(LOG_FILE_NAME)
    }

    fn default_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(APP_DIR_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> Config {
        let mut config = Config::default();
        config.weather.api_key = "test-key".to_string();
        config
    }

    #[test]
    fn test_valid_default_config() {
        let result = config_with_key().validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_url() {
        let mut config = config_with_key();
        config.weather.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = config_with_key();
        config.weather.base_url = "ftp://api.openweathermap.org".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_timeout_is_error() {
        let mut config = config_with_key();
        config.weather.timeout_secs = 0;
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "weather.timeout_secs"));
    }

    #[test]
    fn test_long_timeout_is_warning() {
        let mut config = config_with_key();
        config.weather.timeout_secs = 120;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.timeout_secs"));
    }

    #[test]
    fn test_unknown_timezone() {
        let mut config = config_with_key();
        config.weather.timezone = "Mars/Olympus_Mons".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "weather.timezone"));
    }

    #[test]
    fn test_default_timezone_parses() {
        let tz = WeatherConfig::default().display_timezone().unwrap();
        assert_eq!(tz, chrono_tz::Africa::Casablanca);
    }

    #[test]
    fn test_blank_file_key_is_not_a_key() {
        let weather = WeatherConfig {
            api_key: "   ".to_string(),
            ..WeatherConfig::default()
        };
        assert_eq!(weather.file_api_key(), None);
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();

        assert_eq!(config.config_dir, dir.path());
        assert_eq!(config.weather.timezone, "Africa/Casablanca");
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_load_from_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[weather]\napi_key = \"abc\"\ntimeout_secs = 15\n",
        )
        .unwrap();

        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.weather.api_key, "abc");
        assert_eq!(config.weather.timeout_secs, 15);
        assert_eq!(config.ui.tick_millis, 120);
    }

    #[test]
    fn test_load_from_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[weather\n").unwrap();
        assert!(Config::load_from(dir.path()).is_err());
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }

    #[test]
    fn test_ensure_valid_reports_invalid_config() {
        let mut config = config_with_key();
        config.ui.tick_millis = 0;

        match config.ensure_valid() {
            Err(ConfigError::Invalid(summary)) => assert!(summary.contains("ui.tick_millis")),
            other => panic!("expected invalid config, got {other:?}"),
        }
        assert!(config_with_key().ensure_valid().is_ok());
    }

    #[test]
    fn test_units_and_language_are_not_configurable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[weather]\nunits = \"imperial\"\nlanguage = \"en\"\n",
        )
        .unwrap();

        let config = Config::load_from(dir.path()).unwrap();
        let written = toml::to_string(&config).unwrap();
        assert!(!written.contains("imperial"));
        assert!(!written.contains("units"));
        assert!(!written.contains("language"));
    }
}
