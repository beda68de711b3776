//! Configuration management for the `stylecast` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::StylecastError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `stylecast` application
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StylecastConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Geocoding provider configuration
    pub geocoding: GeocodingConfig,
    /// Weather provider configuration
    pub weather: WeatherConfig,
    /// Language-model provider configuration
    pub stylist: StylistConfig,
    /// Cache configuration
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the web server binds to
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// Geocoding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL for the geocoding API
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// How many candidate results to request
    #[serde(default = "default_geocoding_result_count")]
    pub result_count: u32,
}

/// Weather provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_weather_max_retries")]
    pub max_retries: u32,
    /// Freshness window for cached responses, in seconds
    #[serde(default = "default_weather_cache_ttl")]
    pub cache_ttl_seconds: u64,
}

/// Language-model provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylistConfig {
    /// API credential. Loadable as absent so the config can be inspected,
    /// but the stylist client refuses to start without it.
    pub api_key: Option<String>,
    /// Base URL for the generative-language API
    #[serde(default = "default_stylist_base_url")]
    pub base_url: String,
    /// Model identifier
    #[serde(default = "default_stylist_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_stylist_temperature")]
    pub temperature: f64,
    /// Request timeout in seconds
    #[serde(default = "default_stylist_timeout")]
    pub timeout_seconds: u32,
}

/// Cache storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_server_port() -> u16 {
    3000
}

fn default_geocoding_base_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_geocoding_result_count() -> u32 {
    5
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_weather_max_retries() -> u32 {
    5
}

fn default_weather_cache_ttl() -> u64 {
    3600
}

fn default_stylist_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_stylist_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_stylist_temperature() -> f64 {
    1.0
}

fn default_stylist_timeout() -> u32 {
    60
}

fn default_cache_location() -> String {
    "~/.cache/stylecast".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            result_count: default_geocoding_result_count(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
            max_retries: default_weather_max_retries(),
            cache_ttl_seconds: default_weather_cache_ttl(),
        }
    }
}

impl Default for StylistConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_stylist_base_url(),
            model: default_stylist_model(),
            temperature: default_stylist_temperature(),
            timeout_seconds: default_stylist_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl StylecastConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment variable overrides, e.g. STYLECAST_STYLIST__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("STYLECAST")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: StylecastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stylecast").join("config.toml"))
    }

    /// Resolve the cache directory, expanding a leading `~`
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        if let Some(rest) = self.cache.location.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.cache.location)
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials.
    ///
    /// Absence is tolerated here so the config stays loadable for
    /// inspection; the stylist client turns a missing key into a hard
    /// startup error.
    pub fn validate_api_keys(&self) -> Result<()> {
        if let Some(api_key) = &self.stylist.api_key {
            if api_key.is_empty() {
                return Err(StylecastError::config(
                    "Stylist API key cannot be empty if provided. Either remove it or provide a valid key."
                ).into());
            }

            if api_key.len() < 8 {
                return Err(StylecastError::config(
                    "Stylist API key appears to be invalid (too short). Please check your API key."
                ).into());
            }

            if api_key.len() > 200 {
                return Err(StylecastError::config(
                    "Stylist API key appears to be invalid (too long). Please check your API key."
                ).into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds == 0 || self.weather.timeout_seconds > 300 {
            return Err(StylecastError::config(
                "Weather API timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        if self.weather.max_retries > 10 {
            return Err(StylecastError::config("Weather API max retries cannot exceed 10").into());
        }

        if self.weather.cache_ttl_seconds == 0 || self.weather.cache_ttl_seconds > 7 * 24 * 3600 {
            return Err(StylecastError::config(
                "Weather cache TTL must be between 1 second and 1 week",
            )
            .into());
        }

        if self.stylist.timeout_seconds == 0 || self.stylist.timeout_seconds > 300 {
            return Err(StylecastError::config(
                "Stylist API timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        if !(0.0..=2.0).contains(&self.stylist.temperature) {
            return Err(StylecastError::config(
                "Stylist sampling temperature must be between 0.0 and 2.0",
            )
            .into());
        }

        if self.geocoding.result_count == 0 || self.geocoding.result_count > 20 {
            return Err(StylecastError::config(
                "Geocoding result count must be between 1 and 20",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(StylecastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(StylecastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Geocoding", &self.geocoding.base_url),
            ("Weather", &self.weather.base_url),
            ("Stylist", &self.stylist.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(StylecastError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
