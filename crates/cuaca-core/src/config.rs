use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable holding the OpenWeatherMap key.
pub const API_KEY_ENV: &str = "OWM_API_KEY";

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

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Upstream service endpoints
    pub services: ServiceConfig,

    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Optional translation tables loaded into the session
    #[serde(default)]
    pub translations: TranslationConfig,

    /// Map tile settings
    #[serde(default)]
    pub map: MapConfig,

    /// Key-issuing endpoint settings
    #[serde(default)]
    pub keyserver: KeyServerConfig,
}

/// Which administrative-region API backs the province/regency dropdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegionProviderKind {
    /// `{status, result: [{id, text}]}` envelope API
    #[default]
    CloudAlert,
    /// Static JSON files, `[{id, name}]`
    Emsifa,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub region_provider: RegionProviderKind,

    /// Base URL of the region API (must end with `/`)
    pub region_api_url: String,

    /// Nominatim base URL
    pub geocoder_url: String,

    /// OpenWeatherMap base URL
    pub weather_api_url: String,

    /// Same-origin key endpoint. When unset the key comes from
    /// `weather.api_key` or the `OWM_API_KEY` environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_endpoint_url: Option<String>,

    /// Bookmark collection URL (must end with `/`)
    pub bookmark_api_url: String,

    /// User-Agent sent to the geocoder
    pub user_agent: String,

    /// Per-request timeout for every upstream call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// API key (overridden by `OWM_API_KEY` when set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Language for condition descriptions
    pub language: String,

    /// Unit system passed to the provider
    pub units: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            language: "id".to_string(),
            units: "metric".to_string(),
        }
    }
}

impl WeatherConfig {
    /// The configured key, with the environment variable taking precedence.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// JSON object mapping province display names to geocoding names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province_table: Option<PathBuf>,

    /// JSON object mapping provider condition text to display text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_table: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub base_tile_url: String,

    /// Weather overlay template; `{key}` is replaced by the API key
    pub overlay_tile_url: String,

    pub overlay_opacity: f64,

    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            base_tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            overlay_tile_url: "https://tile.openweathermap.org/map/temp_new/{z}/{x}/{y}.png?appid={key}"
                .to_string(),
            overlay_opacity: 0.5,
            zoom: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyServerConfig {
    pub bind_address: String,
}

impl Default for KeyServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cuaca");

        Self {
            config_dir,
            services: ServiceConfig {
                region_provider: RegionProviderKind::CloudAlert,
                region_api_url: "https://alamat.thecloudalert.com/api/".to_string(),
                geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
                weather_api_url: "https://api.openweathermap.org".to_string(),
                key_endpoint_url: None,
                bookmark_api_url: "https://ca691c15a010b4d51f69.free.beeceptor.com/api/bookmarks/"
                    .to_string(),
                user_agent: "Cuaca/0.1.0 (https://github.com/cuaca)".to_string(),
                request_timeout_secs: default_request_timeout_secs(),
            },
            weather: WeatherConfig::default(),
            translations: TranslationConfig::default(),
            map: MapConfig::default(),
            keyserver: KeyServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(
            &self.services.region_api_url,
            "services.region_api_url",
            &mut result,
        );
        self.validate_url(&self.services.geocoder_url, "services.geocoder_url", &mut result);
        self.validate_url(
            &self.services.weather_api_url,
            "services.weather_api_url",
            &mut result,
        );
        self.validate_url(
            &self.services.bookmark_api_url,
            "services.bookmark_api_url",
            &mut result,
        );
        if let Some(key_url) = &self.services.key_endpoint_url {
            self.validate_url(key_url, "services.key_endpoint_url", &mut result);
        }

        // Relative paths are joined onto these, so a missing slash drops a segment
        if !self.services.region_api_url.ends_with('/') {
            result.add_error("services.region_api_url", "URL must end with '/'");
        }
        if !self.services.bookmark_api_url.ends_with('/') {
            result.add_error("services.bookmark_api_url", "URL must end with '/'");
        }

        if self.services.user_agent.trim().is_empty() {
            result.add_error(
                "services.user_agent",
                "Geocoder requires an identifying User-Agent",
            );
        }

        if self.services.request_timeout_secs == 0 {
            result.add_error(
                "services.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        } else if self.services.request_timeout_secs > 300 {
            result.add_warning(
                "services.request_timeout_secs",
                "Request timeout is unusually long (>300s)",
            );
        }

        if self.services.key_endpoint_url.is_none() && self.weather.resolved_api_key().is_none()
        {
            result.add_warning(
                "weather.api_key",
                "No API key configured - weather lookups will fail",
            );
        }

        if !(0.0..=1.0).contains(&self.map.overlay_opacity) {
            result.add_error("map.overlay_opacity", "Opacity must be between 0 and 1");
        }
        if self.map.zoom > 19 {
            result.add_error("map.zoom", "Zoom level must be at most 19");
        }

        for (field, table) in [
            ("translations.province_table", &self.translations.province_table),
            ("translations.condition_table", &self.translations.condition_table),
        ] {
            if let Some(path) = table {
                if !path.exists() {
                    result.add_warning(
                        field,
                        format!("Path does not exist: {}", path.display()),
                    );
                }
            }
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

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("cuaca");

        Ok(config_dir.join("config.toml"))
    }
}
