use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Highest zoom level the tile layer serves.
pub const MAX_TILE_ZOOM: u8 = 22;

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

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
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

    /// Hosted database (PostgREST) settings
    pub supabase: SupabaseConfig,

    /// Map, script and places settings
    #[serde(default)]
    pub maps: MapsConfig,

    /// Weather widget settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Location list behaviour
    #[serde(default)]
    pub locations: LocationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. https://xyz.supabase.co
    pub url: String,

    /// Anon/service key sent as `apikey` and bearer token
    pub key: String,

    /// Table holding the locations
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    "locations".to_string()
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key: String::new(),
            table: default_table(),
        }
    }
}

impl SupabaseConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.key.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsConfig {
    /// Maps/places API key
    #[serde(default)]
    pub api_key: String,

    /// Script resource that provides the places library
    #[serde(default = "default_script_url")]
    pub script_url: String,

    /// Places web service root
    #[serde(default = "default_places_url")]
    pub places_url: String,

    /// Zoom clamp used when fitting search results
    #[serde(default = "default_search_max_zoom")]
    pub search_max_zoom: u8,

    /// Padding in pixels around fitted search results
    #[serde(default = "default_fit_padding")]
    pub fit_padding_px: u32,

    /// Zoom applied when a stored location is selected
    #[serde(default = "default_selection_zoom")]
    pub selection_zoom: u8,

    /// Initial map center as [lat, lon]
    #[serde(default = "default_center")]
    pub default_center: [f64; 2],

    /// Initial zoom level
    #[serde(default = "default_zoom")]
    pub default_zoom: u8,
}

fn default_script_url() -> String {
    "https://maps.googleapis.com/maps/api/js".to_string()
}

fn default_places_url() -> String {
    "https://maps.googleapis.com/maps/api/place".to_string()
}

fn default_search_max_zoom() -> u8 {
    15
}

fn default_fit_padding() -> u32 {
    50
}

fn default_selection_zoom() -> u8 {
    15
}

fn default_center() -> [f64; 2] {
    [39.473040, -0.371475]
}

fn default_zoom() -> u8 {
    13
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            script_url: default_script_url(),
            places_url: default_places_url(),
            search_max_zoom: default_search_max_zoom(),
            fit_padding_px: default_fit_padding(),
            selection_zoom: default_selection_zoom(),
            default_center: default_center(),
            default_zoom: default_zoom(),
        }
    }
}

impl MapsConfig {
    /// Script URL carrying the API key and the places library parameter.
    pub fn script_url_with_key(&self) -> Result<Url> {
        Url::parse_with_params(
            &self.script_url,
            &[("key", self.api_key.as_str()), ("libraries", "places")],
        )
        .with_context(|| format!("Invalid maps script URL: {}", self.script_url))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// AEMET OpenData API key
    #[serde(default)]
    pub api_key: String,

    /// AEMET OpenData API root
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Municipality code for the daily forecast (Valencia)
    #[serde(default = "default_municipality")]
    pub municipality_id: String,

    /// Refresh interval in seconds
    #[serde(default = "default_refresh_seconds")]
    pub refresh_seconds: u64,
}

fn default_weather_base_url() -> String {
    "https://opendata.aemet.es/opendata/api".to_string()
}

fn default_municipality() -> String {
    "46250".to_string()
}

fn default_refresh_seconds() -> u64 {
    300
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_weather_base_url(),
            municipality_id: default_municipality(),
            refresh_seconds: default_refresh_seconds(),
        }
    }
}

/// Which rows are re-read after a successful delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RefreshScope {
    /// The whole table
    #[default]
    All,
    /// Only rows sharing the deleted location's province
    Province,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationsConfig {
    #[serde(default)]
    pub refresh_scope: RefreshScope,
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("locamap");

        Self {
            config_dir,
            supabase: SupabaseConfig::default(),
            maps: MapsConfig::default(),
            weather: WeatherConfig::default(),
            locations: LocationsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist.
    ///
    /// Secrets from the environment (`SUPABASE_URL`, `SUPABASE_KEY`,
    /// `MAPS_KEY`, `AEMET_KEY`) override the file and are never written back.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from an explicit path, creating it with defaults if missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let mut config = Self::default();
            if let Some(parent) = path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Replace secrets with non-empty values returned by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = fetch("SUPABASE_URL") {
            self.supabase.url = url;
        }
        if let Some(key) = fetch("SUPABASE_KEY") {
            self.supabase.key = key;
        }
        if let Some(key) = fetch("MAPS_KEY") {
            self.maps.api_key = key;
        }
        if let Some(key) = fetch("AEMET_KEY") {
            self.weather.api_key = key;
        }
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        // Hosted database
        if self.supabase.url.is_empty() {
            result.add_warning("supabase.url", "Database URL not configured");
        } else {
            self.validate_url(&self.supabase.url, "supabase.url", &mut result);
        }
        if self.supabase.key.is_empty() {
            result.add_warning("supabase.key", "Database key not configured");
        }
        if self.supabase.table.trim().is_empty() {
            result.add_error("supabase.table", "Table name must not be empty");
        }

        // Maps
        self.validate_url(&self.maps.script_url, "maps.script_url", &mut result);
        self.validate_url(&self.maps.places_url, "maps.places_url", &mut result);
        if self.maps.api_key.is_empty() {
            result.add_warning("maps.api_key", "Maps key not configured - search unavailable");
        }
        if self.maps.default_zoom > MAX_TILE_ZOOM {
            result.add_error(
                "maps.default_zoom",
                format!("Zoom must be at most {}", MAX_TILE_ZOOM),
            );
        }
        if self.maps.selection_zoom > MAX_TILE_ZOOM {
            result.add_error(
                "maps.selection_zoom",
                format!("Zoom must be at most {}", MAX_TILE_ZOOM),
            );
        }
        if self.maps.search_max_zoom > MAX_TILE_ZOOM {
            result.add_warning(
                "maps.search_max_zoom",
                format!(
                    "Clamp {} is above the highest tile zoom ({}) and has no effect",
                    self.maps.search_max_zoom, MAX_TILE_ZOOM
                ),
            );
        }
        let [lat, lon] = self.maps.default_center;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            result.add_error("maps.default_center", "Center must be a valid [lat, lon] pair");
        }

        // Weather
        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);
        if self.weather.api_key.is_empty() {
            result.add_warning("weather.api_key", "Weather key not configured - fallback data only");
        }
        if self.weather.refresh_seconds == 0 {
            result.add_warning("weather.refresh_seconds", "Weather refresh disabled (0 seconds)");
        } else if self.weather.refresh_seconds > 86_400 {
            result.add_warning(
                "weather.refresh_seconds",
                "Weather refresh interval is more than 24 hours",
            );
        }

        result
    }

    /// Validate a URL field
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
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("locamap");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        // Unconfigured secrets are warnings only
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.iter().any(|w| w.field == "supabase.url"));
        assert!(result.warnings.iter().any(|w| w.field == "maps.api_key"));
    }

    #[test]
    fn test_invalid_supabase_url() {
        let mut config = Config::default();
        config.supabase.url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "supabase.url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.weather.base_url = "ftp://opendata.aemet.es".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_legacy_max_zoom_is_warning() {
        let mut config = Config::default();
        config.maps.search_max_zoom = 45;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "maps.search_max_zoom"));
    }

    #[test]
    fn test_selection_zoom_out_of_range() {
        let mut config = Config::default();
        config.maps.selection_zoom = 30;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "maps.selection_zoom"));
    }

    #[test]
    fn test_zero_refresh_is_warning() {
        let mut config = Config::default();
        config.weather.refresh_seconds = 0;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.refresh_seconds"));
    }

    #[test]
    fn test_env_overrides_ignore_blank_values() {
        let mut config = Config::default();
        config.supabase.key = "from-file".to_string();
        config.apply_overrides(|name| match name {
            "SUPABASE_URL" => Some("https://demo.supabase.co".to_string()),
            "SUPABASE_KEY" => Some("   ".to_string()),
            "MAPS_KEY" => Some("maps-key".to_string()),
            _ => None,
        });
        assert_eq!(config.supabase.url, "https://demo.supabase.co");
        assert_eq!(config.supabase.key, "from-file");
        assert_eq!(config.maps.api_key, "maps-key");
        assert!(config.weather.api_key.is_empty());
    }

    #[test]
    fn test_script_url_carries_key_and_library() {
        let mut config = Config::default();
        config.maps.api_key = "abc".to_string();
        let url = config.maps.script_url_with_key().unwrap();
        assert_eq!(
            url.as_str(),
            "https://maps.googleapis.com/maps/api/js?key=abc&libraries=places"
        );
    }

    #[test]
    fn test_load_from_creates_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let created = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.config_dir, dir.path());
        assert_eq!(created.maps.search_max_zoom, 15);

        let mut edited = created.clone();
        edited.locations.refresh_scope = RefreshScope::Province;
        edited.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.locations.refresh_scope, RefreshScope::Province);
        assert_eq!(reloaded.weather.municipality_id, "46250");
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "config_dir = \"/tmp/locamap\"\n\n[supabase]\nurl = \"https://x.supabase.co\"\nkey = \"k\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.supabase.table, "locations");
        assert_eq!(config.weather.refresh_seconds, 300);
        assert_eq!(config.maps.default_center, [39.473040, -0.371475]);
        assert_eq!(config.locations.refresh_scope, RefreshScope::All);
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
}
