use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::retry::RetryPolicy;
use crate::time::YearWindow;

const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const MAX_YEAR_SPAN: u32 = 200;

/// Where the weather backend lives and which paths serve each endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub forecast_path: String,
    pub historical_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            forecast_path: "/query_weather/forecast".to_string(),
            historical_path: "/query_weather/historical".to_string(),
        }
    }
}

/// Nominatim instance and the identification its usage policy asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: format!("checknow/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Extra attempts for transient network failures. 0 disables retrying.
    pub max_retries: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 0,
            retry_initial_delay_ms: 250,
            retry_max_delay_ms: 5000,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            self.retry_initial_delay_ms,
            self.retry_max_delay_ms,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub years_back: u32,
    pub years_ahead: u32,
    /// Delay before results are brought into view, so layout can settle.
    pub scroll_delay_ms: u64,
    /// Send geocoded coordinates instead of the text fields.
    pub send_resolved_coordinates: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            years_back: 40,
            years_ahead: 5,
            scroll_delay_ms: 200,
            send_resolved_coordinates: false,
        }
    }
}

impl SearchConfig {
    pub fn year_window(&self) -> YearWindow {
        YearWindow { years_back: self.years_back, years_ahead: self.years_ahead }
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Zoom used whenever the view recenters on a selection.
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self { zoom: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [backend]
/// base_url = "http://localhost:8000"
///
/// [http]
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub geocoder: GeocoderConfig,
    pub http: HttpConfig,
    pub search: SearchConfig,
    pub map: MapConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

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

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "check-now", "checknow")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        validate_http_url("backend.base_url", &self.backend.base_url)?;
        validate_http_url("geocoder.base_url", &self.geocoder.base_url)?;

        for (field, value) in [
            ("backend.forecast_path", &self.backend.forecast_path),
            ("backend.historical_path", &self.backend.historical_path),
        ] {
            if !value.starts_with('/') {
                bail!("{field} must start with '/', got '{value}'");
            }
        }

        if self.geocoder.user_agent.trim().is_empty() {
            bail!("geocoder.user_agent cannot be empty");
        }
        if self.http.timeout_secs == 0 || self.http.timeout_secs > 300 {
            bail!("http.timeout_secs must be between 1 and 300");
        }
        if self.http.max_retries > 10 {
            bail!("http.max_retries cannot exceed 10");
        }
        if self.search.years_back > MAX_YEAR_SPAN || self.search.years_ahead > MAX_YEAR_SPAN {
            bail!("search.years_back and search.years_ahead cannot exceed {MAX_YEAR_SPAN}");
        }
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                VALID_LOG_LEVELS.join(", ")
            );
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).with_context(|| format!("{field} is not a valid URL: {value}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("{field} must use http or https, got '{}'", url.scheme());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_backend_and_nominatim() {
        let cfg = Config::default();

        assert_eq!(cfg.backend.base_url, "http://localhost:8000");
        assert_eq!(cfg.geocoder.base_url, "https://nominatim.openstreetmap.org");
        assert_eq!(cfg.search.years_back, 40);
        assert_eq!(cfg.search.years_ahead, 5);
        assert_eq!(cfg.search.scroll_delay(), Duration::from_millis(200));
        assert_eq!(cfg.http.max_retries, 0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let cfg: Config = toml::from_str(
            r#"
            [backend]
            base_url = "http://weather.internal:9000"

            [search]
            years_ahead = 2
            "#,
        )
        .expect("partial config must parse");

        assert_eq!(cfg.backend.base_url, "http://weather.internal:9000");
        assert_eq!(cfg.backend.forecast_path, "/query_weather/forecast");
        assert_eq!(cfg.search.years_ahead, 2);
        assert_eq!(cfg.search.years_back, 40);
    }

    #[test]
    fn rejects_non_http_backend() {
        let mut cfg = Config::default();
        cfg.backend.base_url = "ftp://localhost".into();

        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn rejects_path_without_leading_slash() {
        let mut cfg = Config::default();
        cfg.backend.historical_path = "history".into();

        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_oversized_year_window() {
        let mut cfg = Config::default();
        cfg.search.years_ahead = 2_147_483_647;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("years_ahead"));

        let mut cfg = Config::default();
        cfg.search.years_back = 201;
        assert!(cfg.validate().is_err());

        cfg.search.years_back = 200;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut cfg = Config::default();
        cfg.logging.level = "loud".into();

        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.http.timeout_secs = 12;
        cfg.map.zoom = 8;
        cfg.save_to(&path).expect("save must succeed");

        let loaded = Config::load_from(&path).expect("load must succeed");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(cfg, Config::default());
    }
}
