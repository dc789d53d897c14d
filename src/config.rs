use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::NOMINATIM_URL;
use crate::error::{Result, ScraperError};

pub const DEFAULT_CONFIG_FILE: &str = "scout.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// Base URL of the external events API (`/targets`, `/events`, `/scout/log`)
    pub api_url: String,
    pub api_token: Option<String>,
    pub geocode_cache_path: PathBuf,
    /// Upload threshold; a batch is flushed once it holds this many events
    pub batch_size: usize,
    pub geocode_delay_ms: u64,
    pub nominatim_url: String,
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub metrics_addr: Option<String>,
    pub crawl: CrawlSettings,
}

/// Timing and bounds for page interaction
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    pub navigation_timeout_ms: u64,
    pub selector_timeout_ms: u64,
    pub scroll_step_px: u32,
    pub max_scroll_steps: u32,
    pub max_scroll_time_ms: u64,
    pub scroll_pause_ms: u64,
    pub settle_delay_ms: u64,
    pub hydration_delay_ms: u64,
    pub pacing_min_ms: u64,
    pub pacing_max_ms: u64,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000/api".to_string(),
            api_token: None,
            geocode_cache_path: PathBuf::from("geocode_cache.json"),
            batch_size: 5,
            geocode_delay_ms: 1100,
            nominatim_url: NOMINATIM_URL.to_string(),
            headless: true,
            chrome_path: None,
            metrics_addr: None,
            crawl: CrawlSettings::default(),
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: 60_000,
            selector_timeout_ms: 15_000,
            scroll_step_px: 400,
            max_scroll_steps: 40,
            max_scroll_time_ms: 20_000,
            scroll_pause_ms: 250,
            settle_delay_ms: 2_000,
            hydration_delay_ms: 1_500,
            pacing_min_ms: 1_000,
            pacing_max_ms: 3_000,
        }
    }
}

impl CrawlSettings {
    /// No waiting at all; used by tests and dry runs against local fixtures
    pub fn immediate() -> Self {
        Self {
            scroll_pause_ms: 0,
            settle_delay_ms: 0,
            hydration_delay_ms: 0,
            pacing_min_ms: 0,
            pacing_max_ms: 0,
            ..Self::default()
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }
}

impl ScoutConfig {
    /// Defaults, then `scout.toml` when present, then environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        let mut config = Self::from_file_or_default(Path::new(DEFAULT_CONFIG_FILE))?;
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(url) = env_var("SCOUT_API_URL") {
            self.api_url = url;
        }
        if let Some(token) = env_var("SCOUT_API_TOKEN") {
            self.api_token = Some(token);
        }
        if let Some(path) = env_var("SCOUT_GEOCODE_CACHE") {
            self.geocode_cache_path = PathBuf::from(path);
        }
        if let Some(size) = env_var("SCOUT_BATCH_SIZE") {
            self.batch_size = parse_env("SCOUT_BATCH_SIZE", &size)?;
        }
        if let Some(delay) = env_var("SCOUT_GEOCODE_DELAY_MS") {
            self.geocode_delay_ms = parse_env("SCOUT_GEOCODE_DELAY_MS", &delay)?;
        }
        if let Some(url) = env_var("SCOUT_NOMINATIM_URL") {
            self.nominatim_url = url;
        }
        if let Some(headless) = env_var("SCOUT_HEADLESS") {
            self.headless = parse_env("SCOUT_HEADLESS", &headless)?;
        }
        if let Some(path) = env_var("CHROME_PATH") {
            self.chrome_path = Some(PathBuf::from(path));
        }
        if let Some(addr) = env_var("SCOUT_METRICS_ADDR") {
            self.metrics_addr = Some(addr);
        }
        if self.batch_size == 0 {
            return Err(ScraperError::Config("batch_size must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn geocode_delay(&self) -> Duration {
        Duration::from_millis(self.geocode_delay_ms)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ScraperError::Config(format!("Invalid value for {}: '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = ScoutConfig::from_file_or_default(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.geocode_delay_ms, 1100);
        assert!(config.headless);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_url = \"https://scout.example/api\"\nbatch_size = 10\n\n[crawl]\nmax_scroll_steps = 5"
        )
        .unwrap();

        let config = ScoutConfig::from_file_or_default(file.path()).unwrap();
        assert_eq!(config.api_url, "https://scout.example/api");
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.crawl.max_scroll_steps, 5);
        assert_eq!(config.crawl.scroll_step_px, 400);
        assert_eq!(config.geocode_cache_path, PathBuf::from("geocode_cache.json"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "batch_size = \"lots\"").unwrap();
        assert!(matches!(
            ScoutConfig::from_file_or_default(file.path()),
            Err(ScraperError::Toml(_))
        ));
    }
}
