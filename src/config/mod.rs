use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::{FeedSpec, WeatherLocation};
use crate::errors::{DigestError, DigestResult};

/// Content of the sources file. Everything defaults to empty so a partial
/// file still loads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sources {
    #[serde(default)]
    pub feeds: Vec<FeedSpec>,
    #[serde(default)]
    pub weather_locations: Vec<WeatherLocation>,
    #[serde(default)]
    pub gas_cities: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub sources: Sources,
    pub output_dir: PathBuf,
    pub gas_cache_path: PathBuf,

    pub news_api_key: Option<String>,
    pub calendarific_api_key: Option<String>,
    pub checkiday_api_key: Option<String>,
    pub gas_api_key: Option<String>,

    pub window_hours: i64,
    pub max_per_source: usize,
    pub max_total: usize,
    pub retention_days: u32,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> DigestResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        let db_path = std::env::var("DIGESTER_DB_PATH").unwrap_or_else(|_| {
            exe_dir
                .as_ref()
                .map(|d| d.join("digester.db").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./digester.db".to_string())
        });

        let sources_path = std::env::var("DIGESTER_SOURCES")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("sources.json"));
        let sources = Self::load_sources(&sources_path)?;

        let output_dir = std::env::var("DIGESTER_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("output"));

        let gas_cache_path = std::env::var("DIGESTER_GAS_CACHE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/gas_prices_cache.json"));

        Ok(Self {
            db_path,
            sources,
            output_dir,
            gas_cache_path,
            news_api_key: optional_env("NEWS_API_KEY"),
            calendarific_api_key: optional_env("CALENDARIFIC_API_KEY"),
            checkiday_api_key: optional_env("CHECKIDAY_API_KEY"),
            gas_api_key: optional_env("GAS_API_KEY"),
            window_hours: numeric_env("DIGESTER_WINDOW_HOURS", 24),
            max_per_source: numeric_env("DIGESTER_MAX_PER_SOURCE", 6),
            max_total: numeric_env("DIGESTER_MAX_TOTAL", 24),
            retention_days: numeric_env("DIGESTER_RETENTION_DAYS", 90),
        })
    }

    /// Read and parse the sources file. A missing file yields an empty
    /// source set; validation reports it separately.
    fn load_sources(path: &PathBuf) -> DigestResult<Sources> {
        if !path.exists() {
            return Ok(Sources::default());
        }
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            DigestError::Config(format!("invalid sources file {}: {}", path.display(), e))
        })
    }

    /// Collect configuration problems worth refusing to run over.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.sources.feeds.is_empty() {
            errors.push("no feed sources configured (set DIGESTER_SOURCES)".to_string());
        }
        if self.max_per_source == 0 || self.max_total == 0 {
            errors.push("selection caps must be positive".to_string());
        }
        if self.window_hours <= 0 {
            errors.push("recency window must be positive".to_string());
        }
        errors
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn numeric_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
