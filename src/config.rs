//! Configuration management for pulsecheck.
//!
//! Settings come from `<data_dir>/config.toml` with environment overrides.
//! The API key is read from `OPENAI_API_KEY` (dotenvy loads `.env` at
//! startup) and never written back to the config file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::llm::LlmConfig;
use crate::rate_limit::RateLimitConfig;

/// Database file name inside the data directory.
const DATABASE_FILE: &str = "pulsecheck.db";

/// Rate limit settings as stored in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Maximum requests per caller per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_max_requests() -> u32 {
    10
}
fn default_window_secs() -> u64 {
    60
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

/// On-disk configuration file shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub llm: LlmConfig,
    pub rate_limit: RateLimitSettings,
}

impl Settings {
    /// Rate limiter config derived from the settings.
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.rate_limit.max_requests,
            window: std::time::Duration::from_secs(self.rate_limit.window_secs),
        }
    }

    /// Path to the config file inside the data directory.
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }
}

/// Resolve the data directory: explicit flag, then PULSECHECK_DATA_DIR,
/// then the platform data dir.
fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = data_dir {
        return dir;
    }
    if let Ok(dir) = std::env::var("PULSECHECK_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .map(|d| d.join("pulsecheck"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Load settings from the data directory and environment.
pub fn load_settings(data_dir: Option<PathBuf>) -> anyhow::Result<Settings> {
    let data_dir = resolve_data_dir(data_dir);

    let config_path = data_dir.join("config.toml");
    let mut config = if config_path.exists() {
        let raw = fs::read_to_string(&config_path)?;
        toml::from_str::<Config>(&raw)?
    } else {
        Config::default()
    };

    // Environment overrides
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            config.llm.api_key = Some(key);
        }
    }
    if let Ok(model) = std::env::var("PULSECHECK_MODEL") {
        if !model.is_empty() {
            config.llm.model = model;
        }
    }

    let database_path = data_dir.join(DATABASE_FILE);

    Ok(Settings {
        data_dir,
        database_path,
        llm: config.llm,
        rate_limit: config.rate_limit,
    })
}

/// Write a default config file if none exists. Returns true if written.
pub fn write_default_config(data_dir: &Path) -> anyhow::Result<bool> {
    let config_path = data_dir.join("config.toml");
    if config_path.exists() {
        return Ok(false);
    }

    fs::create_dir_all(data_dir)?;
    let config = Config::default();
    fs::write(&config_path, toml::to_string_pretty(&config)?)?;
    Ok(true)
}
