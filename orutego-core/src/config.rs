use anyhow::{Context, Result, anyhow, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::model::TravelMode;

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Longest geocode memo lifetime accepted from settings (30 days).
pub const MAX_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Connection settings for the mapping provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Per-call timeout for geocoding, key checks and suggestions.
    pub geocode_timeout_secs: u64,
    /// Per-call timeout for distance and directions lookups.
    pub route_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            geocode_timeout_secs: 10,
            route_timeout_secs: 15,
        }
    }
}

impl ProviderConfig {
    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout_secs)
    }

    pub fn route_timeout(&self) -> Duration {
        Duration::from_secs(self.route_timeout_secs)
    }
}

/// Geocode memoization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 3600, max_entries: 512 }
    }
}

impl CacheConfig {
    /// Memo lifetime, capped at [`MAX_TTL_SECS`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs.min(MAX_TTL_SECS))
    }

    pub fn check_ttl_secs(ttl_secs: u64) -> Result<()> {
        ensure!(
            ttl_secs <= MAX_TTL_SECS,
            "cache.ttl_secs must be at most {MAX_TTL_SECS} (30 days), got {ttl_secs}"
        );
        Ok(())
    }
}

/// Top-level configuration stored on disk.
///
/// The API key is deliberately absent: it lives only in the session.
///
/// Example TOML:
/// ```toml
/// default_mode = "walking"
///
/// [provider]
/// geocode_timeout_secs = 10
/// route_timeout_secs = 15
///
/// [cache]
/// ttl_secs = 3600
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub default_mode: TravelMode,
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
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
            .with_context(|| format!("Invalid settings in config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

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
        let dirs = ProjectDirs::from("dev", "orutego", "orutego")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.provider.base_url.trim().is_empty(),
            "provider.base_url must not be empty"
        );
        ensure!(
            self.provider.geocode_timeout_secs > 0,
            "provider.geocode_timeout_secs must be greater than zero"
        );
        ensure!(
            self.provider.route_timeout_secs > 0,
            "provider.route_timeout_secs must be greater than zero"
        );
        ensure!(self.cache.max_entries > 0, "cache.max_entries must be greater than zero");
        CacheConfig::check_ttl_secs(self.cache.ttl_secs)
    }
}
