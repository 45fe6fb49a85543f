//! Configuration resolution for Affiliate Hub.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`<config dir>/affiliate-hub/settings.json`)
//! 3. Environment variables
//! 4. CLI arguments (highest priority, applied by the binary)

use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Complete Affiliate Hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub program: ProgramConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            program: ProgramConfig::default(),
            notifications: NotificationConfig::default(),
            session: SessionConfig::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Affiliate program settings. Fields missing from a settings file keep
/// their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramConfig {
    /// Base URL that tracking links point at.
    pub base_url: String,
    /// Share of the product value paid out as commission.
    pub commission_rate: Decimal,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mysite.com".to_string(),
            commission_rate: dec!(0.30),
        }
    }
}

/// Toast settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// How long a toast stays visible unless dismissed (milliseconds).
    pub default_ttl_ms: u64,
}

impl NotificationConfig {
    pub const fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 5000,
        }
    }
}

/// Session slot settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    /// Override for the session file. Defaults to `~/.affiliate-hub/session.json`.
    pub path: Option<PathBuf>,
}

impl SessionConfig {
    /// The session file to use, if one can be determined.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(default_session_path)
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_config_path()
        && global_path.exists()
    {
        config = load_config_file(&global_path)?;
    }

    apply_env_overrides(&mut config)?;

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("affiliate-hub").join("settings.json"))
}

/// Directory holding per-user state: `~/.affiliate-hub/`.
pub fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".affiliate-hub"))
}

/// Default session file: `~/.affiliate-hub/session.json`.
pub fn default_session_path() -> Option<PathBuf> {
    app_dir().map(|d| d.join("session.json"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let config: Config = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;
    check_rate(config.program.commission_rate)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Ok(val) = std::env::var("AFFILIATE_HUB_BASE_URL") {
        config.program.base_url = val;
    }
    if let Ok(val) = std::env::var("AFFILIATE_HUB_COMMISSION_RATE") {
        config.program.commission_rate = parse_rate(&val)?;
    }
    if let Ok(val) = std::env::var("AFFILIATE_HUB_TOAST_TTL_MS")
        && let Ok(n) = val.parse()
    {
        config.notifications.default_ttl_ms = n;
    }
    if let Ok(val) = std::env::var("AFFILIATE_HUB_SESSION_PATH") {
        config.session.path = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("AFFILIATE_HUB_LOG_LEVEL") {
        config.log_level = val;
    }
    Ok(())
}

/// Parse a commission rate such as `0.25`. Must lie in `[0, 1]`.
pub fn parse_rate(raw: &str) -> Result<Decimal> {
    let rate: Decimal = raw
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid commission rate {raw:?}: {e}")))?;
    check_rate(rate)
}

fn check_rate(rate: Decimal) -> Result<Decimal> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(Error::Config(format!(
            "Commission rate must be between 0 and 1, got {rate}"
        )));
    }
    Ok(rate)
}
