use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Sync configuration.
///
/// `interval_hours` is the only externally tunable knob of the engine. Values
/// that are missing, not numeric, or below [`MIN_INTERVAL_HOURS`] fall back to
/// [`DEFAULT_INTERVAL_HOURS`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(
        default = "default_interval_hours",
        deserialize_with = "deserialize_interval_hours"
    )]
    pub interval_hours: f64,
}

pub const DEFAULT_INTERVAL_HOURS: f64 = 6.0;

/// Shortest accepted interval (one minute).
pub const MIN_INTERVAL_HOURS: f64 = 1.0 / 60.0;

fn is_valid_interval(hours: f64) -> bool {
    hours.is_finite() && hours >= MIN_INTERVAL_HOURS
}

impl SyncConfig {
    /// Interval between the end of one cycle and the start of the next.
    ///
    /// Saturates for absurdly large values; a struct built by hand with an
    /// interval under one minute gets the default.
    pub fn interval(&self) -> Duration {
        if !is_valid_interval(self.interval_hours) {
            return Duration::from_secs_f64(DEFAULT_INTERVAL_HOURS * 3600.0);
        }
        Duration::try_from_secs_f64(self.interval_hours * 3600.0).unwrap_or(Duration::MAX)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
        }
    }
}

fn default_interval_hours() -> f64 {
    DEFAULT_INTERVAL_HOURS
}

/// Raw shapes an interval can arrive in (TOML number, or a string from the
/// environment).
#[derive(Deserialize)]
#[serde(untagged)]
enum RawHours {
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn deserialize_interval_hours<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawHours::deserialize(deserializer)?;
    Ok(parse_interval_hours(raw))
}

fn parse_interval_hours(raw: RawHours) -> f64 {
    let parsed = match &raw {
        RawHours::Int(i) => Some(*i as f64),
        RawHours::Float(f) => Some(*f),
        RawHours::Text(s) => s.trim().parse::<f64>().ok(),
        RawHours::Other(_) => None,
    };

    match parsed {
        Some(hours) if is_valid_interval(hours) => hours,
        _ => {
            warn!(
                "Invalid sync.interval_hours, falling back to {} hours",
                DEFAULT_INTERVAL_HOURS
            );
            DEFAULT_INTERVAL_HOURS
        }
    }
}

/// External provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Provider API base URL (default: https://www.episodate.com/api)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.episodate.com/api".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("showsync.db")
}
