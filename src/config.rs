//! Configuration for the booking and settlement core.
//!
//! Supports YAML file and environment variable overrides.

use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Core configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Platform fee configuration.
    pub fees: FeeConfig,
    /// Settlement (scan, capture, retry) configuration.
    pub settlement: SettlementConfig,
    /// Presence scheduler configuration.
    pub scheduler: SchedulerConfig,
}

/// Platform fee configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Platform fee rate in `[0, 1]`.
    pub platform_rate: Decimal,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            // 10%
            platform_rate: Decimal::new(10, 2),
        }
    }
}

/// Settlement configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Minutes before the scheduled start a scan is accepted.
    pub scan_early_grace_minutes: i64,
    /// Minutes after the scheduled start a scan is accepted.
    pub scan_late_grace_minutes: i64,
    /// Maximum age of a QR payload before it is rejected as a replay.
    pub qr_max_age_minutes: i64,
    /// Per-attempt timeout for a payment-capture call.
    pub capture_timeout_secs: u64,
    /// Maximum capture attempts before surfacing failure.
    pub capture_max_attempts: usize,
    /// Minimum backoff delay between capture attempts.
    pub capture_min_delay_ms: u64,
    /// Maximum backoff delay between capture attempts.
    pub capture_max_delay_ms: u64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            scan_early_grace_minutes: 15,
            scan_late_grace_minutes: 120,
            qr_max_age_minutes: 15,
            capture_timeout_secs: 10,
            capture_max_attempts: 3,
            capture_min_delay_ms: 100,
            capture_max_delay_ms: 2000,
        }
    }
}

impl SettlementConfig {
    /// Scan acceptance before the scheduled start.
    pub fn early_grace(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.scan_early_grace_minutes)
    }

    /// Scan acceptance after the scheduled start.
    pub fn late_grace(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.scan_late_grace_minutes)
    }

    /// QR freshness window.
    pub fn qr_max_age(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.qr_max_age_minutes)
    }

    /// Per-attempt capture timeout.
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout_secs)
    }
}

/// Presence scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How often the sweep runs.
    pub tick_interval_secs: u64,
    /// Minutes before the scheduled start a booking shows as "starting".
    pub starting_lead_minutes: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 30,
            starting_lead_minutes: 5,
        }
    }
}

impl SchedulerConfig {
    /// Sweep interval.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Lead window for the "starting" status.
    pub fn starting_lead(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.starting_lead_minutes)
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from file
        let config_path =
            std::env::var("COURTBOOK_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        // Override with environment variables
        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(rate) = std::env::var("COURTBOOK_PLATFORM_RATE") {
            if let Ok(r) = rate.parse() {
                self.fees.platform_rate = r;
            }
        }

        if let Ok(interval) = std::env::var("COURTBOOK_TICK_INTERVAL_SECS") {
            if let Ok(i) = interval.parse() {
                self.scheduler.tick_interval_secs = i;
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}
