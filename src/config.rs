//! Controller configuration parameters
//!
//! All tunable timing parameters for the relay controller.
//! Values can be overridden through a [`ConfigPort`](crate::app::ports::ConfigPort)
//! (the `thermctl` binary reads a JSON file).

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // --- Reconciler ---
    /// Backstop poll period for the full bulk read (milliseconds)
    pub poll_period_ms: u32,

    // --- Relay actuator ---
    /// Settling delay between two relay writes in one actuation (milliseconds)
    pub relay_step_delay_ms: u32,
    /// Minimum time between two accepted actuations (milliseconds)
    pub min_actuation_period_ms: u32,

    // --- Watchdog ---
    /// Time without contact before the failsafe fires (milliseconds)
    pub watchdog_timeout_ms: u64,
    /// Check cadence is `watchdog_timeout_ms / watchdog_check_divisor`
    pub watchdog_check_divisor: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: 5_000,
            relay_step_delay_ms: 200,
            min_actuation_period_ms: 1_000,
            watchdog_timeout_ms: 3 * 60 * 60 * 1_000, // 3h
            watchdog_check_divisor: 10,
        }
    }
}

impl ControllerConfig {
    /// Reject configurations that would defeat relay protection or stall
    /// the background tasks. Values are never silently clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("poll_period_ms must be > 0"));
        }
        if self.min_actuation_period_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "min_actuation_period_ms must be > 0",
            ));
        }
        if self.relay_step_delay_ms >= self.min_actuation_period_ms {
            return Err(ConfigError::ValidationFailed(
                "relay_step_delay_ms must be shorter than min_actuation_period_ms",
            ));
        }
        if self.watchdog_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("watchdog_timeout_ms must be > 0"));
        }
        if self.watchdog_check_divisor == 0 {
            return Err(ConfigError::ValidationFailed(
                "watchdog_check_divisor must be > 0",
            ));
        }
        if self.watchdog_timeout_ms / u64::from(self.watchdog_check_divisor) == 0 {
            return Err(ConfigError::ValidationFailed(
                "watchdog check cadence rounds down to zero",
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            log::warn!("config parse failed: {}", e);
            ConfigError::Corrupted
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_period_ms))
    }

    pub fn relay_step_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.relay_step_delay_ms))
    }

    pub fn min_actuation_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.min_actuation_period_ms))
    }

    /// Watchdog timing derived from this config.
    pub fn watchdog(&self) -> WatchdogConfig {
        let divisor = u64::from(self.watchdog_check_divisor.max(1));
        WatchdogConfig {
            timeout: Duration::from_millis(self.watchdog_timeout_ms),
            check_interval: Duration::from_millis(self.watchdog_timeout_ms / divisor),
        }
    }
}

/// Timing for the contact watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogConfig {
    /// Contact silence longer than this trips the failsafe.
    pub timeout: Duration,
    /// How often the watchdog task compares the ledger against the clock.
    pub check_interval: Duration,
}

impl WatchdogConfig {
    /// Standard cadence: one check every tenth of the timeout.
    pub fn from_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            check_interval: timeout / 10,
        }
    }
}
