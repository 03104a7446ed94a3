//! Rate limiting configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Rate limiting configuration
///
/// Capacities are enforced together: a request is admitted only when the
/// per-second, per-minute and per-hour budgets all have room. Exceeding any
/// of them blocks the client for `block_cooldown_minutes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable admission control
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests allowed per second, per client
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u64,
    /// Requests allowed per minute, per client
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u64,
    /// Requests allowed per hour, per client
    #[serde(default = "default_requests_per_hour")]
    pub requests_per_hour: u64,
    /// Cooldown applied when a budget is exceeded, in minutes
    #[serde(default = "default_block_cooldown_minutes")]
    pub block_cooldown_minutes: u64,
    /// Hours a client may stay idle before its bucket state is reclaimed
    #[serde(default = "default_idle_eviction_hours")]
    pub idle_eviction_hours: u64,
    /// Seconds between background eviction sweeps
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: default_requests_per_second(),
            requests_per_minute: default_requests_per_minute(),
            requests_per_hour: default_requests_per_hour(),
            block_cooldown_minutes: default_block_cooldown_minutes(),
            idle_eviction_hours: default_idle_eviction_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RateLimitConfig {
    /// Merge rate limit configurations (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        if !other.enabled {
            self.enabled = other.enabled;
        }
        if other.requests_per_second != default_requests_per_second() {
            self.requests_per_second = other.requests_per_second;
        }
        if other.requests_per_minute != default_requests_per_minute() {
            self.requests_per_minute = other.requests_per_minute;
        }
        if other.requests_per_hour != default_requests_per_hour() {
            self.requests_per_hour = other.requests_per_hour;
        }
        if other.block_cooldown_minutes != default_block_cooldown_minutes() {
            self.block_cooldown_minutes = other.block_cooldown_minutes;
        }
        if other.idle_eviction_hours != default_idle_eviction_hours() {
            self.idle_eviction_hours = other.idle_eviction_hours;
        }
        if other.sweep_interval_secs != default_sweep_interval_secs() {
            self.sweep_interval_secs = other.sweep_interval_secs;
        }
        self
    }

    /// Validate rate limit configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.requests_per_second == 0 {
            return Err("requests_per_second must be at least 1".to_string());
        }
        if self.requests_per_minute == 0 {
            return Err("requests_per_minute must be at least 1".to_string());
        }
        if self.requests_per_hour == 0 {
            return Err("requests_per_hour must be at least 1".to_string());
        }
        if self.block_cooldown_minutes == 0 {
            return Err("block_cooldown_minutes must be at least 1".to_string());
        }
        if self.idle_eviction_hours == 0 {
            return Err("idle_eviction_hours must be at least 1".to_string());
        }
        if self.sweep_interval_secs == 0 {
            return Err("sweep_interval_secs must be at least 1".to_string());
        }
        Ok(())
    }
}
