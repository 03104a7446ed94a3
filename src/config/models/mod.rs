//! Configuration data models
//!
//! This module defines all configuration structures used throughout the
//! gateway.

pub mod gateway;
pub mod rate_limit;
pub mod server;

// Re-export all configuration types
pub use gateway::*;
pub use rate_limit::*;
pub use server::*;

/// Default values for configuration
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    8080
}

pub fn default_true() -> bool {
    true
}

pub fn default_requests_per_second() -> u64 {
    200
}

pub fn default_requests_per_minute() -> u64 {
    1000
}

pub fn default_requests_per_hour() -> u64 {
    6000
}

pub fn default_block_cooldown_minutes() -> u64 {
    1
}

pub fn default_idle_eviction_hours() -> u64 {
    24 // one day without requests and a client's buckets are reclaimed
}

pub fn default_sweep_interval_secs() -> u64 {
    60
}
