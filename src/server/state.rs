//! Application state shared across HTTP handlers
//!
//! This module provides the AppState struct and its implementations.

use crate::config::Config;
use crate::core::admission::AdmissionControl;
use crate::server::routes::accounts::AccountRegistry;
use std::sync::Arc;

/// HTTP server state shared across handlers
///
/// This struct contains shared resources that need to be accessed across
/// multiple request handlers and middleware. All fields are wrapped in Arc
/// for efficient sharing across threads. The admission controller lives
/// here, never in a process global, so independent server instances (and
/// tests) get independent rate-limit state.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration (shared read-only)
    pub config: Arc<Config>,
    /// Admission control: per-client budgets and the cooldown blocklist
    pub admission: Arc<AdmissionControl>,
    /// In-memory account registry backing the demonstration API
    pub accounts: Arc<AccountRegistry>,
}

impl AppState {
    /// Create a new AppState with shared resources
    pub fn new(config: Config, admission: AdmissionControl, accounts: AccountRegistry) -> Self {
        Self {
            config: Arc::new(config),
            admission: Arc::new(admission),
            accounts: Arc::new(accounts),
        }
    }

    /// Get gateway configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
