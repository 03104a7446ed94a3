//! # Floodgate
//!
//! A per-client admission-control gateway. Floodgate sits in front of an
//! HTTP service and meters every inbound request against layered token
//! buckets (per-second, per-minute, and per-hour budgets enforced together),
//! blocking clients that exceed any of them for a configurable cooldown.
//!
//! ## Features
//!
//! - **Layered budgets**: a request is admitted only when every window has
//!   capacity; exceeding any window starts the cooldown
//! - **Continuous refill**: bucket refill is computed from elapsed time, so
//!   fractional tokens are never lost to a discrete tick
//! - **Per-client isolation**: state is sharded per client identity; one
//!   client's flood never contends with another client's traffic
//! - **Budget telemetry**: admitted responses carry
//!   `X-RateLimit-Available-*` / `X-RateLimit-Limit-*` headers per window
//! - **Fail open**: an admission-layer fault admits the request instead of
//!   turning the limiter into a self-inflicted outage
//!
//! State is process-local and lost on restart; distributed enforcement is
//! out of scope.
//!
//! ## Gateway Mode
//!
//! ```rust,no_run
//! use floodgate::{Config, Gateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/gateway.yaml").await?;
//!     let gateway = Gateway::new(config).await?;
//!     gateway.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Embedded Use
//!
//! The admission core is usable without the HTTP layer:
//!
//! ```rust
//! use floodgate::config::models::rate_limit::RateLimitConfig;
//! use floodgate::core::admission::AdmissionControl;
//!
//! let control = AdmissionControl::new(&RateLimitConfig::default());
//! assert!(control.admit("client-1").is_admitted());
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

// Public module exports
pub mod config;
pub mod core;
pub mod server;
pub mod utils;

// Re-export main types
pub use crate::config::Config;
pub use crate::core::admission::{AdmissionControl, AdmissionDecision, Window, WindowSnapshot};
pub use crate::utils::error::{GatewayError, Result};

use tracing::info;

/// A minimal gateway facade tying configuration to the HTTP server
pub struct Gateway {
    server: server::HttpServer,
}

impl Gateway {
    /// Create a new gateway instance
    pub async fn new(config: Config) -> Result<Self> {
        info!("Creating new gateway instance");

        let server = server::HttpServer::new(&config).await?;

        Ok(Self { server })
    }

    /// Run the gateway server
    pub async fn run(self) -> Result<()> {
        info!("Starting Floodgate Gateway");

        self.server.start().await?;

        Ok(())
    }
}

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
