//! HTTP server core implementation
//!
//! This module provides the HttpServer struct and its core methods.

use crate::config::{Config, ServerConfig};
use crate::core::admission::AdmissionControl;
use crate::server::handlers::health_check;
use crate::server::middleware::{AdmissionMiddleware, RequestIdMiddleware};
use crate::server::routes;
use crate::server::routes::accounts::AccountRegistry;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{web, App, HttpServer as ActixHttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_actix_web::TracingLogger;

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");

        let rate_limit = &config.gateway.rate_limit;
        let admission = AdmissionControl::new(rate_limit);
        let state = AppState::new(config.clone(), admission, AccountRegistry::new());

        if rate_limit.enabled {
            Arc::clone(&state.admission)
                .start_sweeper(Duration::from_secs(rate_limit.sweep_interval_secs));
            info!(
                per_second = rate_limit.requests_per_second,
                per_minute = rate_limit.requests_per_minute,
                per_hour = rate_limit.requests_per_hour,
                cooldown_minutes = rate_limit.block_cooldown_minutes,
                "Admission control enabled"
            );
        } else {
            info!("Admission control disabled by configuration");
        }

        Ok(Self {
            config: config.gateway.server.clone(),
            state,
        })
    }

    /// Create the Actix-web application
    fn create_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(state)
            .wrap(AdmissionMiddleware)
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .route("/health", web::get().to(health_check))
            .configure(routes::accounts::configure_routes)
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.address();
        let workers = self.config.worker_count();

        info!("Starting HTTP server on {}", bind_addr);

        let state = web::Data::new(self.state);

        let server = ActixHttpServer::new(move || Self::create_app(state.clone()))
            .workers(workers)
            .bind(&bind_addr)
            .map_err(|e| {
                GatewayError::server(format!("Failed to bind to {}: {}", bind_addr, e))
            })?
            .run();

        info!("HTTP server listening on {}", bind_addr);

        server
            .await
            .map_err(|e| GatewayError::server(format!("Server error: {}", e)))?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
