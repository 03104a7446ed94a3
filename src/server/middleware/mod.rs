//! HTTP middleware implementations
//!
//! This module provides the middleware for request processing:
//! - Admission control (rate limiting with cooldown blocking)
//! - Request ID tracking

mod admission;
mod request_id;


// Re-export all middleware
pub use admission::{
    extract_client_identity, AdmissionMiddleware, AdmissionMiddlewareService, RejectionBody,
};
pub use request_id::{RequestIdMiddleware, RequestIdMiddlewareService};
