//! Admission-control middleware
//!
//! Meters every inbound request against the client's window budgets and
//! produces the terminal 429 response when a budget is exhausted or the
//! client is still cooling down. Admitted responses are annotated with
//! per-window remaining/limit headers.
//!
//! Client identity is the `X-Forwarded-For` header when present, otherwise
//! the connection peer address, otherwise a shared sentinel. The forwarded
//! header is trusted unconditionally, which a direct caller can spoof; the
//! expected deployment puts a trusted reverse proxy in front.

use crate::core::admission::{AdmissionDecision, WindowSnapshot};
use crate::server::state::AppState;
use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue};
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Local, Utc};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

const FORWARDED_CLIENT_HEADER: &str = "x-forwarded-for";
const UNKNOWN_CLIENT: &str = "unknown";

/// Body of a 429 rejection.
#[derive(Debug, Serialize, Deserialize)]
pub struct RejectionBody {
    /// Error label
    pub error: String,
    /// Human-readable wait instruction
    pub message: String,
    /// Unblock instant as epoch milliseconds
    pub blocked_until_epoch_ms: i64,
    /// Unblock instant formatted in local time
    pub blocked_until: String,
    /// The client identity that was rejected
    pub client: String,
}

/// Admission middleware for Actix-web
pub struct AdmissionMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AdmissionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = AdmissionMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdmissionMiddlewareService { service }))
    }
}

/// Service implementation for admission middleware
pub struct AdmissionMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AdmissionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Fail open: a filter fault must never become an outage.
        let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
            warn!("admission state missing from app data, admitting request unchecked");
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        };

        let rate_limit = &state.config.gateway.rate_limit;
        if !rate_limit.enabled {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        }

        let identity = extract_client_identity(&req);
        debug!(client = %identity, path = req.path(), "admission check");

        match state.admission.admit(&identity) {
            AdmissionDecision::Blocked { unblock_at }
            | AdmissionDecision::LimitExceeded { unblock_at } => {
                let response =
                    too_many_requests(&identity, unblock_at, rate_limit.block_cooldown_minutes);
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
            AdmissionDecision::Admitted { .. } => {
                let admission = Arc::clone(&state.admission);
                let fut = self.service.call(req);
                Box::pin(async move {
                    let mut res = fut.await?;
                    // Fresh snapshot on the way out; approximate under
                    // concurrent traffic, by contract.
                    if let Some(snapshots) = admission.snapshots(&identity) {
                        append_budget_headers(res.headers_mut(), &snapshots);
                    }
                    Ok(res.map_into_left_body())
                })
            }
        }
    }
}

/// Derive the identity used to partition rate-limit state.
pub fn extract_client_identity(req: &ServiceRequest) -> String {
    if let Some(forwarded) = req
        .headers()
        .get(FORWARDED_CLIENT_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        let forwarded = forwarded.trim();
        if !forwarded.is_empty() {
            return forwarded.to_string();
        }
    }

    req.connection_info()
        .peer_addr()
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn too_many_requests(
    identity: &str,
    unblock_at: DateTime<Utc>,
    cooldown_minutes: u64,
) -> HttpResponse {
    HttpResponse::TooManyRequests().json(RejectionBody {
        error: "request limit exceeded".to_string(),
        message: format!("wait {} minute(s) before trying again", cooldown_minutes),
        blocked_until_epoch_ms: unblock_at.timestamp_millis(),
        blocked_until: unblock_at
            .with_timezone(&Local)
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string(),
        client: identity.to_string(),
    })
}

fn append_budget_headers(headers: &mut HeaderMap, snapshots: &[WindowSnapshot]) {
    for snapshot in snapshots {
        let label = snapshot.window.label();
        let pairs = [
            (
                format!("x-ratelimit-available-{}", label.to_lowercase()),
                snapshot.available,
            ),
            (
                format!("x-ratelimit-limit-{}", label.to_lowercase()),
                snapshot.limit,
            ),
        ];
        for (name, value) in pairs {
            // Both sides are numeric/ASCII; a failure here would be a bug,
            // but telemetry is not worth failing a response over.
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name),
                HeaderValue::try_from(value.to_string()),
            ) {
                headers.insert(name, value);
            }
        }
    }
}
