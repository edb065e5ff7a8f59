// src/routes/health.rs
//! Liveness endpoint.
//!
//! `/health` is used by container orchestrators and field gateways to verify
//! that the service is up. It follows the Explicit Module Boundary Pattern
//! (EMBP): the handler stays private, the gateway (`mod.rs`) only sees the
//! subrouter.

use axum::{routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    service: &'static str,
}

/// Handle `GET /health`.
///
/// Deliberately lightweight: does not read alert state or call any
/// external service.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        service: "Field Sensor Alerting Service",
    })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it merges cleanly with the gateway
/// router.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
