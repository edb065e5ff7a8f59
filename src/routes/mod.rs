//! Route gateway (EMBP): merges every endpoint subrouter and attaches the
//! shared state, so `main.rs` never sees individual handlers.

use std::sync::Arc;

use axum::{http::StatusCode, Json, Router};
use serde_json::json;

use crate::{Config, Monitor};

mod health;
mod index;
mod sms;
mod submit;

// ---

/// State shared by all handlers.
pub type AppState = (Arc<Monitor>, Config);

pub fn router(monitor: Arc<Monitor>, config: Config) -> Router {
    // ---
    Router::new()
        .merge(submit::router())
        .merge(sms::router())
        .merge(index::router())
        .merge(health::router())
        .fallback(not_found)
        .with_state((monitor, config))
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Endpoint not found" })))
}
