//! SMS maintenance endpoints: `POST /sms/test` and `GET /sms/status`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info};

use super::AppState;
use crate::error::AppError;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/sms/test", post(send_test))
        .route("/sms/status", get(status))
}

async fn send_test(State((monitor, _config)): State<AppState>) -> Result<Response, AppError> {
    // ---
    let outcome = monitor.send_test().await?;

    if outcome.success {
        info!("Test SMS sent");
        Ok((
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": "Test SMS sent successfully",
                "details": outcome,
            })),
        )
            .into_response())
    } else {
        error!("Test SMS failed: {:?}", outcome.error);
        Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "failed",
                "error": outcome.error.clone().unwrap_or_else(|| "Unknown error".to_string()),
                "details": outcome,
            })),
        )
            .into_response())
    }
}

async fn status(State((monitor, _config)): State<AppState>) -> Json<serde_json::Value> {
    // ---
    Json(json!({
        "sms_service": monitor.status().await,
        "timestamp": Utc::now(),
    }))
}
