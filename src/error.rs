//! Error taxonomy for the alerting service.
//!
//! Each collaborator has its own error type so callers can decide locally
//! whether a failure is recovered (reasoning service, SMS transport, state
//! load) or fatal to the cycle (state save). `AppError` is the umbrella the
//! HTTP layer converts into responses.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;

// ---

/// A submission that must never reach the alert engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Content-Type must be application/json")]
    NotJson,

    #[error("Missing required fields: {0:?}")]
    MissingFields(Vec<&'static str>),

    #[error("Invalid data format: {field} must be {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Invalid data format: {0}")]
    OutOfRange(String),
}

/// Failure of the remote reasoning service. Always recovered by falling back
/// to the threshold rules.
#[derive(Debug, thiserror::Error)]
pub enum DecisionSourceError {
    #[error("reasoning service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("reasoning service returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("reasoning service returned no text")]
    EmptyResponse,

    #[error("reasoning service reply is not a decision: {0}")]
    Malformed(String),

    #[error("reasoning service timed out after {0}s")]
    Timeout(u64),
}

/// Failure of the notification transport. Reported per alert, never retried
/// within the same cycle.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("SMS request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("SMS provider returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("No recipients in response")]
    NoRecipients,

    #[error("{0}")]
    Rejected(String),

    #[error("SMS dispatch timed out after {0}s")]
    Timeout(u64),
}

/// Failure to commit alert state. Fatal to the processing cycle.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to write alert state to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode alert state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("alert state worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("SMS service is disabled")]
    SmsDisabled,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // ---
        let (status, body) = match &self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() })),
            AppError::SmsDisabled => {
                (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
            }
            AppError::Persistence(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Alert state could not be saved", "details": e.to_string() }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
