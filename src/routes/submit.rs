//! `POST /submit-data`: validate a field device submission and run one
//! processing cycle for it.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use super::AppState;
use crate::error::{AppError, ValidationError};
use crate::monitor::CycleReport;
use crate::SensorSnapshot;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/submit-data", post(handler))
}

#[derive(Serialize)]
struct SubmitResponse {
    status: &'static str,
    #[serde(flatten)]
    report: CycleReport,
}

async fn handler(
    State((monitor, _config)): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitResponse>, AppError> {
    // ---
    let Json(body) = payload.map_err(|rejection| {
        warn!("Rejected submission body: {}", rejection);
        match rejection {
            JsonRejection::MissingJsonContentType(_) => ValidationError::NotJson,
            _ => ValidationError::InvalidType {
                field: "body",
                expected: "valid JSON",
            },
        }
    })?;

    let snapshot = SensorSnapshot::from_submission(&body, monitor.now()).map_err(|e| {
        warn!("Invalid sensor data: {}", e);
        e
    })?;

    let report = monitor.submit(snapshot).await.map_err(|e| {
        error!("Processing cycle failed: {}", e);
        e
    })?;

    Ok(Json(SubmitResponse {
        status: "success",
        report,
    }))
}

#[cfg(test)]
mod tests {
    // ---
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};

    use crate::alerts::{ManualClock, MemoryStore};
    use crate::monitor::testing::{default_monitor, monitor};
    use crate::notify::testing::RecordingNotifier;
    use crate::routes::{router, testing::call};

    fn app(notifier: Arc<RecordingNotifier>) -> axum::Router {
        router(Arc::new(default_monitor(notifier)), crate::config::test_config())
    }

    fn submit(body: &Value) -> Request<Body> {
        Request::post("/submit-data")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_hot_submission() {
        // ---
        let notifier = Arc::new(RecordingNotifier::default());
        let (status, body) = call(
            app(notifier.clone()),
            submit(&json!({
                "temperature": 32.1,
                "humidity": 65.2,
                "light_intensity": 800,
                "gas_level": 180
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["decision"]["fan"], "on");
        assert_eq!(body["decision"]["led"], "red");
        assert_eq!(body["decision"]["priority"], "high");
        assert_eq!(body["decision_origin"], "rule_based");
        assert_eq!(body["sms_alert"]["alerts_sent"], json!(["temperature", "priority"]));
        assert_eq!(body["alerts"][0]["category"], "gas");
        assert_eq!(body["alerts"][0]["reason"], "no state change");
        assert!(body["cycle_id"].is_string());
        assert_eq!(notifier.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        // ---
        let (status, body) = call(
            app(Arc::new(RecordingNotifier::default())),
            submit(&json!({ "temperature": 22.0, "humidity": 40.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Missing required fields: [\"light_intensity\", \"gas_level\"]"
        );
    }

    #[tokio::test]
    async fn test_out_of_range_never_reaches_engine() {
        // ---
        let notifier = Arc::new(RecordingNotifier::default());
        let (status, body) = call(
            app(notifier.clone()),
            submit(&json!({
                "temperature": 22.0,
                "humidity": 40.0,
                "light_intensity": 400,
                "gas_level": 2000
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid data format: Gas level must be between 0-1023");
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_non_json_body() {
        // ---
        let request = Request::post("/submit-data")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("temperature=22"))
            .unwrap();
        let (status, body) = call(app(Arc::new(RecordingNotifier::default())), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Content-Type must be application/json");
    }

    #[tokio::test]
    async fn test_persistence_failure_is_500() {
        // ---
        let m = monitor(
            Arc::new(MemoryStore::new(None, true)),
            Arc::new(ManualClock::new()),
            Arc::new(RecordingNotifier::default()),
            crate::config::test_config().sms,
        );
        let app = router(Arc::new(m), crate::config::test_config());

        let (status, body) = call(
            app,
            submit(&json!({
                "temperature": 22.0,
                "humidity": 40.0,
                "light_intensity": 400,
                "gas_level": 100
            })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Alert state could not be saved");
    }
}
