//! `GET /`: service description for humans poking at the device gateway.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use super::AppState;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

async fn index(State((monitor, config)): State<AppState>) -> Json<Value> {
    // ---
    Json(json!({
        "service": "Field Sensor Alerting Service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/submit-data": "POST - Submit sensor data for processing",
            "/health": "GET - Health check",
            "/sms/test": "POST - Send test SMS message",
            "/sms/status": "GET - Get SMS service status",
            "/": "GET - API information"
        },
        "expected_data_format": {
            "temperature": "float (°C)",
            "humidity": "float (0-100%)",
            "light_intensity": "int (0-1023)",
            "gas_level": "int (0-1023)"
        },
        "sms_features": {
            "enabled": monitor.sms_enabled(),
            "sandbox_mode": monitor.sms_sandbox(),
            "alerts": ["temperature_changes", "gas_alerts", "priority_escalation"]
        },
        "thresholds": config.thresholds,
        "config_issues": config.validate(),
    }))
}

#[cfg(test)]
mod tests {
    // ---
    use std::sync::Arc;

    use axum::http::StatusCode;

    use crate::monitor::testing::default_monitor;
    use crate::notify::testing::RecordingNotifier;
    use crate::routes::{router, testing::{call, get}};

    #[tokio::test]
    async fn test_index_lists_endpoints_and_issues() {
        // ---
        let app = router(
            Arc::new(default_monitor(Arc::new(RecordingNotifier::default()))),
            crate::config::test_config(),
        );

        let (status, body) = call(app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["endpoints"]["/submit-data"].is_string());
        assert_eq!(body["thresholds"]["gas_alert"], 300);
        assert_eq!(
            body["config_issues"][0],
            "GEMINI_API_KEY is not set; using rule-based decisions only"
        );
    }
}
