//! Application entry point for the `greenhouse-sentinel` service.
//!
//! This binary orchestrates the full startup sequence for the field sensor
//! alerting API, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Wiring the decision policy, alert engine and SMS transport
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `SENTINEL_HOST` / `SENTINEL_PORT` (optional) – bind address (default: `0.0.0.0:5000`)
//! - `ALERT_STATE_FILE` (optional) – persisted alert state (default: `sms_state.json`)
//! - `GEMINI_API_KEY` (optional) – enables the remote reasoning service
//! - `SMS_ENABLED`, `AT_*` (optional) – SMS delivery
//! - `SENTINEL_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `SENTINEL_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the full list of thresholds and timeouts.
//!
//! This module follows the Explicit Module Boundary Pattern (EMBP) by
//! delegating configuration parsing to `config`, processing to `monitor`, and
//! route registration to `routes`.
use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::{Context, Result};

mod alerts;
mod config;
mod decision;
mod error;
mod evaluator;
mod models;
mod monitor;
mod notify;
mod routes;

pub use config::Config;
pub use monitor::Monitor;

// Imported here so sibling modules depend on their parent module (main.rs)
// rather than on models.rs directly.
pub use models::{Decision, DecisionOrigin, Fan, Led, Priority, SensorSnapshot, Thresholds};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();
    for issue in cfg.validate() {
        tracing::warn!("Configuration issue: {}", issue);
    }

    let monitor = Monitor::from_config(&cfg, Arc::new(alerts::SystemClock))
        .context("Failed to initialize processing pipeline")?;

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", cfg.host, cfg.port))?;

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(Arc::new(monitor), cfg);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    // ---
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `SENTINEL_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `SENTINEL_LOG_LEVEL` env var
///
/// This should be called once at application startup before any logging
/// or tracing macros are invoked.
fn init_tracing() {
    // ---
    let span_events = match env::var("SENTINEL_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to SENTINEL_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("SENTINEL_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},hyper=warn,reqwest=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
