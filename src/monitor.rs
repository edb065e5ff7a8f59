//! Processing pipeline for one sensor submission.
//!
//! snapshot → decision policy → alert engine (serialized, persisted) →
//! dispatch of each fired alert → aggregated [`CycleReport`].
//!
//! Dispatch happens after the state commit and outside the engine's guard.
//! Without an SMS channel (disabled, or no recipient) the cycle is evaluated
//! and reported but not committed, since nothing reached the operator.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::alerts::{AlertCategory, AlertEngine, AlertState, Clock, JsonFileStore};
use crate::config::{Config, SmsConfig};
use crate::decision::{DecisionPolicy, DecisionSource, GeminiDecisionSource};
use crate::error::{AppError, DispatchError, PersistenceError};
use crate::notify::{messages, AfricasTalkingSms, DispatchOutcome, Notifier, Unconfigured};
use crate::{Decision, DecisionOrigin, SensorSnapshot, Thresholds};

// ---

/// Per-category line of the aggregated response.
#[derive(Debug, Clone, Serialize)]
pub struct AlertReport {
    // ---
    pub category: AlertCategory,
    pub suppressed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DispatchOutcome>,
}

/// What reached the operator during a cycle.
#[derive(Debug, Clone, Serialize)]
pub struct SmsSummary {
    // ---
    pub enabled: bool,
    pub alerts_sent: Vec<AlertCategory>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Aggregated result of one processing cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    // ---
    pub cycle_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub sensor_data: SensorSnapshot,
    pub decision: Decision,
    pub decision_origin: DecisionOrigin,
    pub alerts: Vec<AlertReport>,
    pub sms_alert: SmsSummary,
}

/// Read-only view of the notification side for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SmsStatus {
    // ---
    pub sms_enabled: bool,
    pub sandbox_mode: bool,
    pub recipient_configured: bool,
    pub sender_id: String,
    pub last_state: AlertState,
    pub gas_alert_cooldown: String,
}

pub struct Monitor {
    thresholds: Thresholds,
    decisions: DecisionPolicy,
    engine: AlertEngine,
    notifier: Box<dyn Notifier>,
    sms: SmsConfig,
}

impl Monitor {
    pub fn new(
        thresholds: Thresholds,
        decisions: DecisionPolicy,
        engine: AlertEngine,
        notifier: Box<dyn Notifier>,
        sms: SmsConfig,
    ) -> Self {
        Self {
            thresholds,
            decisions,
            engine,
            notifier,
            sms,
        }
    }

    /// Wire up the production collaborators from configuration.
    pub fn from_config(cfg: &Config, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        // ---
        let primary = GeminiDecisionSource::from_config(&cfg.gemini)?
            .map(|s| Box::new(s) as Box<dyn DecisionSource>);
        let decisions = DecisionPolicy::new(primary, cfg.gemini.timeout);
        if !decisions.has_primary() {
            info!("No reasoning service configured; decisions come from threshold rules");
        }

        let engine = AlertEngine::new(
            Arc::new(JsonFileStore::new(&cfg.state_file)),
            clock,
            cfg.gas_alert_cooldown,
        );

        let notifier: Box<dyn Notifier> = match AfricasTalkingSms::from_config(&cfg.sms)? {
            Some(sms) => Box::new(sms),
            None => Box::new(Unconfigured),
        };

        Ok(Self::new(
            cfg.thresholds.clone(),
            decisions,
            engine,
            notifier,
            cfg.sms.clone(),
        ))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.engine.now()
    }

    pub fn sms_enabled(&self) -> bool {
        self.sms.enabled
    }

    pub fn sms_sandbox(&self) -> bool {
        self.sms.sandbox
    }

    /// Whether fired alerts can reach anyone at all.
    fn has_channel(&self) -> bool {
        self.sms.enabled && self.sms.recipient.is_some()
    }

    /// Deliver one message within the dispatch deadline.
    async fn dispatch(&self, message: &str) -> DispatchOutcome {
        // ---
        if !self.sms.enabled {
            return DispatchOutcome::failed("SMS disabled");
        }
        let Some(recipient) = &self.sms.recipient else {
            warn!("No recipient phone number configured - skipping alert");
            return DispatchOutcome::failed("No recipient phone number");
        };

        let timeout: Duration = self.sms.timeout;
        match tokio::time::timeout(timeout, self.notifier.send(recipient, message)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("SMS dispatch timed out after {}s", timeout.as_secs());
                DispatchError::Timeout(timeout.as_secs()).into()
            }
        }
    }

    /// Process one validated snapshot end to end.
    ///
    /// Only a failed state commit is an error; reasoning-service and SMS
    /// failures are absorbed into the report.
    pub async fn submit(&self, snapshot: SensorSnapshot) -> Result<CycleReport, PersistenceError> {
        // ---
        let cycle_id = Uuid::new_v4();
        let span = info_span!("cycle", %cycle_id);

        async move {
            info!(
                "Received sensor data - Temp: {}°C, Humidity: {}%, Light: {}, Gas: {}",
                snapshot.temperature,
                snapshot.humidity,
                snapshot.light_intensity,
                snapshot.gas_level
            );

            let (decision, origin) = self.decisions.decide(&snapshot, &self.thresholds).await;
            info!(
                ?origin,
                fan = %decision.fan,
                led = %decision.led,
                priority = %decision.priority,
                gas_alert = decision.gas_alert,
                "decision"
            );

            let evaluation = if self.has_channel() {
                self.engine.process(&decision).await?
            } else {
                info!("No SMS channel - alert state left unchanged");
                self.engine.preview(&decision).await?
            };

            let mut alerts = Vec::with_capacity(evaluation.events.len());
            let mut alerts_sent = Vec::new();
            for event in &evaluation.events {
                let delivery = if event.suppressed {
                    None
                } else {
                    let text = messages::render(
                        event.category,
                        &event.decision,
                        &snapshot,
                        &evaluation.prior,
                        &self.thresholds,
                    );
                    let outcome = self.dispatch(&text).await;
                    if outcome.success {
                        alerts_sent.push(event.category);
                    }
                    Some(outcome)
                };
                alerts.push(AlertReport {
                    category: event.category,
                    suppressed: event.suppressed,
                    reason: event.reason.clone(),
                    delivery,
                });
            }

            let reason = if !self.sms.enabled {
                Some("SMS disabled".to_string())
            } else if evaluation.fired().next().is_none() {
                Some("No state changes requiring alerts".to_string())
            } else {
                None
            };
            if alerts_sent.is_empty() {
                info!("No SMS alerts sent");
            } else {
                info!("SMS alerts sent: {:?}", alerts_sent);
            }

            Ok::<_, PersistenceError>(CycleReport {
                cycle_id,
                timestamp: self.engine.now(),
                sensor_data: snapshot,
                decision,
                decision_origin: origin,
                alerts,
                sms_alert: SmsSummary {
                    enabled: self.sms.enabled,
                    count: alerts_sent.len(),
                    alerts_sent,
                    reason,
                },
            })
        }
        .instrument(span)
        .await
    }

    /// Send the connectivity test message. Does not touch alert state.
    pub async fn send_test(&self) -> Result<DispatchOutcome, AppError> {
        // ---
        if !self.sms.enabled {
            return Err(AppError::SmsDisabled);
        }
        Ok(self.dispatch(&messages::test_message(self.now())).await)
    }

    pub async fn status(&self) -> SmsStatus {
        // ---
        SmsStatus {
            sms_enabled: self.sms.enabled,
            sandbox_mode: self.sms.sandbox,
            recipient_configured: self.sms.recipient.is_some(),
            sender_id: self.sms.sender_id.clone().unwrap_or_else(|| "Default".to_string()),
            last_state: self.engine.current_state().await,
            gas_alert_cooldown: format!("{} seconds", self.engine.cooldown().as_secs()),
        }
    }
}
