//! Alert decision engine.
//!
//! A cycle reads the committed [`AlertState`], evaluates the gas,
//! temperature and priority categories against that one prior snapshot,
//! merges their state updates and commits the result before anything is
//! dispatched. Cycles are serialized by a mutex; store calls run on the
//! blocking pool while it is held.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{AlertState, Clock, StateStore};
use crate::error::PersistenceError;
use crate::Decision;

// ---

pub const NO_STATE_CHANGE: &str = "no state change";
pub const NOT_ESCALATED: &str = "priority did not escalate";

/// Kind of notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Temperature,
    Gas,
    Priority,
}

/// Outcome of one category within one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    // ---
    pub category: AlertCategory,
    pub decision: Decision,
    pub suppressed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AlertEvent {
    fn fired(category: AlertCategory, decision: &Decision) -> Self {
        Self {
            category,
            decision: decision.clone(),
            suppressed: false,
            reason: None,
        }
    }

    fn suppressed(
        category: AlertCategory,
        decision: &Decision,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            category,
            decision: decision.clone(),
            suppressed: true,
            reason: Some(reason.into()),
        }
    }
}

/// Result of a cycle: the state it started from, the state it committed,
/// and one event per category in dispatch order (gas, temperature, priority).
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub prior: AlertState,
    pub state: AlertState,
    pub events: Vec<AlertEvent>,
}

impl Evaluation {
    pub fn fired(&self) -> impl Iterator<Item = &AlertEvent> {
        self.events.iter().filter(|e| !e.suppressed)
    }
}

/// Whole seconds left in the cooldown, rounded up; `None` once it has elapsed.
///
/// A `last` later than `now` (clock stepped back, state written on a skewed
/// host) counts as elapsed, so the next alert fires and re-anchors the window.
fn cooldown_remaining(
    last: DateTime<Utc>,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Option<u64> {
    // ---
    let elapsed_ms = (now - last).num_milliseconds();
    if elapsed_ms < 0 {
        return None;
    }
    let elapsed_ms = elapsed_ms as u128;
    let cooldown_ms = cooldown.as_millis();
    if elapsed_ms >= cooldown_ms {
        return None;
    }
    let left = cooldown_ms - elapsed_ms;
    Some(left.div_ceil(1000) as u64)
}

/// Evaluate every category for one decision against `prior`.
///
/// Pure: no category observes another's update, and the merged state is
/// returned rather than stored.
pub fn evaluate(
    decision: &Decision,
    prior: &AlertState,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Evaluation {
    // ---
    let mut state = prior.clone();
    let mut events = Vec::with_capacity(3);

    // Gas: critical alerts are throttled, the all-clear never is
    if decision.gas_alert {
        match prior
            .last_gas_alert_time
            .and_then(|t| cooldown_remaining(t, now, cooldown))
        {
            None => {
                events.push(AlertEvent::fired(AlertCategory::Gas, decision));
                state.last_gas_alert = true;
                state.last_gas_alert_time = Some(now);
            }
            Some(secs) => events.push(AlertEvent::suppressed(
                AlertCategory::Gas,
                decision,
                format!("cooldown active, {secs}s remaining"),
            )),
        }
    } else if prior.last_gas_alert {
        events.push(AlertEvent::fired(AlertCategory::Gas, decision));
        state.last_gas_alert = false;
    } else {
        events.push(AlertEvent::suppressed(AlertCategory::Gas, decision, NO_STATE_CHANGE));
    }

    // Temperature: only a change in actuation is worth a message
    if prior.last_fan_state != Some(decision.fan) || prior.last_led_color != Some(decision.led) {
        events.push(AlertEvent::fired(AlertCategory::Temperature, decision));
        state.last_fan_state = Some(decision.fan);
        state.last_led_color = Some(decision.led);
    } else {
        events.push(AlertEvent::suppressed(
            AlertCategory::Temperature,
            decision,
            NO_STATE_CHANGE,
        ));
    }

    // Priority: fire on escalation into high/critical, track everything else
    let new_priority = Some(decision.priority);
    if new_priority > prior.last_priority && decision.priority.is_urgent() {
        events.push(AlertEvent::fired(AlertCategory::Priority, decision));
    } else if new_priority == prior.last_priority {
        events.push(AlertEvent::suppressed(
            AlertCategory::Priority,
            decision,
            NO_STATE_CHANGE,
        ));
    } else {
        events.push(AlertEvent::suppressed(
            AlertCategory::Priority,
            decision,
            NOT_ESCALATED,
        ));
    }
    state.last_priority = new_priority;

    Evaluation {
        prior: prior.clone(),
        state,
        events,
    }
}

/// Owns the alert state store and serializes load-evaluate-save cycles.
pub struct AlertEngine {
    store: Arc<dyn StateStore>,
    cycle: Mutex<()>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
}

impl AlertEngine {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>, cooldown: Duration) -> Self {
        Self {
            store,
            cycle: Mutex::new(()),
            clock,
            cooldown,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn load(&self) -> Result<AlertState, PersistenceError> {
        let store = Arc::clone(&self.store);
        Ok(tokio::task::spawn_blocking(move || store.load()).await?)
    }

    async fn save(&self, state: AlertState) -> Result<(), PersistenceError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.save(&state)).await?
    }

    /// Run one cycle for `decision` and commit the resulting state.
    ///
    /// If the commit fails nothing is returned for dispatch; the caller
    /// should resubmit the whole snapshot.
    pub async fn process(&self, decision: &Decision) -> Result<Evaluation, PersistenceError> {
        self.run(decision, true).await
    }

    /// Evaluate `decision` against the committed state without saving.
    ///
    /// Used when no notification channel exists, so nothing is recorded as
    /// communicated.
    pub async fn preview(&self, decision: &Decision) -> Result<Evaluation, PersistenceError> {
        self.run(decision, false).await
    }

    async fn run(&self, decision: &Decision, commit: bool) -> Result<Evaluation, PersistenceError> {
        // ---
        let _cycle = self.cycle.lock().await;

        let prior = self.load().await?;
        let now = self.clock.now();
        let evaluation = evaluate(decision, &prior, now, self.cooldown);

        if commit {
            self.save(evaluation.state.clone()).await?;
        }

        for event in &evaluation.events {
            match &event.reason {
                None => info!(category = ?event.category, commit, "alert fired"),
                Some(reason) => debug!(category = ?event.category, %reason, "alert suppressed"),
            }
        }
        Ok(evaluation)
    }

    /// Committed state, read under the same guard as cycles.
    pub async fn current_state(&self) -> AlertState {
        // ---
        let _cycle = self.cycle.lock().await;
        self.load().await.unwrap_or_else(|e| {
            warn!("Failed to read alert state: {}", e);
            AlertState::default()
        })
    }
}
