//! Decision sources.
//!
//! A [`DecisionSource`] turns a snapshot into a [`Decision`]. The remote
//! reasoning service is tried first when configured; on error or timeout the
//! [`DecisionPolicy`] substitutes the threshold rules without surfacing the
//! failure to the caller.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::DecisionSourceError;
use crate::{evaluator, Decision, DecisionOrigin, SensorSnapshot, Thresholds};

mod gemini;

pub use gemini::GeminiDecisionSource;

// ---

#[async_trait]
pub trait DecisionSource: Send + Sync {
    async fn decide(
        &self,
        snapshot: &SensorSnapshot,
        thresholds: &Thresholds,
    ) -> Result<Decision, DecisionSourceError>;
}

/// Threshold rules as a decision source. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedSource;

impl RuleBasedSource {
    pub fn evaluate(&self, snapshot: &SensorSnapshot, thresholds: &Thresholds) -> Decision {
        evaluator::evaluate(snapshot, thresholds)
    }
}

#[async_trait]
impl DecisionSource for RuleBasedSource {
    async fn decide(
        &self,
        snapshot: &SensorSnapshot,
        thresholds: &Thresholds,
    ) -> Result<Decision, DecisionSourceError> {
        Ok(self.evaluate(snapshot, thresholds))
    }
}

/// Try the primary source within a deadline, otherwise use the rules.
pub struct DecisionPolicy {
    primary: Option<Box<dyn DecisionSource>>,
    fallback: RuleBasedSource,
    timeout: Duration,
}

impl DecisionPolicy {
    pub fn new(primary: Option<Box<dyn DecisionSource>>, timeout: Duration) -> Self {
        Self {
            primary,
            fallback: RuleBasedSource,
            timeout,
        }
    }

    /// Rules only.
    pub fn rule_based() -> Self {
        Self::new(None, Duration::ZERO)
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub async fn decide(
        &self,
        snapshot: &SensorSnapshot,
        thresholds: &Thresholds,
    ) -> (Decision, DecisionOrigin) {
        // ---
        if let Some(primary) = &self.primary {
            let attempt = primary.decide(snapshot, thresholds);
            let result = match tokio::time::timeout(self.timeout, attempt).await {
                Ok(result) => result,
                Err(_) => Err(DecisionSourceError::Timeout(self.timeout.as_secs())),
            };
            match result {
                Ok(decision) => return (decision, DecisionOrigin::Ai),
                Err(e) => warn!("Reasoning service failed, using rule-based decision: {}", e),
            }
        }

        info!("Using rule-based decision making");
        (self.fallback.evaluate(snapshot, thresholds), DecisionOrigin::RuleBased)
    }
}
