//! Operator notification.
//!
//! A [`Notifier`] delivers one text to one recipient and reports the outcome
//! as data; transport failures never escape as errors.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::DispatchError;

mod africastalking;
pub mod messages;

pub use africastalking::AfricasTalkingSms;

// ---

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchOutcome {
    // ---
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchOutcome {
    pub fn delivered(provider_id: Option<String>, cost: Option<String>) -> Self {
        Self {
            success: true,
            provider_id,
            cost,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            provider_id: None,
            cost: None,
            error: Some(error.into()),
        }
    }
}

impl From<DispatchError> for DispatchOutcome {
    fn from(e: DispatchError) -> Self {
        DispatchOutcome::failed(e.to_string())
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, message: &str) -> DispatchOutcome;
}

/// Stand-in used when the SMS provider is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconfigured;

#[async_trait]
impl Notifier for Unconfigured {
    async fn send(&self, _recipient: &str, _message: &str) -> DispatchOutcome {
        DispatchOutcome::failed("SMS service not configured")
    }
}

#[cfg(test)]
pub(crate) mod testing {
    // ---
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Records every message and answers with a fixed outcome, optionally
    /// after a delay.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, String)>>,
        pub fail: bool,
        pub delay: Option<Duration>,
    }

    impl RecordingNotifier {
        pub fn messages(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, recipient: &str, message: &str) -> DispatchOutcome {
            // ---
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), message.to_string()));
            if self.fail {
                DispatchOutcome::failed("InvalidPhoneNumber")
            } else {
                DispatchOutcome::delivered(
                    Some("ATXid_test".to_string()),
                    Some("KES 0.8000".to_string()),
                )
            }
        }
    }
}
