//! SMS delivery through the Africa's Talking messaging API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};

use super::{DispatchOutcome, Notifier};
use crate::config::SmsConfig;
use crate::error::DispatchError;

// ---

const LIVE_URL: &str = "https://api.africastalking.com/version1/messaging";
const SANDBOX_URL: &str = "https://api.sandbox.africastalking.com/version1/messaging";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SendResponse {
    #[serde(rename = "SMSMessageData")]
    sms_message_data: MessageData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MessageData {
    #[serde(default)]
    recipients: Vec<Recipient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Recipient {
    status: String,
    #[serde(default)]
    cost: Option<String>,
    #[serde(default)]
    message_id: Option<String>,
}

pub struct AfricasTalkingSms {
    client: Client,
    url: &'static str,
    username: String,
    api_key: String,
    sender_id: Option<String>,
}

impl AfricasTalkingSms {
    /// Build a transport from configuration; `None` when credentials are missing.
    pub fn from_config(cfg: &SmsConfig) -> Result<Option<Self>, reqwest::Error> {
        // ---
        let (Some(username), Some(api_key)) = (cfg.username.clone(), cfg.api_key.clone()) else {
            return Ok(None);
        };
        let client = Client::builder().timeout(cfg.timeout).build()?;
        let url = if cfg.sandbox { SANDBOX_URL } else { LIVE_URL };
        info!(
            "SMS service initialized for {} environment",
            if cfg.sandbox { "sandbox" } else { "live" }
        );

        Ok(Some(Self {
            client,
            url,
            username,
            api_key,
            sender_id: cfg.sender_id.clone(),
        }))
    }

    async fn post(&self, recipient: &str, message: &str) -> Result<DispatchOutcome, DispatchError> {
        // ---
        let mut form = vec![
            ("username", self.username.as_str()),
            ("to", recipient),
            ("message", message),
        ];
        if let Some(sender) = &self.sender_id {
            form.push(("from", sender.as_str()));
        }

        let response = self
            .client
            .post(self.url)
            .header("apiKey", &self.api_key)
            .header("Accept", "application/json")
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DispatchError::Status(response.status()));
        }

        let body: SendResponse = response.json().await?;
        interpret(body)
    }
}

/// Success iff the first recipient was accepted.
fn interpret(body: SendResponse) -> Result<DispatchOutcome, DispatchError> {
    // ---
    let recipient = body
        .sms_message_data
        .recipients
        .into_iter()
        .next()
        .ok_or(DispatchError::NoRecipients)?;

    if recipient.status == "Success" {
        Ok(DispatchOutcome::delivered(recipient.message_id, recipient.cost))
    } else {
        Err(DispatchError::Rejected(recipient.status))
    }
}

#[async_trait]
impl Notifier for AfricasTalkingSms {
    async fn send(&self, recipient: &str, message: &str) -> DispatchOutcome {
        // ---
        match self.post(recipient, message).await {
            Ok(outcome) => {
                info!("SMS delivered: {}", message.chars().take(50).collect::<String>());
                outcome
            }
            Err(e) => {
                error!("SMS delivery failed: {}", e);
                e.into()
            }
        }
    }
}
