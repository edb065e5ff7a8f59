//! Decision source backed by the Gemini `generateContent` REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use super::DecisionSource;
use crate::config::GeminiConfig;
use crate::error::DecisionSourceError;
use crate::{evaluator, Decision, Fan, Led, Priority, SensorSnapshot, Thresholds};

// ---

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const REQUIRED_FIELDS: [&str; 6] = ["action", "led", "fan", "gas_alert", "reasoning", "priority"];

pub struct GeminiDecisionSource {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiDecisionSource {
    /// Build a source from configuration; `None` when no API key is set.
    pub fn from_config(cfg: &GeminiConfig) -> Result<Option<Self>, reqwest::Error> {
        // ---
        let Some(api_key) = cfg.api_key.clone() else {
            return Ok(None);
        };
        let client = Client::builder().timeout(cfg.timeout).build()?;
        info!("Initialized Gemini decision source with model: {}", cfg.model);

        Ok(Some(Self {
            client,
            api_key,
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_output_tokens: cfg.max_output_tokens,
        }))
    }
}

/// Rules and output contract sent ahead of every reading.
fn system_prompt(t: &Thresholds) -> String {
    // ---
    format!(
        r#"You are an IoT sensor data processor for a farm environmental monitoring system.
Analyze sensor readings and make control decisions based on these rules.

DECISION RULES:
Temperature Control:
- If temperature >= {hot}°C: start fan, turn on red LED (hot condition)
- If {cold}°C <= temperature < {hot}°C: stop fan, turn on yellow LED (normal condition)
- If temperature < {cold}°C: stop fan, turn on blue LED (cold condition)

Gas Safety:
- If gas_level > {gas}: trigger gas alert (immediate safety concern)

Additional Context:
- Light intensity range: 0-1023 (bright above {bright}, dim below {dim})
- Humidity range: 0-100% (high above {hum_high}%, low below {hum_low}%)
- Gas level range: 0-1023 (higher values indicate more gas detected)

RESPONSE FORMAT:
Respond with a single JSON object with exactly these fields:
{{
    "action": "main action, e.g. 'start fan', 'stop fan', 'trigger gas alert'",
    "led": "'red', 'yellow' or 'blue'",
    "fan": "'on' or 'off'",
    "gas_alert": true or false,
    "reasoning": "short explanation",
    "priority": "'low', 'medium', 'high' or 'critical'"
}}

Gas alerts are critical, temperature extremes are high,
humidity outside its range is medium, otherwise low.
Respond only with JSON."#,
        hot = t.temp_hot,
        cold = t.temp_cold,
        gas = t.gas_alert,
        bright = t.light_bright,
        dim = t.light_dim,
        hum_high = t.humidity_high,
        hum_low = t.humidity_low,
    )
}

fn user_prompt(s: &SensorSnapshot) -> String {
    // ---
    format!(
        "CURRENT SENSOR DATA:\n\
         - Temperature: {}°C\n\
         - Humidity: {}%\n\
         - Light Intensity: {} (0-1023 scale)\n\
         - Gas Level: {} (0-1023 scale)\n\
         - Timestamp: {}",
        s.temperature,
        s.humidity,
        s.light_intensity,
        s.gas_level,
        s.timestamp.to_rfc3339()
    )
}

/// Drop a surrounding markdown code fence, if any.
fn strip_fence(text: &str) -> &str {
    // ---
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn enum_field<T: serde::de::DeserializeOwned>(obj: &Map<String, Value>, field: &str) -> Option<T> {
    obj.get(field).and_then(|v| serde_json::from_value(v.clone()).ok())
}

fn text_field(obj: &Map<String, Value>, field: &str) -> String {
    // ---
    match obj.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Turn the model's reply into a [`Decision`].
///
/// A reply that is not a JSON object or lacks a field is an error. Fields
/// outside the allowed values are repaired from the threshold rules.
pub(crate) fn parse_reply(
    text: &str,
    snapshot: &SensorSnapshot,
    t: &Thresholds,
) -> Result<Decision, DecisionSourceError> {
    // ---
    let value: Value = serde_json::from_str(strip_fence(text))
        .map_err(|e| DecisionSourceError::Malformed(e.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(DecisionSourceError::Malformed("reply is not a JSON object".to_string()));
    };

    let missing: Vec<&str> = REQUIRED_FIELDS
        .into_iter()
        .filter(|f| !obj.contains_key(*f))
        .collect();
    if !missing.is_empty() {
        return Err(DecisionSourceError::Malformed(format!("missing fields: {missing:?}")));
    }

    let (rule_fan, rule_led, _) = evaluator::temperature_axis(snapshot.temperature, t);

    let led = enum_field::<Led>(&obj, "led").unwrap_or_else(|| {
        warn!("Invalid LED color from reasoning service: {}", obj["led"]);
        rule_led
    });
    let fan = enum_field::<Fan>(&obj, "fan").unwrap_or_else(|| {
        warn!("Invalid fan state from reasoning service: {}", obj["fan"]);
        rule_fan
    });
    let gas_alert = obj["gas_alert"].as_bool().unwrap_or_else(|| {
        warn!("Invalid gas_alert from reasoning service: {}", obj["gas_alert"]);
        evaluator::gas_alert(snapshot.gas_level, t)
    });
    let priority = enum_field::<Priority>(&obj, "priority").unwrap_or_else(|| {
        warn!("Invalid priority from reasoning service: {}", obj["priority"]);
        evaluator::priority(snapshot, t)
    });

    Ok(Decision {
        action: text_field(&obj, "action"),
        led,
        fan,
        gas_alert,
        priority,
        reasoning: text_field(&obj, "reasoning"),
    })
}

#[async_trait]
impl DecisionSource for GeminiDecisionSource {
    async fn decide(
        &self,
        snapshot: &SensorSnapshot,
        thresholds: &Thresholds,
    ) -> Result<Decision, DecisionSourceError> {
        // ---
        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        let prompt = format!("{}\n\n{}", system_prompt(thresholds), user_prompt(snapshot));
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens,
            }
        });

        info!("Sending sensor data to Gemini for processing");
        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DecisionSourceError::Status(response.status()));
        }

        let reply: Value = response.json().await?;
        let text = reply["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or(DecisionSourceError::EmptyResponse)?;
        debug!("Gemini response: {}", text);

        parse_reply(text, snapshot, thresholds)
    }
}
