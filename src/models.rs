//! Data models shared by the evaluator, the alert engine and the routes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

// ---

/// Upper bound of the analog light and gas sensor scale.
pub const ANALOG_MAX: i64 = 1023;

/// One validated set of readings from a field device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSnapshot {
    // ---
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    pub light_intensity: u16,
    pub gas_level: u16,
    pub timestamp: DateTime<Utc>,
}

/// Rule thresholds applied by the evaluator and handed to the reasoning service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thresholds {
    // ---
    pub temp_hot: f64,
    pub temp_cold: f64,
    pub gas_alert: u16,
    pub humidity_high: f64,
    pub humidity_low: f64,
    pub light_bright: u16,
    pub light_dim: u16,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temp_hot: 30.0,
            temp_cold: 15.0,
            gas_alert: 300,
            humidity_high: 70.0,
            humidity_low: 30.0,
            light_bright: 700,
            light_dim: 200,
        }
    }
}

/// Indicator LED color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Led {
    Red,
    Yellow,
    Blue,
}

/// Fan actuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fan {
    On,
    Off,
}

/// Urgency of a decision. Variant order is severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Levels that warrant an escalation notice.
    pub fn is_urgent(self) -> bool {
        self >= Priority::High
    }
}

impl fmt::Display for Led {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Led::Red => "red",
            Led::Yellow => "yellow",
            Led::Blue => "blue",
        })
    }
}

impl fmt::Display for Fan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Fan::On => "on",
            Fan::Off => "off",
        })
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        })
    }
}

/// Actuation and alert classification derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    // ---
    pub action: String,
    pub led: Led,
    pub fan: Fan,
    pub gas_alert: bool,
    pub priority: Priority,
    pub reasoning: String,
}

/// Which source produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOrigin {
    Ai,
    RuleBased,
}

// ---

/// Read a numeric field that may arrive as a JSON number or a numeric string.
fn number_field(body: &Value, field: &'static str) -> Result<f64, ValidationError> {
    // ---
    let invalid = ValidationError::InvalidType {
        field,
        expected: "a number",
    };
    match &body[field] {
        Value::Number(n) => n.as_f64().ok_or(invalid),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| invalid),
        _ => Err(invalid),
    }
}

/// Read an integer field that may arrive as a JSON integer or an integer string.
fn integer_field(body: &Value, field: &'static str) -> Result<i64, ValidationError> {
    // ---
    let invalid = ValidationError::InvalidType {
        field,
        expected: "an integer",
    };
    match &body[field] {
        Value::Number(n) => n.as_i64().ok_or(invalid),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid),
        _ => Err(invalid),
    }
}

fn analog_field(body: &Value, field: &'static str, label: &str) -> Result<u16, ValidationError> {
    // ---
    let raw = integer_field(body, field)?;
    if !(0..=ANALOG_MAX).contains(&raw) {
        return Err(ValidationError::OutOfRange(format!(
            "{label} must be between 0-{ANALOG_MAX}"
        )));
    }
    // Bounded above, so the cast cannot truncate.
    Ok(raw as u16)
}

impl SensorSnapshot {
    /// Validate a raw submission body and stamp it with `timestamp`.
    ///
    /// Values are never clamped: anything outside its declared range is
    /// rejected.
    pub fn from_submission(
        body: &Value,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        // ---
        if !body.is_object() {
            return Err(ValidationError::InvalidType {
                field: "body",
                expected: "a JSON object",
            });
        }

        let missing: Vec<&'static str> = ["temperature", "humidity", "light_intensity", "gas_level"]
            .into_iter()
            .filter(|f| body.get(*f).map_or(true, Value::is_null))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let temperature = number_field(body, "temperature")?;
        if !temperature.is_finite() {
            return Err(ValidationError::OutOfRange(
                "Temperature must be a finite number".to_string(),
            ));
        }

        let humidity = number_field(body, "humidity")?;
        if !(0.0..=100.0).contains(&humidity) {
            return Err(ValidationError::OutOfRange(
                "Humidity must be between 0-100%".to_string(),
            ));
        }

        let light_intensity = analog_field(body, "light_intensity", "Light intensity")?;
        let gas_level = analog_field(body, "gas_level", "Gas level")?;

        Ok(SensorSnapshot {
            temperature,
            humidity,
            light_intensity,
            gas_level,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_valid_submission() {
        // ---
        let body = json!({
            "temperature": 32.1,
            "humidity": 65.2,
            "light_intensity": 800,
            "gas_level": 180
        });
        let snap = SensorSnapshot::from_submission(&body, at()).unwrap();

        assert_eq!(snap.temperature, 32.1);
        assert_eq!(snap.humidity, 65.2);
        assert_eq!(snap.light_intensity, 800);
        assert_eq!(snap.gas_level, 180);
        assert_eq!(snap.timestamp, at());
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        // ---
        let body = json!({
            "temperature": "22.5",
            "humidity": "45",
            "light_intensity": "400",
            "gas_level": " 120 "
        });
        let snap = SensorSnapshot::from_submission(&body, at()).unwrap();
        assert_eq!(snap.temperature, 22.5);
        assert_eq!(snap.gas_level, 120);
    }

    #[test]
    fn test_missing_fields_are_listed() {
        // ---
        let body = json!({ "temperature": 22.5, "gas_level": null });
        let err = SensorSnapshot::from_submission(&body, at()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["humidity", "light_intensity", "gas_level"])
        );
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        // ---
        let base = json!({
            "temperature": 22.5,
            "humidity": 45.0,
            "light_intensity": 400,
            "gas_level": 120
        });

        let mut humid = base.clone();
        humid["humidity"] = json!(100.5);
        assert!(matches!(
            SensorSnapshot::from_submission(&humid, at()),
            Err(ValidationError::OutOfRange(_))
        ));

        let mut negative_gas = base.clone();
        negative_gas["gas_level"] = json!(-1);
        assert!(matches!(
            SensorSnapshot::from_submission(&negative_gas, at()),
            Err(ValidationError::OutOfRange(_))
        ));

        let mut bright = base.clone();
        bright["light_intensity"] = json!(1024);
        let err = SensorSnapshot::from_submission(&bright, at()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid data format: Light intensity must be between 0-1023");

        // Edges are inclusive
        let mut edge = base;
        edge["humidity"] = json!(0);
        edge["gas_level"] = json!(1023);
        assert!(SensorSnapshot::from_submission(&edge, at()).is_ok());
    }

    #[test]
    fn test_wrong_types_are_rejected() {
        // ---
        let body = json!({
            "temperature": "warm",
            "humidity": 45.0,
            "light_intensity": 400,
            "gas_level": 12.5
        });
        assert_eq!(
            SensorSnapshot::from_submission(&body, at()).unwrap_err(),
            ValidationError::InvalidType {
                field: "temperature",
                expected: "a number"
            }
        );

        let mut fractional = body;
        fractional["temperature"] = json!(20.0);
        assert_eq!(
            SensorSnapshot::from_submission(&fractional, at()).unwrap_err(),
            ValidationError::InvalidType {
                field: "gas_level",
                expected: "an integer"
            }
        );
    }

    #[test]
    fn test_priority_severity_order() {
        // ---
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert!(Priority::High < Priority::Critical);
        assert!(!Priority::Medium.is_urgent());
        assert!(Priority::High.is_urgent());
    }

    #[test]
    fn test_decision_wire_format() {
        // ---
        let decision: Decision = serde_json::from_value(json!({
            "action": "start fan",
            "led": "red",
            "fan": "on",
            "gas_alert": false,
            "priority": "high",
            "reasoning": "hot"
        }))
        .unwrap();
        assert_eq!(decision.led, Led::Red);
        assert_eq!(decision.fan, Fan::On);
        assert_eq!(decision.priority, Priority::High);
    }
}
