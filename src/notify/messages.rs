//! Text templates for operator notifications.

use chrono::{DateTime, Utc};

use crate::alerts::{AlertCategory, AlertState};
use crate::{Decision, Fan, Priority, SensorSnapshot, Thresholds};

// ---

fn temperature(
    decision: &Decision,
    s: &SensorSnapshot,
    prior: &AlertState,
    t: &Thresholds,
) -> String {
    // ---
    let temp = s.temperature;
    if temp >= t.temp_hot {
        if decision.fan == Fan::On {
            format!(
                "HIGH TEMP ALERT: {temp}°C detected! Fan turned ON automatically. \
                 Red warning light activated. Please check your crops immediately."
            )
        } else {
            format!("HIGH TEMPERATURE: {temp}°C recorded. Please monitor your crops closely.")
        }
    } else if temp < t.temp_cold {
        format!(
            "LOW TEMP ALERT: {temp}°C detected! Fan turned OFF. Blue indicator active. \
             Consider protective measures for your crops."
        )
    } else if prior.last_fan_state == Some(Fan::On) {
        format!(
            "TEMP NORMALIZED: {temp}°C. Fan turned OFF automatically. \
             Yellow indicator shows normal conditions."
        )
    } else {
        format!("Temperature normal: {temp}°C. All systems operating normally.")
    }
}

fn gas(decision: &Decision, s: &SensorSnapshot) -> String {
    // ---
    if decision.gas_alert {
        format!(
            "GAS ALERT! Dangerous gas levels detected ({}/1023). IMMEDIATE ACTION REQUIRED! \
             Check for gas leaks, ensure ventilation, and evacuate if necessary.",
            s.gas_level
        )
    } else {
        format!(
            "Gas levels normalized ({}/1023). Safe to resume normal operations.",
            s.gas_level
        )
    }
}

fn priority(decision: &Decision, s: &SensorSnapshot) -> String {
    // ---
    match decision.priority {
        Priority::Critical => format!(
            "CRITICAL ALERT! Multiple issues detected - Temp: {}°C, Gas: {}, Humidity: {}%. \
             Immediate attention required!",
            s.temperature, s.gas_level, s.humidity
        ),
        Priority::High => format!(
            "HIGH PRIORITY: Environmental conditions need attention - Temp: {}°C, Gas: {}. \
             Please check your setup.",
            s.temperature, s.gas_level
        ),
        Priority::Medium | Priority::Low => format!(
            "System Update: All sensors normal - Temp: {}°C, Humidity: {}%, Gas: {}.",
            s.temperature, s.humidity, s.gas_level
        ),
    }
}

/// Connectivity check sent by the test endpoint.
pub fn test_message(at: DateTime<Utc>) -> String {
    format!(
        "Test message from the field sensor system at {}. SMS alerts are working correctly!",
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Render the message for a fired alert. `prior` is the state the cycle
/// started from.
pub fn render(
    category: AlertCategory,
    decision: &Decision,
    snapshot: &SensorSnapshot,
    prior: &AlertState,
    thresholds: &Thresholds,
) -> String {
    // ---
    match category {
        AlertCategory::Temperature => temperature(decision, snapshot, prior, thresholds),
        AlertCategory::Gas => gas(decision, snapshot),
        AlertCategory::Priority => priority(decision, snapshot),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::evaluator::{evaluate, snapshot};

    fn rendered(category: AlertCategory, s: &SensorSnapshot, prior: &AlertState) -> String {
        let t = Thresholds::default();
        render(category, &evaluate(s, &t), s, prior, &t)
    }

    #[test]
    fn test_temperature_messages() {
        // ---
        let none = AlertState::default();
        let temp = |c: f64, prior: &AlertState| {
            rendered(AlertCategory::Temperature, &snapshot(c, 50.0, 100), prior)
        };
        assert!(temp(32.1, &none).starts_with("HIGH TEMP ALERT: 32.1°C"));
        assert!(temp(12.3, &none).starts_with("LOW TEMP ALERT"));
        assert!(temp(22.0, &none).starts_with("Temperature normal"));

        let fan_was_on = AlertState {
            last_fan_state: Some(Fan::On),
            ..AlertState::default()
        };
        assert!(temp(22.0, &fan_was_on).starts_with("TEMP NORMALIZED"));
    }

    #[test]
    fn test_gas_messages() {
        // ---
        let none = AlertState::default();
        let alert = rendered(AlertCategory::Gas, &snapshot(25.0, 55.0, 450), &none);
        assert!(alert.contains("GAS ALERT! Dangerous gas levels detected (450/1023)"));
        let clear = rendered(AlertCategory::Gas, &snapshot(25.0, 55.0, 120), &none);
        assert!(clear.starts_with("Gas levels normalized (120/1023)"));
    }

    #[test]
    fn test_priority_messages() {
        // ---
        let none = AlertState::default();
        let critical = rendered(AlertCategory::Priority, &snapshot(35.8, 85.0, 520), &none);
        assert!(critical.starts_with("CRITICAL ALERT!"));
        let high = rendered(AlertCategory::Priority, &snapshot(32.1, 50.0, 100), &none);
        assert!(high.starts_with("HIGH PRIORITY"));
    }

    #[test]
    fn test_connectivity_message_carries_time() {
        // ---
        let at = snapshot(22.0, 50.0, 100).timestamp;
        assert_eq!(
            test_message(at),
            "Test message from the field sensor system at 2025-06-01 12:00:00. \
             SMS alerts are working correctly!"
        );
    }
}
