//! Rule-based threshold evaluation.
//!
//! Maps a snapshot to a [`Decision`] using fixed thresholds. Used as the
//! fallback decision source and for repairing fields the reasoning service
//! gets wrong.

use crate::{Decision, Fan, Led, Priority, SensorSnapshot, Thresholds};

// ---

/// Fan, LED and priority implied by temperature alone.
pub fn temperature_axis(temperature: f64, t: &Thresholds) -> (Fan, Led, Priority) {
    // ---
    if temperature >= t.temp_hot {
        (Fan::On, Led::Red, Priority::High)
    } else if temperature < t.temp_cold {
        (Fan::Off, Led::Blue, Priority::High)
    } else {
        (Fan::Off, Led::Yellow, Priority::Low)
    }
}

/// Priority implied by humidity alone.
fn humidity_axis(humidity: f64, t: &Thresholds) -> Priority {
    // ---
    if humidity > t.humidity_high || humidity < t.humidity_low {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Whether the gas level crosses the alert threshold.
pub fn gas_alert(gas_level: u16, t: &Thresholds) -> bool {
    gas_level > t.gas_alert
}

/// Highest severity across all axes.
pub fn priority(snapshot: &SensorSnapshot, t: &Thresholds) -> Priority {
    // ---
    let (_, _, temp_priority) = temperature_axis(snapshot.temperature, t);
    let gas_priority = if gas_alert(snapshot.gas_level, t) {
        Priority::Critical
    } else {
        Priority::Low
    };

    temp_priority
        .max(humidity_axis(snapshot.humidity, t))
        .max(gas_priority)
}

/// Evaluate a snapshot against the thresholds. Total over valid snapshots.
pub fn evaluate(snapshot: &SensorSnapshot, t: &Thresholds) -> Decision {
    // ---
    let (fan, led, _) = temperature_axis(snapshot.temperature, t);
    let gas_alert = gas_alert(snapshot.gas_level, t);

    let action = if gas_alert {
        "trigger gas alert"
    } else if fan == Fan::On {
        "start fan"
    } else {
        "stop fan"
    };

    Decision {
        action: action.to_string(),
        led,
        fan,
        gas_alert,
        priority: priority(snapshot, t),
        reasoning: format!(
            "Rule-based decision: temp={}°C, humidity={}%, gas={}",
            snapshot.temperature, snapshot.humidity, snapshot.gas_level
        ),
    }
}

#[cfg(test)]
pub(crate) fn snapshot(temperature: f64, humidity: f64, gas_level: u16) -> SensorSnapshot {
    // ---
    use chrono::TimeZone;
    SensorSnapshot {
        temperature,
        humidity,
        light_intensity: 500,
        gas_level,
        timestamp: chrono::Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn eval(temperature: f64, humidity: f64, gas_level: u16) -> Decision {
        evaluate(&snapshot(temperature, humidity, gas_level), &Thresholds::default())
    }

    #[test]
    fn test_hot_reading() {
        // ---
        let d = eval(32.1, 65.2, 180);
        assert_eq!(d.fan, Fan::On);
        assert_eq!(d.led, Led::Red);
        assert!(!d.gas_alert);
        assert_eq!(d.priority, Priority::High);
        assert_eq!(d.action, "start fan");
    }

    #[test]
    fn test_cold_reading() {
        // ---
        let d = eval(12.3, 50.0, 95);
        assert_eq!(d.fan, Fan::Off);
        assert_eq!(d.led, Led::Blue);
        assert_eq!(d.priority, Priority::High);
    }

    #[test]
    fn test_normal_reading() {
        // ---
        let d = eval(22.5, 45.0, 120);
        assert_eq!(d.fan, Fan::Off);
        assert_eq!(d.led, Led::Yellow);
        assert!(!d.gas_alert);
        assert_eq!(d.priority, Priority::Low);
    }

    #[test]
    fn test_threshold_edges() {
        // ---
        // Hot is inclusive, cold is exclusive
        assert_eq!(eval(30.0, 45.0, 0).led, Led::Red);
        assert_eq!(eval(15.0, 45.0, 0).led, Led::Yellow);
        assert_eq!(eval(14.99, 45.0, 0).led, Led::Blue);

        // Gas alert is strictly above the threshold
        assert!(!eval(22.0, 45.0, 300).gas_alert);
        assert!(eval(22.0, 45.0, 301).gas_alert);
    }

    #[test]
    fn test_gas_overrides_priority() {
        // ---
        let d = eval(35.8, 85.0, 520);
        assert_eq!(d.fan, Fan::On);
        assert_eq!(d.led, Led::Red);
        assert!(d.gas_alert);
        assert_eq!(d.priority, Priority::Critical);
        assert_eq!(d.action, "trigger gas alert");
    }

    #[test]
    fn test_humidity_raises_priority_to_medium() {
        // ---
        assert_eq!(eval(22.0, 80.5, 100).priority, Priority::Medium);
        assert_eq!(eval(22.0, 25.0, 100).priority, Priority::Medium);
        // but never lowers a temperature-derived priority
        assert_eq!(eval(12.3, 80.5, 95).priority, Priority::High);
    }
}
