//! Configuration loader for the `greenhouse-sentinel` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
use std::{env, path::PathBuf, time::Duration};

use anyhow::{anyhow, Result};

use crate::Thresholds;

/// Parse an optional environment variable of type `$ty` with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional boolean environment variable (`true|1|yes` / `false|0|no`).
macro_rules! parse_env_bool {
    ($var_name:expr, $default:expr) => {
        match env::var($var_name).ok().map(|v| v.trim().to_ascii_lowercase()) {
            None => $default,
            Some(v) => match v.as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                other => return Err(anyhow!("Invalid {}: {:?}", $var_name, other)),
            },
        }
    };
}

/// Read an optional string environment variable, treating empty values as unset.
macro_rules! optional_env {
    ($var_name:expr) => {
        env::var($var_name).ok().filter(|v| !v.trim().is_empty())
    };
}

/// Settings for the remote reasoning service.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    // ---
    /// API key; the remote source is disabled when absent.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

/// Settings for the SMS provider.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    // ---
    pub enabled: bool,
    pub username: Option<String>,
    pub api_key: Option<String>,
    pub sandbox: bool,
    pub recipient: Option<String>,
    pub sender_id: Option<String>,
    pub timeout: Duration,
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Interface the HTTP server binds to.
    pub host: String,

    /// Port the HTTP server binds to.
    pub port: u16,

    /// Rule thresholds shared by the evaluator and the reasoning prompt.
    pub thresholds: Thresholds,

    /// Minimum interval between two critical gas notifications.
    pub gas_alert_cooldown: Duration,

    /// Path of the persisted alert state.
    pub state_file: PathBuf,

    pub gemini: GeminiConfig,

    pub sms: SmsConfig,
}

/// Load configuration from environment variables with defaults.
///
/// Nothing is strictly required: without `GEMINI_API_KEY` every decision
/// comes from the threshold rules, and with `SMS_ENABLED` unset no message is
/// ever dispatched.
///
/// Returns an error if any variable is present but cannot be parsed.
pub fn load_from_env() -> Result<Config> {
    // ---
    let thresholds = Thresholds {
        temp_hot: parse_env!("TEMP_HOT_THRESHOLD", f64, 30.0),
        temp_cold: parse_env!("TEMP_COLD_THRESHOLD", f64, 15.0),
        gas_alert: parse_env!("GAS_ALERT_THRESHOLD", u16, 300),
        humidity_high: parse_env!("HUMIDITY_HIGH_THRESHOLD", f64, 70.0),
        humidity_low: parse_env!("HUMIDITY_LOW_THRESHOLD", f64, 30.0),
        light_bright: parse_env!("LIGHT_BRIGHT_THRESHOLD", u16, 700),
        light_dim: parse_env!("LIGHT_DIM_THRESHOLD", u16, 200),
    };

    let gemini = GeminiConfig {
        api_key: optional_env!("GEMINI_API_KEY"),
        model: optional_env!("GEMINI_MODEL").unwrap_or_else(|| "gemini-pro".to_string()),
        temperature: parse_env!("AI_TEMPERATURE", f32, 0.3),
        max_output_tokens: parse_env!("MAX_OUTPUT_TOKENS", u32, 256),
        timeout: Duration::from_secs(parse_env!("DECISION_TIMEOUT_SECS", u64, 10)),
    };

    let sms = SmsConfig {
        enabled: parse_env_bool!("SMS_ENABLED", false),
        username: optional_env!("AT_USERNAME"),
        api_key: optional_env!("AT_API_KEY"),
        sandbox: parse_env_bool!("AT_SANDBOX", true),
        recipient: optional_env!("AT_RECIPIENT_PHONE"),
        sender_id: optional_env!("AT_SENDER_ID"),
        timeout: Duration::from_secs(parse_env!("DISPATCH_TIMEOUT_SECS", u64, 10)),
    };

    Ok(Config {
        host: optional_env!("SENTINEL_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
        port: parse_env!("SENTINEL_PORT", u16, 5000),
        thresholds,
        gas_alert_cooldown: Duration::from_secs(parse_env!("GAS_ALERT_COOLDOWN", u64, 300)),
        state_file: optional_env!("ALERT_STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("sms_state.json")),
        gemini,
        sms,
    })
}

/// Replace all but the last two characters of a secret with `*`.
fn mask(value: &Option<String>) -> String {
    // ---
    match value {
        None => "<unset>".to_string(),
        Some(v) if v.chars().count() <= 4 => "****".to_string(),
        Some(v) => {
            let skip = v.chars().count() - 2;
            let tail: String = v.chars().skip(skip).collect();
            format!("****{tail}")
        }
    }
}

impl Config {
    /// Report configuration problems that do not prevent startup.
    ///
    /// An empty list means the configuration is consistent.
    pub fn validate(&self) -> Vec<String> {
        // ---
        let t = &self.thresholds;
        let mut issues = Vec::new();

        if t.temp_cold >= t.temp_hot {
            issues.push(format!(
                "TEMP_COLD_THRESHOLD ({}) must be less than TEMP_HOT_THRESHOLD ({})",
                t.temp_cold, t.temp_hot
            ));
        }
        if t.light_dim >= t.light_bright {
            issues.push(format!(
                "LIGHT_DIM_THRESHOLD ({}) must be less than LIGHT_BRIGHT_THRESHOLD ({})",
                t.light_dim, t.light_bright
            ));
        }
        if t.humidity_low >= t.humidity_high {
            issues.push(format!(
                "HUMIDITY_LOW_THRESHOLD ({}) must be less than HUMIDITY_HIGH_THRESHOLD ({})",
                t.humidity_low, t.humidity_high
            ));
        }
        if self.gemini.api_key.is_none() {
            issues.push("GEMINI_API_KEY is not set; using rule-based decisions only".to_string());
        }
        if self.sms.enabled {
            if self.sms.username.is_none() || self.sms.api_key.is_none() {
                issues.push(
                    "SMS_ENABLED is set but AT_USERNAME or AT_API_KEY is missing".to_string(),
                );
            }
            if self.sms.recipient.is_none() {
                issues.push("SMS_ENABLED is set but AT_RECIPIENT_PHONE is missing".to_string());
            }
        }

        issues
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks API keys and the operator's phone number while showing all
    /// other values that were loaded.
    pub fn log_config(&self) {
        // ---
        let t = &self.thresholds;

        tracing::info!("Configuration loaded:");
        tracing::info!("  LISTEN               : {}:{}", self.host, self.port);
        tracing::info!("  TEMP (cold/hot)      : {} / {}", t.temp_cold, t.temp_hot);
        tracing::info!("  HUMIDITY (low/high)  : {} / {}", t.humidity_low, t.humidity_high);
        tracing::info!("  LIGHT (dim/bright)   : {} / {}", t.light_dim, t.light_bright);
        tracing::info!("  GAS_ALERT_THRESHOLD  : {}", t.gas_alert);
        tracing::info!("  GAS_ALERT_COOLDOWN   : {}s", self.gas_alert_cooldown.as_secs());
        tracing::info!("  ALERT_STATE_FILE     : {}", self.state_file.display());
        tracing::info!("  GEMINI_MODEL         : {}", self.gemini.model);
        tracing::info!("  GEMINI_API_KEY       : {}", mask(&self.gemini.api_key));
        tracing::info!("  SMS_ENABLED          : {}", self.sms.enabled);
        tracing::info!("  AT_SANDBOX           : {}", self.sms.sandbox);
        tracing::info!("  AT_API_KEY           : {}", mask(&self.sms.api_key));
        tracing::info!("  AT_RECIPIENT_PHONE   : {}", mask(&self.sms.recipient));
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    // ---
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        thresholds: Thresholds::default(),
        gas_alert_cooldown: Duration::from_secs(300),
        state_file: PathBuf::from("sms_state.json"),
        gemini: GeminiConfig {
            api_key: None,
            model: "gemini-pro".to_string(),
            temperature: 0.3,
            max_output_tokens: 256,
            timeout: Duration::from_secs(1),
        },
        sms: SmsConfig {
            enabled: true,
            username: Some("sandbox".to_string()),
            api_key: Some("atsk_0123456789".to_string()),
            sandbox: true,
            recipient: Some("+254700000000".to_string()),
            sender_id: None,
            timeout: Duration::from_secs(1),
        },
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_default_config_is_consistent_once_gemini_is_set() {
        // ---
        let mut cfg = test_config();
        cfg.gemini.api_key = Some("key".to_string());
        assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
    }

    #[test]
    fn test_inverted_thresholds_are_reported() {
        // ---
        let mut cfg = test_config();
        cfg.gemini.api_key = Some("key".to_string());
        cfg.thresholds.temp_cold = 35.0;
        cfg.thresholds.humidity_low = 80.0;

        let issues = cfg.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues[0].starts_with("TEMP_COLD_THRESHOLD"));
        assert!(issues[1].starts_with("HUMIDITY_LOW_THRESHOLD"));
    }

    #[test]
    fn test_sms_without_recipient_is_reported() {
        // ---
        let mut cfg = test_config();
        cfg.gemini.api_key = Some("key".to_string());
        cfg.sms.recipient = None;

        let issues = cfg.validate();
        assert_eq!(issues, vec!["SMS_ENABLED is set but AT_RECIPIENT_PHONE is missing"]);
    }

    #[test]
    fn test_mask_hides_secrets() {
        // ---
        assert_eq!(mask(&None), "<unset>");
        assert_eq!(mask(&Some("abc".to_string())), "****");
        assert_eq!(mask(&Some("+254700000042".to_string())), "****42");
    }
}
