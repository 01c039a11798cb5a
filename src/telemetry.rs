//! Logging setup for the rollup sequencer
//!
//! Structured logging through `tracing`, initialized once at process start.
//! Components receive nothing implicit: they emit events and the subscriber
//! installed here decides formatting and filtering.

use tracing_subscriber::{fmt, EnvFilter};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to log output
    pub service_name: String,
    /// Emit JSON instead of human-readable lines
    pub json_format: bool,
    /// Default level filter, overridable via `RUST_LOG`
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "rollup-sequencer".to_string(),
            json_format: false,
            log_level: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: std::env::var("SEQUENCER_SERVICE_NAME")
                .unwrap_or(defaults.service_name),
            json_format: std::env::var("SEQUENCER_LOG_JSON")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(defaults.json_format),
            log_level: std::env::var("SEQUENCER_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }
}

/// Install the global tracing subscriber.
///
/// Safe to call once per process; later calls are no-ops because a global
/// default is already set.
pub fn init_telemetry(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    if config.json_format {
        let _ = fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}
