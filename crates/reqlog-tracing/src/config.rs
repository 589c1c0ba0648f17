//! Tracing configuration types.

use serde::Deserialize;

/// Configuration for the log pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct TracingConfig {
    /// Reported as `channel` on every JSON record.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Log level filter (e.g. "info", "debug", "reqlog=debug,info").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format written to stderr.
    #[serde(default)]
    pub format: LogFormat,
}

/// Log output format.
///
/// Only `Json` runs record processors; `Text` is the plain `fmt` layer, where
/// the request id is still visible through the span fields.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

fn default_service_name() -> String {
    "reqlog".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}
