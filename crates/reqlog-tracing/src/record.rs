//! The structured log record handed to processors and written by the sink.

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::Event;

/// One log line, before serialization.
///
/// `fields` holds the event's own key/value pairs. `extra` is reserved for
/// processors so that injected metadata never collides with event fields.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub channel: String,
    pub message: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
    pub extra: Map<String, Value>,
}

impl LogRecord {
    /// Create an empty record stamped with the current time.
    pub fn new(level: impl Into<String>, target: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: level.into(),
            target: target.into(),
            channel: channel.into(),
            message: String::new(),
            fields: Map::new(),
            span: None,
            extra: Map::new(),
        }
    }

    /// Build a record from a `tracing` event, collecting its message and fields.
    pub fn from_event(event: &Event<'_>, channel: &str) -> Self {
        let metadata = event.metadata();
        let mut record = Self::new(metadata.level().as_str(), metadata.target(), channel);
        event.record(&mut FieldCollector(&mut record));
        record
    }

    /// Serialize to a single JSON line, newline included.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

struct FieldCollector<'a>(&'a mut LogRecord);

impl FieldCollector<'_> {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.0.message = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
        } else {
            self.0.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldCollector<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_line_shape() {
        let mut record = LogRecord::new("INFO", "app", "reqlog");
        record.message = "hello".to_string();
        record.extra.insert("request_id".to_string(), Value::from("abc"));

        let line = record.to_json_line().unwrap();
        assert!(line.ends_with('\n'));

        let parsed: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed["message"], "hello");
        assert_eq!(parsed["extra"]["request_id"], "abc");
        // Empty event fields and a missing span are omitted
        assert!(parsed.get("fields").is_none());
        assert!(parsed.get("span").is_none());
    }

    #[test]
    fn test_empty_extra_is_still_an_object() {
        let record = LogRecord::new("WARN", "app", "reqlog");
        let parsed: Value = serde_json::to_value(&record).unwrap();
        assert!(parsed["extra"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let record = LogRecord::new("INFO", "app", "reqlog");
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }
}
