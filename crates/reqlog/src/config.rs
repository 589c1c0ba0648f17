//! Request id configuration.

use std::sync::Arc;

use http::header::HeaderName;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::id::DEFAULT_HEADER;

/// Raw configuration, as deserialized from the `[request_logger]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestIdConfig {
    /// Header read from the request and echoed on the response.
    #[serde(default = "default_header_name")]
    pub header_name: String,

    /// Key under which the id is attached to each log record's `extra` map.
    #[serde(default = "default_request_attribute_key")]
    pub request_attribute_key: String,
}

fn default_header_name() -> String {
    DEFAULT_HEADER.to_string()
}

fn default_request_attribute_key() -> String {
    "request_id".to_string()
}

impl Default for RequestIdConfig {
    fn default() -> Self {
        Self {
            header_name: default_header_name(),
            request_attribute_key: default_request_attribute_key(),
        }
    }
}

/// Validated settings shared by the middleware and the log processor.
///
/// Cheap to clone (Arc).
#[derive(Debug, Clone)]
pub struct RequestIdSettings {
    header_name: HeaderName,
    attribute_key: Arc<str>,
}

impl RequestIdSettings {
    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    pub fn attribute_key(&self) -> &str {
        &self.attribute_key
    }
}

impl TryFrom<&RequestIdConfig> for RequestIdSettings {
    type Error = ConfigError;

    fn try_from(config: &RequestIdConfig) -> Result<Self, Self::Error> {
        let header_name = HeaderName::try_from(config.header_name.as_str()).map_err(|source| {
            ConfigError::InvalidHeaderName {
                name: config.header_name.clone(),
                source,
            }
        })?;

        let attribute_key = config.request_attribute_key.trim();
        if attribute_key.is_empty() {
            return Err(ConfigError::EmptyAttributeKey);
        }

        Ok(Self {
            header_name,
            attribute_key: attribute_key.into(),
        })
    }
}

impl Default for RequestIdSettings {
    fn default() -> Self {
        Self {
            header_name: HeaderName::from_static("x-request-id"),
            attribute_key: default_request_attribute_key().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: RequestIdConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.header_name, "X-Request-Id");
        assert_eq!(config.request_attribute_key, "request_id");

        let settings = RequestIdSettings::try_from(&config).unwrap();
        assert_eq!(settings.header_name(), "x-request-id");
        assert_eq!(settings.attribute_key(), "request_id");
    }

    #[test]
    fn test_default_settings_match_default_config() {
        let from_config = RequestIdSettings::try_from(&RequestIdConfig::default()).unwrap();
        let direct = RequestIdSettings::default();
        assert_eq!(from_config.header_name(), direct.header_name());
        assert_eq!(from_config.attribute_key(), direct.attribute_key());
    }

    #[test]
    fn test_custom_names() {
        let config = RequestIdConfig {
            header_name: "X-Test-Request-Id".to_string(),
            request_attribute_key: "test_request_id".to_string(),
        };
        let settings = RequestIdSettings::try_from(&config).unwrap();
        assert_eq!(settings.header_name(), "x-test-request-id");
        assert_eq!(settings.attribute_key(), "test_request_id");
    }

    #[test]
    fn test_invalid_header_name() {
        let config = RequestIdConfig {
            header_name: "bad header".to_string(),
            ..RequestIdConfig::default()
        };
        let err = RequestIdSettings::try_from(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeaderName { .. }));
        assert!(err.to_string().contains("bad header"));
    }

    #[test]
    fn test_empty_attribute_key() {
        let config = RequestIdConfig {
            request_attribute_key: "  ".to_string(),
            ..RequestIdConfig::default()
        };
        assert!(matches!(
            RequestIdSettings::try_from(&config),
            Err(ConfigError::EmptyAttributeKey)
        ));
    }
}
