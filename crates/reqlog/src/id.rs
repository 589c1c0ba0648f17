//! The correlation identifier.

use std::fmt;
use std::sync::Arc;

use http::header::{HeaderValue, InvalidHeaderValue};
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Default header carrying the request id.
pub const DEFAULT_HEADER: &str = "X-Request-Id";

/// Opaque, immutable correlation id. Cheap to clone (Arc).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(Arc<str>);

impl RequestId {
    /// Generate a new id (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    /// Adopt an inbound header value verbatim.
    ///
    /// Any non-empty UTF-8 value is accepted without format validation.
    /// Empty values and bytes that are not UTF-8 give `None`, so the caller
    /// generates a fresh id instead.
    pub fn from_header(value: &HeaderValue) -> Option<Self> {
        let value = std::str::from_utf8(value.as_bytes()).ok()?;
        if value.is_empty() {
            return None;
        }
        Some(Self(value.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
