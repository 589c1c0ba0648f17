//! Error types.

use thiserror::Error;

/// Failure to read or write the request scope.
///
/// Never surfaces to a client: the middleware logs it and the log processor
/// maps it to the `unavailable` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("no request scope is active on this task")]
    NoScope,

    #[error("request scope is already borrowed")]
    Busy,

    #[error("fallback request id lock is poisoned")]
    Poisoned,
}

/// Invalid request id configuration, reported once at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid header name {name:?}: {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },

    #[error("request_attribute_key must not be empty")]
    EmptyAttributeKey,
}
