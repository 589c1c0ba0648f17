//! Log record processor stamping the request id into `extra`.
//!
//! Resolution order: id bound in the request scope, then the configured header
//! on the inbound request, then the process-wide fallback. Nothing found gives
//! [`NOT_AVAILABLE`]; a context that cannot be read gives [`UNAVAILABLE`].

use http::header::HeaderName;
use reqlog_tracing::{LogRecord, RecordProcessor};
use serde_json::Value;

use crate::config::RequestIdSettings;
use crate::context;
use crate::error::ContextError;
use crate::id::RequestId;

/// No request id could be found.
pub const NOT_AVAILABLE: &str = "n/a";

/// Looking up the request id failed.
pub const UNAVAILABLE: &str = "unavailable";

/// Registration name; one processor with this name per chain.
pub const PROCESSOR_NAME: &str = "reqlog.request_id";

/// Where the processor looks for a request id.
pub trait IdSource: Send + Sync + 'static {
    fn bound(&self) -> Result<Option<RequestId>, ContextError>;

    fn inbound_header(&self, name: &HeaderName) -> Result<Option<String>, ContextError>;

    fn fallback(&self) -> Result<Option<RequestId>, ContextError>;
}

/// Reads the task-local request scope and the process-wide fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbientSource;

impl IdSource for AmbientSource {
    fn bound(&self) -> Result<Option<RequestId>, ContextError> {
        context::try_lookup()
    }

    fn inbound_header(&self, name: &HeaderName) -> Result<Option<String>, ContextError> {
        context::inbound_header(name)
    }

    fn fallback(&self) -> Result<Option<RequestId>, ContextError> {
        context::fallback()
    }
}

/// Walk the sources in order and return the first non-empty id.
pub fn resolve(source: &impl IdSource, header: &HeaderName) -> Result<Option<String>, ContextError> {
    if let Some(id) = source.bound()?.filter(|id| !id.as_str().is_empty()) {
        return Ok(Some(id.to_string()));
    }
    if let Some(value) = source.inbound_header(header)?.filter(|v| !v.is_empty()) {
        return Ok(Some(value));
    }
    Ok(source
        .fallback()?
        .filter(|id| !id.as_str().is_empty())
        .map(|id| id.to_string()))
}

/// Collapse a resolution into the value written to the record.
pub fn settle(resolved: Result<Option<String>, ContextError>) -> String {
    match resolved {
        Ok(Some(id)) if !id.is_empty() => id,
        Ok(_) => NOT_AVAILABLE.to_string(),
        Err(_) => UNAVAILABLE.to_string(),
    }
}

/// Record processor attaching the request id under the configured key.
pub struct RequestIdProcessor<S = AmbientSource> {
    header: HeaderName,
    attribute_key: String,
    source: S,
}

impl RequestIdProcessor {
    pub fn new(settings: &RequestIdSettings) -> Self {
        Self {
            header: settings.header_name().clone(),
            attribute_key: settings.attribute_key().to_string(),
            source: AmbientSource,
        }
    }
}

impl<S: IdSource> RequestIdProcessor<S> {
    /// Swap the id source, e.g. for a fixed source in tests.
    pub fn with_source<S2: IdSource>(self, source: S2) -> RequestIdProcessor<S2> {
        RequestIdProcessor {
            header: self.header,
            attribute_key: self.attribute_key,
            source,
        }
    }

    /// The value this processor would attach right now.
    pub fn current_value(&self) -> String {
        settle(resolve(&self.source, &self.header))
    }
}

impl<S: IdSource> RecordProcessor for RequestIdProcessor<S> {
    fn name(&self) -> &str {
        PROCESSOR_NAME
    }

    fn process(&self, record: &mut LogRecord) {
        record
            .extra
            .insert(self.attribute_key.clone(), Value::String(self.current_value()));
    }
}
