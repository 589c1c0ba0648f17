//! Request correlation ids for axum services.
//!
//! The [`middleware`] resolves one [`RequestId`] per inbound request, binds it
//! in a task-local request scope ([`context`]) and echoes it in the response.
//! The [`RequestIdProcessor`] reads that scope from inside the log pipeline and
//! stamps every record emitted while the request is handled.
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use reqlog::{RequestIdConfig, RequestIdSettings};
//!
//! # fn main() -> anyhow::Result<()> {
//! let pipeline = reqlog_tracing::init_tracing(&Default::default())?;
//! let settings = RequestIdSettings::try_from(&RequestIdConfig::default())?;
//! reqlog::install(pipeline.processors(), &settings);
//!
//! let app: Router = reqlog::with_request_id(
//!     Router::new().route("/", get(|| async { "ok" })),
//!     settings,
//! );
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod id;
pub mod middleware;
pub mod processor;

use std::sync::Arc;

use axum::Router;
use reqlog_tracing::ProcessorChain;

pub use config::{RequestIdConfig, RequestIdSettings};
pub use error::{ConfigError, ContextError};
pub use id::RequestId;
pub use middleware::request_id_middleware;
pub use processor::{RequestIdProcessor, NOT_AVAILABLE, UNAVAILABLE};

/// Attach a [`RequestIdProcessor`] to `processors`.
///
/// Safe to call more than once: a chain that already carries the processor is
/// left untouched and `false` is returned.
pub fn install(processors: &ProcessorChain, settings: &RequestIdSettings) -> bool {
    let attached = processors.push(Arc::new(RequestIdProcessor::new(settings)));
    if !attached {
        tracing::debug!("Request id processor already attached, skipping");
    }
    attached
}

/// Wrap every route of `router` in [`request_id_middleware`].
pub fn with_request_id<S>(router: Router<S>, settings: RequestIdSettings) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(axum::middleware::from_fn_with_state(
        settings,
        request_id_middleware,
    ))
}
