//! Task-local request scope holding the current [`RequestId`].
//!
//! The middleware opens one scope per request with [`scope`] and binds the id
//! with [`bind`]. Anything running inside that future (handlers, nested calls,
//! log processors) reads it back with [`lookup`] without the id being passed
//! around. Each request's future owns its own scope, so concurrent requests
//! never observe each other's binding, and the scope is dropped with the
//! future.
//!
//! Code outside any request (startup, background jobs) can [`pin_fallback`] a
//! process-wide id. The middleware never writes the fallback.

use std::cell::RefCell;
use std::future::Future;
use std::sync::{PoisonError, RwLock};

use http::header::{HeaderMap, HeaderName};

use crate::error::ContextError;
use crate::id::RequestId;

tokio::task_local! {
    static SCOPE: RefCell<RequestScope>;
}

static FALLBACK: RwLock<Option<RequestId>> = RwLock::new(None);

/// State of one in-flight request.
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    request_id: Option<RequestId>,
    inbound: HeaderMap,
}

impl RequestScope {
    pub fn new(inbound: HeaderMap) -> Self {
        Self {
            request_id: None,
            inbound,
        }
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn inbound_headers(&self) -> &HeaderMap {
        &self.inbound
    }
}

/// Run `future` inside a fresh request scope with nothing bound.
pub async fn scope<F>(inbound: HeaderMap, future: F) -> F::Output
where
    F: Future,
{
    SCOPE
        .scope(RefCell::new(RequestScope::new(inbound)), future)
        .await
}

/// Synchronous counterpart of [`scope`].
pub fn sync_scope<R>(inbound: HeaderMap, f: impl FnOnce() -> R) -> R {
    SCOPE.sync_scope(RefCell::new(RequestScope::new(inbound)), f)
}

/// Bind `id` to the current scope, replacing any earlier binding.
pub fn bind(id: RequestId) -> Result<(), ContextError> {
    SCOPE
        .try_with(|cell| {
            let mut scope = cell.try_borrow_mut().map_err(|_| ContextError::Busy)?;
            scope.request_id = Some(id);
            Ok::<_, ContextError>(())
        })
        .map_err(|_| ContextError::NoScope)?
}

/// The id bound to the current scope, if any.
pub fn lookup() -> Option<RequestId> {
    try_lookup().ok().flatten()
}

/// Like [`lookup`], but reports a scope that cannot be read.
///
/// Outside any scope this is `Ok(None)`, not an error.
pub fn try_lookup() -> Result<Option<RequestId>, ContextError> {
    with_scope(|scope| scope.request_id.clone()).map(Option::flatten)
}

/// Read `name` from the current scope's inbound headers.
///
/// Empty and non-UTF-8 values count as absent.
pub fn inbound_header(name: &HeaderName) -> Result<Option<String>, ContextError> {
    with_scope(|scope| {
        scope
            .inbound
            .get(name)
            .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
    .map(Option::flatten)
}

/// Snapshot of the current scope, if one is active and readable.
pub fn current() -> Option<RequestScope> {
    with_scope(RequestScope::clone).ok().flatten()
}

/// Re-enter the current scope around `future`.
///
/// Task-locals do not follow `tokio::spawn`; wrap the spawned future with this
/// so its log records keep the request id:
///
/// ```rust,no_run
/// # async fn handler() {
/// tokio::spawn(reqlog::context::carry(async {
///     tracing::info!("finished in the background");
/// }));
/// # }
/// ```
pub fn carry<F>(future: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    let snapshot = current();
    async move {
        match snapshot {
            Some(scope) => SCOPE.scope(RefCell::new(scope), future).await,
            None => future.await,
        }
    }
}

/// Pin a process-wide id used when no request scope is active.
pub fn pin_fallback(id: RequestId) {
    *FALLBACK.write().unwrap_or_else(PoisonError::into_inner) = Some(id);
}

/// Remove the process-wide id.
pub fn clear_fallback() {
    *FALLBACK.write().unwrap_or_else(PoisonError::into_inner) = None;
}

pub fn fallback() -> Result<Option<RequestId>, ContextError> {
    FALLBACK
        .read()
        .map(|guard| (*guard).clone())
        .map_err(|_| ContextError::Poisoned)
}

/// `Ok(None)` outside any scope, `Err(Busy)` if the scope is mutably borrowed.
fn with_scope<T>(f: impl FnOnce(&RequestScope) -> T) -> Result<Option<T>, ContextError> {
    match SCOPE.try_with(|cell| cell.try_borrow().map(|scope| f(&*scope))) {
        Ok(Ok(value)) => Ok(Some(value)),
        Ok(Err(_)) => Err(ContextError::Busy),
        Err(_) => Ok(None),
    }
}

/// Serializes tests that touch the process-wide fallback.
#[cfg(test)]
pub(crate) static FALLBACK_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Hold a mutable borrow of the current scope while `f` runs, so every read
/// inside `f` fails with [`ContextError::Busy`].
#[cfg(test)]
pub(crate) fn hold_scope_borrow<R>(f: impl FnOnce() -> R) -> R {
    SCOPE.with(|cell| {
        let _guard = cell.borrow_mut();
        f()
    })
}
