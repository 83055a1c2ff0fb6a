//! Cancellable futures.
//!
//! Wrapping a future with [`make_cancellable`] yields a future with the same
//! outcome plus a [`CancelHandle`]. Once the handle is canceled, the wrapped
//! future resolves to [`CancellableError::Canceled`] regardless of whether the
//! inner future succeeded or failed. The inner operation itself is not
//! aborted; only its outcome is discarded.
//!
//! [`CancellationScope`] groups handles belonging to one owner (a screen, a
//! loader) and cancels all of them when the owner goes away.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Outcome of a cancellable future that did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CancellableError<E> {
    /// The future was canceled before its outcome was observed
    #[error("operation canceled")]
    Canceled,

    /// The inner future failed
    #[error(transparent)]
    Failed(E),
}

impl<E> CancellableError<E> {
    /// Whether this is the `Canceled` variant
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Handle used to cancel a future wrapped by [`make_cancellable`].
///
/// Cloning the handle shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    canceled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Mark the associated future as canceled
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](Self::cancel) has been called
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

/// Wrap a fallible future so its outcome can be discarded.
///
/// The flag is checked after the inner future settles: a cancel that
/// happens while the operation is in flight turns both `Ok` and `Err`
/// into [`CancellableError::Canceled`].
///
/// ```
/// use plugg_core::{CancellableError, make_cancellable};
///
/// # tokio_test::block_on(async {
/// let (future, handle) = make_cancellable(async { Ok::<_, String>(42) });
/// handle.cancel();
/// assert_eq!(future.await, Err(CancellableError::Canceled));
/// # });
/// ```
pub fn make_cancellable<T, E, F>(
    future: F,
) -> (BoxFuture<'static, Result<T, CancellableError<E>>>, CancelHandle)
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let handle = CancelHandle::default();
    let flag = handle.clone();

    let wrapped = async move {
        let outcome = future.await;
        if flag.is_canceled() {
            return Err(CancellableError::Canceled);
        }
        outcome.map_err(CancellableError::Failed)
    }
    .boxed();

    (wrapped, handle)
}

/// A set of cancel handles owned together.
///
/// Dropping the scope cancels every handle it tracks.
#[derive(Debug, Default)]
pub struct CancellationScope {
    handles: Mutex<Vec<CancelHandle>>,
}

impl CancellationScope {
    /// Create an empty scope
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a future with [`make_cancellable`] and track its handle
    pub fn wrap<T, E, F>(&self, future: F) -> BoxFuture<'static, Result<T, CancellableError<E>>>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let (wrapped, handle) = make_cancellable(future);
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        // Settled futures never check their flag again.
        handles.retain(|h| Arc::strong_count(&h.canceled) > 1);
        handles.push(handle);
        wrapped
    }

    /// Cancel every tracked future
    pub fn cancel_all(&self) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        let count = handles.len();
        for handle in handles.drain(..) {
            handle.cancel();
        }
        if count > 0 {
            tracing::debug!(count, "Canceled in-flight futures");
        }
    }

    /// Number of tracked futures that have not settled yet
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|h| Arc::strong_count(&h.canceled) > 1)
            .count()
    }
}

impl Drop for CancellationScope {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
