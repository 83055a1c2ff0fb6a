//! Async action wrapper.
//!
//! A remote operation (favorite an event, fetch the feed) is never applied
//! to state directly. It is expressed as three signals which reach the
//! reducer in a fixed order:
//!
//! 1. `Started { request }` - emitted before the operation is polled
//! 2. `Succeeded { request, result }` - the operation resolved
//! 3. `Failed { request, error }` - the operation returned an error or panicked
//!
//! Exactly one of `Succeeded` / `Failed` follows each `Started`. The original
//! request travels with every signal so the reducer can correlate a response
//! with the input that triggered it; the result payload alone may not carry
//! the identifying key.
//!
//! The wrapper owns no state and adds nothing on top of the operation: no
//! retry, no timeout, no deduplication of concurrent calls.
//!
//! # Example
//!
//! ```ignore
//! let toggle = AsyncAction::new(
//!     ActionTypes::derive("event/toggle-favorite"),
//!     FeedAction::ToggleFavorite,
//!     move |request: ToggleFavoriteRequest| {
//!         let api = Arc::clone(&api);
//!         async move { api.create_favorite_event(&request.event_id).await }
//!     },
//! );
//!
//! // From a reducer: Started is fed back first, then the settled signal
//! smallvec![toggle.effect(request)]
//! ```

use crate::effect::Effect;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;

/// One of the three signals produced per async action invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsyncSignal<Req, Res, E> {
    /// The operation was started; nothing has settled yet
    Started {
        /// The request that triggered the operation
        request: Req,
    },

    /// The operation resolved successfully
    Succeeded {
        /// The request that triggered the operation
        request: Req,
        /// The operation's result
        result: Res,
    },

    /// The operation failed
    Failed {
        /// The request that triggered the operation
        request: Req,
        /// The error returned (or built from a panic)
        error: E,
    },
}

/// Which of the three signals a value is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalPhase {
    /// See [`AsyncSignal::Started`]
    Started,
    /// See [`AsyncSignal::Succeeded`]
    Succeeded,
    /// See [`AsyncSignal::Failed`]
    Failed,
}

impl<Req, Res, E> AsyncSignal<Req, Res, E> {
    /// The request carried by this signal
    #[must_use]
    pub const fn request(&self) -> &Req {
        match self {
            Self::Started { request }
            | Self::Succeeded { request, .. }
            | Self::Failed { request, .. } => request,
        }
    }

    /// The phase of this signal
    #[must_use]
    pub const fn phase(&self) -> SignalPhase {
        match self {
            Self::Started { .. } => SignalPhase::Started,
            Self::Succeeded { .. } => SignalPhase::Succeeded,
            Self::Failed { .. } => SignalPhase::Failed,
        }
    }

    /// Whether the operation has settled (succeeded or failed)
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Started { .. })
    }

    /// Render the signal in the `{ type, payload: { req, res, error } }`
    /// shape used at the dispatch boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or result cannot be serialized.
    pub fn to_envelope(&self, types: &ActionTypes) -> Result<SignalEnvelope, serde_json::Error>
    where
        Req: Serialize,
        Res: Serialize,
        E: Display,
    {
        let payload = match self {
            Self::Started { request } => SignalPayload {
                req: Some(serde_json::to_value(request)?),
                res: None,
                error: None,
            },
            Self::Succeeded { request, result } => SignalPayload {
                req: Some(serde_json::to_value(request)?),
                res: Some(serde_json::to_value(result)?),
                error: None,
            },
            Self::Failed { request, error } => SignalPayload {
                req: Some(serde_json::to_value(request)?),
                res: None,
                error: Some(error.to_string()),
            },
        };

        Ok(SignalEnvelope {
            kind: types.kind(self.phase()).to_string(),
            payload,
        })
    }
}

/// The triple of signal kind names for one async action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionTypes {
    /// Kind name of the Started signal
    pub started: String,
    /// Kind name of the Succeeded signal
    pub succeeded: String,
    /// Kind name of the Failed signal
    pub failed: String,
}

impl ActionTypes {
    /// Create a triple from three explicit names
    #[must_use]
    pub fn new(
        started: impl Into<String>,
        succeeded: impl Into<String>,
        failed: impl Into<String>,
    ) -> Self {
        Self {
            started: started.into(),
            succeeded: succeeded.into(),
            failed: failed.into(),
        }
    }

    /// Derive the triple from a base name: `base`, `base-success`, `base-failure`
    ///
    /// ```
    /// use plugg_core::ActionTypes;
    ///
    /// let types = ActionTypes::derive("event/get-feed");
    /// assert_eq!(types.succeeded, "event/get-feed-success");
    /// assert_eq!(types.failed, "event/get-feed-failure");
    /// ```
    #[must_use]
    pub fn derive(base: &str) -> Self {
        Self::new(base, format!("{base}-success"), format!("{base}-failure"))
    }

    /// Kind name for a phase
    #[must_use]
    pub fn kind(&self, phase: SignalPhase) -> &str {
        match phase {
            SignalPhase::Started => &self.started,
            SignalPhase::Succeeded => &self.succeeded,
            SignalPhase::Failed => &self.failed,
        }
    }
}

/// Serialized form of a signal at the dispatch boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalEnvelope {
    /// Signal kind name (e.g. `event/toggle-favorite-success`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Request, result and error of the signal
    pub payload: SignalPayload,
}

/// Payload of a [`SignalEnvelope`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalPayload {
    /// The triggering request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub req: Option<serde_json::Value>,
    /// The result (Succeeded only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub res: Option<serde_json::Value>,
    /// The error message (Failed only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error produced when the wrapped operation panics.
///
/// Error types used with [`AsyncAction`] implement `From<OperationPanicked>`
/// so a panic still yields exactly one `Failed` signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("async operation panicked: {message}")]
pub struct OperationPanicked {
    /// The panic message, when it was a string
    pub message: String,
}

impl OperationPanicked {
    fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self { message }
    }
}

type Operation<Req, Res, E> = dyn Fn(Req) -> BoxFuture<'static, Result<Res, E>> + Send + Sync;

/// A remote operation bound to its signal kinds and the action it lifts into.
///
/// # Type Parameters
///
/// - `Req`: The request type, threaded through every signal
/// - `Res`: The operation's success value
/// - `E`: The operation's error
/// - `A`: The application action the signals are lifted into
pub struct AsyncAction<Req, Res, E, A> {
    types: Arc<ActionTypes>,
    lift: fn(AsyncSignal<Req, Res, E>) -> A,
    operation: Arc<Operation<Req, Res, E>>,
}

impl<Req, Res, E, A> Clone for AsyncAction<Req, Res, E, A> {
    fn clone(&self) -> Self {
        Self {
            types: Arc::clone(&self.types),
            lift: self.lift,
            operation: Arc::clone(&self.operation),
        }
    }
}

impl<Req, Res, E, A> std::fmt::Debug for AsyncAction<Req, Res, E, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncAction")
            .field("types", &self.types)
            .finish_non_exhaustive()
    }
}

impl<Req, Res, E, A> AsyncAction<Req, Res, E, A>
where
    Req: Clone + Send + 'static,
    Res: Send + 'static,
    E: From<OperationPanicked> + Display + Send + 'static,
    A: Send + 'static,
{
    /// Bind an operation to its signal kinds.
    ///
    /// # Arguments
    ///
    /// - `types`: Kind names of the three signals
    /// - `lift`: Wraps a signal into the application action (usually an enum variant)
    /// - `operation`: The remote call, from request to a future result
    pub fn new<F, Fut>(types: ActionTypes, lift: fn(AsyncSignal<Req, Res, E>) -> A, operation: F) -> Self
    where
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
    {
        Self {
            types: Arc::new(types),
            lift,
            operation: Arc::new(move |request| operation(request).boxed()),
        }
    }

    /// The signal kind names of this action
    #[must_use]
    pub fn types(&self) -> &ActionTypes {
        &self.types
    }

    /// The Started signal for a request, lifted into the application action
    pub fn started(&self, request: Req) -> A {
        (self.lift)(AsyncSignal::Started { request })
    }

    /// Wrap a signal into the application action
    pub fn lift(&self, signal: AsyncSignal<Req, Res, E>) -> A {
        (self.lift)(signal)
    }

    /// Invoke the operation and resolve to the settled signal, unlifted.
    ///
    /// Resolves to `Succeeded` when the operation resolves and `Failed`
    /// when it returns an error. A panic, whether raised while building the
    /// operation's future or while polling it, also yields `Failed`.
    pub fn settle(&self, request: Req) -> BoxFuture<'static, AsyncSignal<Req, Res, E>> {
        let operation = Arc::clone(&self.operation);
        let types = Arc::clone(&self.types);

        async move {
            let outcome = match std::panic::catch_unwind(AssertUnwindSafe(|| {
                operation(request.clone())
            })) {
                Ok(future) => AssertUnwindSafe(future)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        Err(E::from(OperationPanicked::from_payload(payload.as_ref())))
                    }),
                Err(payload) => Err(E::from(OperationPanicked::from_payload(payload.as_ref()))),
            };

            match outcome {
                Ok(result) => {
                    tracing::debug!(action = %types.succeeded, "Async action succeeded");
                    AsyncSignal::Succeeded { request, result }
                },
                Err(error) => {
                    tracing::warn!(action = %types.failed, error = %error, "Async action failed");
                    AsyncSignal::Failed { request, error }
                },
            }
        }
        .boxed()
    }

    /// Invoke the operation and resolve to the settled signal, lifted into
    /// the application action. See [`settle`](Self::settle).
    pub fn run(&self, request: Req) -> BoxFuture<'static, A> {
        let lift = self.lift;
        self.settle(request).map(lift).boxed()
    }

    /// Describe the whole invocation as an effect.
    ///
    /// The effect is sequential: `Started` is fed back to the reducer
    /// before the operation is polled, then the settled signal follows.
    pub fn effect(&self, request: Req) -> Effect<A> {
        tracing::trace!(action = %self.types.started, "Building async action effect");
        Effect::Sequential(vec![
            Effect::ready(self.started(request.clone())),
            Effect::Future(Box::pin(self.run(request).map(Some))),
        ])
    }
}
