//! # Plugg Core
//!
//! Core traits and types for the Plugg client state architecture.
//!
//! Every piece of client state (the event feed, favorites, followed hosts)
//! is owned by a reducer. User gestures and remote responses reach that
//! reducer as actions; remote calls are described as effects and executed
//! by the runtime crate.
//!
//! ## Core Concepts
//!
//! - **State**: Client-side state for a feature (e.g. the event feed)
//! - **Action**: All possible inputs to a reducer (gestures, async signals)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies (remote API, clock)
//! - **Async action**: One remote operation expressed as Started, then
//!   exactly one of Succeeded or Failed
//!
//! ## Example
//!
//! ```ignore
//! use plugg_core::*;
//!
//! #[derive(Clone, Debug, Default)]
//! struct FeedState {
//!     feed: Vec<Event>,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum FeedAction {
//!     FetchFeed(AsyncSignal<FeedQuery, Vec<Event>, ApiError>),
//! }
//!
//! impl Reducer for FeedReducer {
//!     type State = FeedState;
//!     type Action = FeedAction;
//!     type Environment = FeedEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut FeedState,
//!         action: FeedAction,
//!         env: &FeedEnvironment,
//!     ) -> SmallVec<[Effect<FeedAction>; 4]> {
//!         match action {
//!             FeedAction::FetchFeed(AsyncSignal::Succeeded { result, .. }) => {
//!                 state.feed = result;
//!             }
//!             FeedAction::FetchFeed(_) => {}
//!         }
//!         SmallVec::new()
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Async action wrapper: one remote operation as three ordered signals
pub mod async_action;

/// Cancellable futures for abandoning in-flight work
pub mod cancellable;

/// Reducer composition utilities
pub mod composition;

pub use async_action::{
    ActionTypes, AsyncAction, AsyncSignal, OperationPanicked, SignalEnvelope, SignalPayload, SignalPhase,
};
pub use cancellable::{CancelHandle, CancellableError, CancellationScope, make_cancellable};
pub use effect::Effect;
pub use reducer::Reducer;

/// Reducer module - The core trait for state reconciliation
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They hold all reconciliation logic and are deterministic and testable.
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// The Reducer trait - core abstraction for state reconciliation
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer owns
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for FeedReducer {
    ///     type State = FeedState;
    ///     type Action = FeedAction;
    ///     type Environment = FeedEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut FeedState,
    ///         action: FeedAction,
    ///         env: &FeedEnvironment,
    ///     ) -> SmallVec<[Effect<FeedAction>; 4]> {
    ///         match action {
    ///             FeedAction::RefreshFeed { query } => {
    ///                 smallvec![fetch_feed(env.api()).effect(query)]
    ///             }
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Updates state in place
        /// 2. Returns effect descriptions to be executed
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// Effects to be executed by the runtime
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially, each one settling (including its
        /// feedback action) before the next starts
        Sequential(Vec<Effect<Action>>),

        /// Delayed action
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Wrap an action that is ready now as a `Future` effect
        #[must_use]
        pub fn ready(action: Action) -> Effect<Action>
        where
            Action: Send + 'static,
        {
            Effect::Future(Box::pin(std::future::ready(Some(action))))
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock backed by [`Utc::now`]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    #[test]
    fn effect_debug_hides_future() {
        let effect: Effect<u8> = Effect::ready(1);
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");

        let chained: Effect<u8> = Effect::chain(vec![Effect::None]);
        assert_eq!(format!("{chained:?}"), "Effect::Sequential([Effect::None])");
    }
}
