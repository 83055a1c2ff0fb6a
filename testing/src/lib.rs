//! # Plugg Testing
//!
//! Testing utilities and helpers for the Plugg client state architecture.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A Given-When-Then harness for reducers ([`ReducerTest`])
//! - Helpers that drive effects without a store and wait on store state
//!
//! ## Example
//!
//! ```ignore
//! use plugg_testing::{helpers, test_clock};
//!
//! #[tokio::test]
//! async fn favorite_round_trip() {
//!     let store = Store::new(FeedState::default(), feed_reducer(), test_environment());
//!
//!     store.send(FeedAction::RefreshFeed { query }).await?;
//!     assert!(helpers::wait_until(&store, Duration::from_secs(1), |s| !s.feed.is_empty()).await);
//! }
//! ```

use chrono::{DateTime, Utc};
use plugg_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use plugg_testing::mocks::FixedClock;
    /// use plugg_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use futures::FutureExt;
    use futures::future::{BoxFuture, join_all};
    use plugg_core::{effect::Effect, reducer::Reducer};
    use plugg_runtime::Store;
    use std::time::Duration;

    /// Drive an effect to completion without a store and collect the
    /// actions it produces.
    ///
    /// Sequential effects yield their actions in order; parallel effects
    /// are joined and their actions concatenated in declaration order.
    /// Delays are skipped and yield their action immediately. Produced
    /// actions are not reduced.
    pub fn collect_actions<A>(effect: Effect<A>) -> BoxFuture<'static, Vec<A>>
    where
        A: Send + 'static,
    {
        async move {
            match effect {
                Effect::None => Vec::new(),
                Effect::Future(future) => future.await.into_iter().collect(),
                Effect::Delay { action, .. } => vec![*action],
                Effect::Sequential(effects) => {
                    let mut actions = Vec::new();
                    for effect in effects {
                        actions.extend(collect_actions(effect).await);
                    }
                    actions
                },
                Effect::Parallel(effects) => join_all(effects.into_iter().map(collect_actions))
                    .await
                    .into_iter()
                    .flatten()
                    .collect(),
            }
        }
        .boxed()
    }

    /// Collect the actions of several effects, in order
    pub async fn collect_all<A, I>(effects: I) -> Vec<A>
    where
        A: Send + 'static,
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut actions = Vec::new();
        for effect in effects {
            actions.extend(collect_actions(effect).await);
        }
        actions
    }

    /// Poll store state until `predicate` holds or `timeout` elapses.
    ///
    /// Returns whether the predicate held.
    pub async fn wait_until<S, A, E, R, F>(
        store: &Store<S, A, E, R>,
        timeout: Duration,
        predicate: F,
    ) -> bool
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
        F: Fn(&S) -> bool,
    {
        let poll = async {
            while !store.state(&predicate).await {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.is_ok()
    }

    /// Install a `tracing` subscriber that writes through the test harness.
    ///
    /// Filtered by `RUST_LOG`; safe to call from every test.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use plugg_core::effect::Effect;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_collect_actions_preserves_sequence() {
        let effect = Effect::Sequential(vec![
            Effect::ready(1),
            Effect::None,
            Effect::Parallel(vec![Effect::ready(2), Effect::ready(3)]),
            Effect::Delay {
                duration: std::time::Duration::from_secs(60),
                action: Box::new(4),
            },
        ]);

        assert_eq!(helpers::collect_actions(effect).await, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_collect_all_flattens() {
        let actions = helpers::collect_all(vec![Effect::ready("a"), Effect::ready("b")]).await;
        assert_eq!(actions, vec!["a", "b"]);
    }
}
