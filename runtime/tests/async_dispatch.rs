//! Overlapping async dispatches against a live store.

#![allow(clippy::unwrap_used)]

use plugg_core::{ActionTypes, AsyncAction, AsyncSignal, Effect, OperationPanicked, Reducer, SmallVec};
use plugg_runtime::Store;
use plugg_testing::helpers;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
enum LookupError {
    #[error(transparent)]
    Panicked(#[from] OperationPanicked),
}

#[derive(Debug, Clone)]
enum Action {
    Lookup(AsyncSignal<u64, u64, LookupError>),
}

#[derive(Debug, Clone, Default)]
struct Settled {
    order: Vec<u64>,
    started: usize,
}

#[derive(Clone)]
struct SettledReducer;

impl Reducer for SettledReducer {
    type State = Settled;
    type Action = Action;
    type Environment = ();

    fn reduce(&self, state: &mut Settled, action: Action, _env: &()) -> SmallVec<[Effect<Action>; 4]> {
        match action {
            Action::Lookup(AsyncSignal::Started { .. }) => state.started += 1,
            Action::Lookup(AsyncSignal::Succeeded { request, .. }) => state.order.push(request),
            Action::Lookup(AsyncSignal::Failed { .. }) => {},
        }
        SmallVec::new()
    }
}

/// Each request sleeps for its own value in milliseconds
fn sleepy() -> AsyncAction<u64, u64, LookupError, Action> {
    AsyncAction::new(ActionTypes::derive("test/lookup"), Action::Lookup, |ms: u64| async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(ms)
    })
}

#[tokio::test]
async fn settled_signals_reach_the_reducer_in_completion_order() {
    helpers::init_test_tracing();
    let store = Store::new(Settled::default(), SettledReducer, ());
    let lookup = sleepy();

    let (slow, fast) = futures::future::join(
        store.dispatch_async(&lookup, 60),
        store.dispatch_async(&lookup, 5),
    )
    .await;
    slow.unwrap();
    fast.unwrap();

    let state = store.state(Clone::clone).await;
    assert_eq!(state.started, 2);
    assert_eq!(state.order, vec![5, 60]);
}

#[tokio::test]
async fn dispatch_does_not_block_other_sends() {
    let store = Store::new(Settled::default(), SettledReducer, ());
    let lookup = sleepy();

    let pending = {
        let store = store.clone();
        tokio::spawn(async move { store.dispatch_async(&lookup, 200).await })
    };

    assert!(helpers::wait_until(&store, Duration::from_secs(1), |s| s.started == 1).await);
    assert!(store.state(|s| s.order.is_empty()).await);

    pending.await.unwrap().unwrap();
    assert_eq!(store.state(|s| s.order.clone()).await, vec![200]);
    assert_eq!(store.pending_effects(), 0);
}
