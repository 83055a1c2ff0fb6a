//! Reducer composition utilities
//!
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`scope_reducer`**: Focus a reducer on a subset of state
//!
//! The feed reducer is assembled this way: favorite/feed handling runs on
//! the whole state, follow handling is scoped to the followed-hosts set.
//!
//! # Examples
//!
//! ```
//! use plugg_core::{Effect, Reducer, SmallVec};
//! use plugg_core::composition::combine_reducers;
//! use std::sync::Arc;
//!
//! #[derive(Clone, Default)]
//! struct FeedState {
//!     loaded: usize,
//!     refreshing: bool,
//! }
//!
//! #[derive(Clone)]
//! enum FeedAction {
//!     Loaded(usize),
//!     Refresh,
//! }
//!
//! struct LoadReducer;
//! struct RefreshReducer;
//!
//! impl Reducer for LoadReducer {
//!     type State = FeedState;
//!     type Action = FeedAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut FeedState, action: FeedAction, _env: &()) -> SmallVec<[Effect<FeedAction>; 4]> {
//!         if let FeedAction::Loaded(n) = action {
//!             state.loaded = n;
//!             state.refreshing = false;
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! impl Reducer for RefreshReducer {
//!     type State = FeedState;
//!     type Action = FeedAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut FeedState, action: FeedAction, _env: &()) -> SmallVec<[Effect<FeedAction>; 4]> {
//!         if matches!(action, FeedAction::Refresh) {
//!             state.refreshing = true;
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! let combined = combine_reducers(vec![Arc::new(LoadReducer), Arc::new(RefreshReducer)]);
//! let mut state = FeedState::default();
//! let _ = combined.reduce(&mut state, FeedAction::Refresh, &());
//! assert!(state.refreshing);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use std::sync::Arc;

/// A shared, thread-safe reducer trait object
pub type SharedReducer<S, A, E> = Arc<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, and all effects are collected and concatenated.
/// This is useful when you want to split reducer logic across multiple implementations.
///
/// # Type Parameters
///
/// - `S`: The state type
/// - `A`: The action type
/// - `E`: The environment type
///
/// Effects are concatenated in reducer order. The action is cloned once
/// per reducer. The combined reducer is cheap to clone, so it can drive a
/// store.
#[must_use]
pub fn combine_reducers<S, A, E>(
    reducers: Vec<SharedReducer<S, A, E>>,
) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<SharedReducer<S, A, E>>,
}

impl<S, A, E> Clone for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    fn clone(&self) -> Self {
        Self {
            reducers: self.reducers.clone(),
        }
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> smallvec::SmallVec<[Effect<Self::Action>; 4]> {
        self.reducers
            .iter()
            .flat_map(|reducer| reducer.reduce(state, action.clone(), env))
            .collect()
    }
}

/// Scopes a reducer to operate on a subset of a larger state.
///
/// This allows you to reuse reducers designed for smaller state types
/// within a larger application state.
///
/// # Type Parameters
///
/// - `S`: The parent state type
/// - `SubS`: The child state type (subset of `S`)
/// - `A`: The action type
/// - `E`: The environment type
///
/// # Examples
///
/// ```
/// use plugg_core::{Effect, Reducer, SmallVec};
/// use plugg_core::composition::scope_reducer;
/// use std::collections::HashSet;
///
/// #[derive(Clone, Default)]
/// struct Following {
///     hosts: HashSet<String>,
/// }
///
/// #[derive(Clone)]
/// enum Action {
///     Followed(String),
/// }
///
/// struct FollowReducer;
///
/// impl Reducer for FollowReducer {
///     type State = Following;
///     type Action = Action;
///     type Environment = ();
///
///     fn reduce(&self, state: &mut Following, action: Action, _env: &()) -> SmallVec<[Effect<Action>; 4]> {
///         let Action::Followed(host) = action;
///         state.hosts.insert(host);
///         SmallVec::new()
///     }
/// }
///
/// #[derive(Clone, Default)]
/// struct AppState {
///     following: Following,
///     title: String,
/// }
///
/// let scoped = scope_reducer(
///     FollowReducer,
///     |app: &AppState| &app.following,
///     |app: &mut AppState, following: Following| app.following = following,
/// );
///
/// let mut state = AppState::default();
/// let _ = scoped.reduce(&mut state, Action::Followed("host-1".to_string()), &());
/// assert!(state.following.hosts.contains("host-1"));
/// ```
pub fn scope_reducer<S, SubS, A, E, R>(
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
) -> ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    ScopedReducer {
        reducer,
        get_state,
        set_state,
        _phantom: std::marker::PhantomData,
    }
}

/// A scoped reducer that operates on a subset of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
    _phantom: std::marker::PhantomData<(A, E)>,
}

impl<S, SubS, A, E, R> Reducer for ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> smallvec::SmallVec<[Effect<Self::Action>; 4]> {
        let mut sub_state = (self.get_state)(state).clone();
        let effects = self.reducer.reduce(&mut sub_state, action, env);
        (self.set_state)(state, sub_state);
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SmallVec, smallvec};
    use std::collections::BTreeSet;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct ListingState {
        favorites: BTreeSet<u32>,
        hosts: BTreeSet<String>,
        refreshes: u32,
    }

    #[derive(Clone, Debug)]
    enum ListingAction {
        Favorite(u32),
        Follow(String),
        Refresh,
    }

    struct FavoriteReducer;

    impl Reducer for FavoriteReducer {
        type State = ListingState;
        type Action = ListingAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                ListingAction::Favorite(id) => {
                    state.favorites.insert(id);
                    SmallVec::new()
                },
                ListingAction::Refresh => {
                    state.refreshes += 1;
                    smallvec![Effect::None]
                },
                ListingAction::Follow(_) => SmallVec::new(),
            }
        }
    }

    struct FollowReducer;

    impl Reducer for FollowReducer {
        type State = BTreeSet<String>;
        type Action = ListingAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                ListingAction::Follow(host) => {
                    state.insert(host);
                    smallvec![Effect::None]
                },
                _ => SmallVec::new(),
            }
        }
    }

    fn scoped_follows() -> ScopedReducer<ListingState, BTreeSet<String>, ListingAction, (), FollowReducer> {
        scope_reducer(
            FollowReducer,
            |state: &ListingState| &state.hosts,
            |state: &mut ListingState, hosts| state.hosts = hosts,
        )
    }

    #[test]
    fn combined_reducers_each_see_the_action() {
        let combined = combine_reducers(vec![Arc::new(FavoriteReducer), Arc::new(scoped_follows())]);
        let mut state = ListingState::default();

        let _ = combined.reduce(&mut state, ListingAction::Favorite(1), &());
        let _ = combined.reduce(&mut state, ListingAction::Follow("dj-kay".to_string()), &());

        assert!(state.favorites.contains(&1));
        assert!(state.hosts.contains("dj-kay"));
        assert_eq!(state.refreshes, 0);
    }

    #[test]
    fn combined_effects_are_concatenated() {
        let combined = combine_reducers(vec![Arc::new(FavoriteReducer), Arc::new(FavoriteReducer)]);
        let mut state = ListingState::default();

        let effects = combined.reduce(&mut state, ListingAction::Refresh, &());
        assert_eq!(effects.len(), 2);
        assert_eq!(state.refreshes, 2);
    }

    #[test]
    fn scoped_reducer_leaves_the_rest_untouched() {
        let scoped = scoped_follows();
        let mut state = ListingState {
            favorites: BTreeSet::from([7]),
            ..ListingState::default()
        };

        let effects = scoped.reduce(&mut state, ListingAction::Follow("host".to_string()), &());
        assert_eq!(effects.len(), 1);
        assert_eq!(state.hosts.len(), 1);
        assert_eq!(state.favorites, BTreeSet::from([7]));
    }
}
