//! Feed reducer: reconciles async signals and gestures into [`FeedState`].
//!
//! The reducer is the single owner of the feed. It is assembled from two
//! parts:
//!
//! - [`FavoritesReducer`] on the whole state: feed replacement, favorite
//!   reconciliation and the optimistic overlay
//! - [`FollowReducer`] scoped to the followed-hosts set
//!
//! # Favorite reconciliation
//!
//! A successful toggle sets the event's flag to the *negation of the
//! request's* pre-toggle value. The result payload is not consulted. An
//! event that is no longer in the feed is a silent no-op.
//!
//! Toggles issued through [`FeedAction::FavoriteTapped`] are tracked: each
//! tap bumps the event's generation and records a [`PendingToggle`]
//! overlay. Only the response carrying the latest generation may change
//! state; a failure of that response rolls the overlay back. Untracked
//! toggles (no generation) keep "last responder wins" semantics.
//!
//! A success that applies also keeps the favorites list in step: an
//! unfavorite drops the event from it, a favorite marks or appends it.
//!
//! Generations are pruned when the feed is replaced, for events that are
//! neither in the new feed nor in flight.

use crate::actions::{fetch_favorites, fetch_feed, toggle_favorite, toggle_follow};
use crate::api::EventApi;
use crate::types::{
    Event, EventId, FeedAction, FeedState, FollowRequest, Generation, PendingToggle,
    ToggleFavoriteRequest, ToggleFavoriteSignal, UserProfileId,
};
use plugg_core::composition::{CombinedReducer, combine_reducers, scope_reducer};
use plugg_core::effect::Effect;
use plugg_core::environment::Clock;
use plugg_core::reducer::Reducer;
use plugg_core::{AsyncSignal, SmallVec, smallvec};
use std::collections::HashSet;
use std::sync::Arc;

/// Environment for the feed reducer containing dependencies
#[derive(Clone)]
pub struct FeedEnvironment {
    /// Remote API the effects call into
    pub api: Arc<dyn EventApi>,
    /// Clock for overlay timestamps
    pub clock: Arc<dyn Clock>,
}

impl FeedEnvironment {
    /// Creates a new feed environment
    #[must_use]
    pub fn new(api: Arc<dyn EventApi>, clock: Arc<dyn Clock>) -> Self {
        Self { api, clock }
    }
}

/// The complete feed reducer
pub type FeedReducer = CombinedReducer<FeedState, FeedAction, FeedEnvironment>;

/// Assemble the feed reducer
#[must_use]
pub fn feed_reducer() -> FeedReducer {
    combine_reducers(vec![
        Arc::new(FavoritesReducer),
        Arc::new(scope_reducer(
            FollowReducer,
            |state: &FeedState| &state.following,
            |state: &mut FeedState, following| state.following = following,
        )),
    ])
}

/// Feed replacement and favorite reconciliation
#[derive(Clone, Copy, Debug, Default)]
pub struct FavoritesReducer;

impl FavoritesReducer {
    fn reconcile_toggle(state: &mut FeedState, signal: ToggleFavoriteSignal) {
        match signal {
            AsyncSignal::Started { .. } => {},
            AsyncSignal::Succeeded { request, .. } => {
                if let Some(generation) = request.generation {
                    if !Self::is_latest(state, &request.event_id, generation) {
                        tracing::debug!(
                            event_id = %request.event_id,
                            generation,
                            "Ignoring stale favorite toggle"
                        );
                        return;
                    }
                    Self::clear_overlay(state, &request.event_id, generation);
                }

                match state
                    .feed
                    .iter_mut()
                    .find(|event| event.event_id == request.event_id)
                {
                    Some(event) => event.favorite = !request.favorite,
                    None => {
                        tracing::trace!(event_id = %request.event_id, "Toggled event not in feed");
                    },
                }
                Self::reconcile_favorites(state, &request);
            },
            AsyncSignal::Failed { request, error } => {
                let Some(generation) = request.generation else {
                    return;
                };
                if Self::clear_overlay(state, &request.event_id, generation) {
                    tracing::info!(
                        event_id = %request.event_id,
                        generation,
                        error = %error,
                        "Favorite toggle failed, overlay rolled back"
                    );
                }
            },
        }
    }

    fn reconcile_favorites(state: &mut FeedState, request: &ToggleFavoriteRequest) {
        if request.favorite {
            state
                .favorites
                .retain(|event| event.event_id != request.event_id);
        } else if let Some(event) = state
            .favorites
            .iter_mut()
            .find(|event| event.event_id == request.event_id)
        {
            event.favorite = true;
        } else if let Some(event) = state.event(&request.event_id).cloned() {
            state.favorites.push(Event {
                favorite: true,
                ..event
            });
        }
    }

    /// Drop generations of events that left the feed and have nothing in flight
    fn prune_generations(state: &mut FeedState) {
        let FeedState {
            feed,
            pending,
            generations,
            ..
        } = state;
        generations.retain(|event_id, _| {
            pending.contains_key(event_id) || feed.iter().any(|event| &event.event_id == event_id)
        });
    }

    fn is_latest(state: &FeedState, event_id: &EventId, generation: Generation) -> bool {
        state.generations.get(event_id) == Some(&generation)
    }

    /// Remove the overlay if it belongs to `generation`
    fn clear_overlay(state: &mut FeedState, event_id: &EventId, generation: Generation) -> bool {
        if state
            .pending
            .get(event_id)
            .is_some_and(|pending| pending.generation == generation)
        {
            state.pending.remove(event_id);
            true
        } else {
            false
        }
    }

    fn tap(
        state: &mut FeedState,
        event_id: EventId,
        env: &FeedEnvironment,
    ) -> SmallVec<[Effect<FeedAction>; 4]> {
        let Some(displayed) = state.is_favorite(&event_id) else {
            tracing::debug!(event_id = %event_id, "Tapped event not in feed");
            return SmallVec::new();
        };

        let generation = state
            .generations
            .entry(event_id.clone())
            .and_modify(|generation| *generation += 1)
            .or_insert(1);
        let generation = *generation;

        state.pending.insert(
            event_id.clone(),
            PendingToggle {
                generation,
                favorite: !displayed,
                requested_at: env.clock.now(),
            },
        );

        smallvec![toggle_favorite(Arc::clone(&env.api))
            .effect(ToggleFavoriteRequest::tracked(event_id, displayed, generation))]
    }
}

impl Reducer for FavoritesReducer {
    type State = FeedState;
    type Action = FeedAction;
    type Environment = FeedEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            FeedAction::ToggleFavorite(signal) => Self::reconcile_toggle(state, signal),
            FeedAction::FetchFeed(AsyncSignal::Succeeded { result, .. }) => {
                tracing::debug!(events = result.len(), "Feed replaced");
                state.feed = result;
                Self::prune_generations(state);
            },
            FeedAction::FetchFavorites(AsyncSignal::Succeeded { result, .. }) => {
                tracing::debug!(events = result.len(), "Favorites replaced");
                state.favorites = result;
            },
            FeedAction::FavoriteTapped { event_id } => return Self::tap(state, event_id, env),
            FeedAction::RefreshFeed { query } => {
                return smallvec![fetch_feed(Arc::clone(&env.api)).effect(query)];
            },
            FeedAction::RefreshFavorites { page } => {
                return smallvec![fetch_favorites(Arc::clone(&env.api)).effect(page)];
            },
            FeedAction::FetchFeed(_)
            | FeedAction::FetchFavorites(_)
            | FeedAction::ToggleFollow(_)
            | FeedAction::FollowTapped { .. } => {},
        }

        SmallVec::new()
    }
}

/// Host follow toggling, on the followed-hosts set
#[derive(Clone, Copy, Debug, Default)]
pub struct FollowReducer;

impl Reducer for FollowReducer {
    type State = HashSet<UserProfileId>;
    type Action = FeedAction;
    type Environment = FeedEnvironment;

    fn reduce(
        &self,
        following: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            FeedAction::FollowTapped { host } => {
                let request = FollowRequest {
                    following: following.contains(&host),
                    user_profile_id: host,
                };
                smallvec![toggle_follow(Arc::clone(&env.api)).effect(request)]
            },
            FeedAction::ToggleFollow(AsyncSignal::Succeeded { request, .. }) => {
                if request.following {
                    following.remove(&request.user_profile_id);
                } else {
                    following.insert(request.user_profile_id);
                }
                SmallVec::new()
            },
            _ => SmallVec::new(),
        }
    }
}
