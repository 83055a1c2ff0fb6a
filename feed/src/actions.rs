//! Async actions bound to the remote API.
//!
//! Each constructor pairs an [`EventApi`] call with its signal kind names
//! and the [`FeedAction`] variant its signals are lifted into.

use crate::api::{ApiError, EventApi};
use crate::types::{Event, FeedAction, FeedQuery, FollowRequest, Page, ToggleFavoriteRequest};
use plugg_core::{ActionTypes, AsyncAction, SignalEnvelope};
use std::sync::Arc;

/// Base kind name of the favorite toggle
pub const TOGGLE_FAVORITE: &str = "event/toggle-favorite";

/// Base kind name of the feed fetch
pub const GET_FEED: &str = "event/get-feed";

/// Base kind name of the favorites list fetch
pub const GET_FAVORITES: &str = "profile/get-favorite-events";

/// Base kind name of the follow toggle
pub const TOGGLE_FOLLOW: &str = "profile/toggle-follow";

/// Favorite toggle action
pub type ToggleFavoriteAction = AsyncAction<ToggleFavoriteRequest, (), ApiError, FeedAction>;

/// Feed fetch action
pub type FetchFeedAction = AsyncAction<FeedQuery, Vec<Event>, ApiError, FeedAction>;

/// Favorites list fetch action
pub type FetchFavoritesAction = AsyncAction<Page, Vec<Event>, ApiError, FeedAction>;

/// Follow toggle action
pub type ToggleFollowAction = AsyncAction<FollowRequest, (), ApiError, FeedAction>;

/// Toggle an event's favorite flag: remove it when the request says it is
/// currently favorited, create it otherwise.
#[must_use]
pub fn toggle_favorite(api: Arc<dyn EventApi>) -> ToggleFavoriteAction {
    AsyncAction::new(
        ActionTypes::derive(TOGGLE_FAVORITE),
        FeedAction::ToggleFavorite,
        move |request: ToggleFavoriteRequest| {
            let api = Arc::clone(&api);
            async move {
                if request.favorite {
                    api.remove_favorite_event(&request.event_id).await
                } else {
                    api.create_favorite_event(&request.event_id).await
                }
            }
        },
    )
}

/// Fetch one page of the feed
#[must_use]
pub fn fetch_feed(api: Arc<dyn EventApi>) -> FetchFeedAction {
    AsyncAction::new(
        ActionTypes::derive(GET_FEED),
        FeedAction::FetchFeed,
        move |query: FeedQuery| {
            let api = Arc::clone(&api);
            async move { api.get_event_feed(&query).await }
        },
    )
}

/// Fetch one page of the user's favorite events
#[must_use]
pub fn fetch_favorites(api: Arc<dyn EventApi>) -> FetchFavoritesAction {
    AsyncAction::new(
        ActionTypes::derive(GET_FAVORITES),
        FeedAction::FetchFavorites,
        move |page: Page| {
            let api = Arc::clone(&api);
            async move { api.get_favorite_events(&page).await }
        },
    )
}

/// Follow or unfollow a host, relative to the request's current state
#[must_use]
pub fn toggle_follow(api: Arc<dyn EventApi>) -> ToggleFollowAction {
    AsyncAction::new(
        ActionTypes::derive(TOGGLE_FOLLOW),
        FeedAction::ToggleFollow,
        move |request: FollowRequest| {
            let api = Arc::clone(&api);
            async move {
                if request.following {
                    api.remove_follower(&request.user_profile_id).await
                } else {
                    api.create_follower(&request.user_profile_id).await
                }
            }
        },
    )
}

/// Render an async signal in its `{ type, payload }` dispatch form.
///
/// Returns `None` for gestures, which are not async signals.
///
/// # Errors
///
/// Returns an error if the request or result cannot be serialized.
pub fn signal_envelope(action: &FeedAction) -> Result<Option<SignalEnvelope>, serde_json::Error> {
    match action {
        FeedAction::ToggleFavorite(signal) => {
            signal.to_envelope(&ActionTypes::derive(TOGGLE_FAVORITE)).map(Some)
        },
        FeedAction::FetchFeed(signal) => signal.to_envelope(&ActionTypes::derive(GET_FEED)).map(Some),
        FeedAction::ToggleFollow(signal) => {
            signal.to_envelope(&ActionTypes::derive(TOGGLE_FOLLOW)).map(Some)
        },
        FeedAction::FetchFavorites(signal) => {
            signal.to_envelope(&ActionTypes::derive(GET_FAVORITES)).map(Some)
        },
        FeedAction::FavoriteTapped { .. }
        | FeedAction::RefreshFeed { .. }
        | FeedAction::RefreshFavorites { .. }
        | FeedAction::FollowTapped { .. } => Ok(None),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::{ApiCall, InMemoryEventApi};
    use crate::types::{EventId, UserProfileId};
    use plugg_core::AsyncSignal;

    #[tokio::test]
    async fn toggle_removes_when_currently_favorited() {
        let api = InMemoryEventApi::new();
        let action = toggle_favorite(Arc::new(api.clone()));

        let id = EventId::new("1");
        let _ = action
            .run(ToggleFavoriteRequest::untracked(id.clone(), true))
            .await;
        let _ = action
            .run(ToggleFavoriteRequest::untracked(id.clone(), false))
            .await;

        assert_eq!(
            api.calls(),
            vec![ApiCall::RemoveFavorite(id.clone()), ApiCall::CreateFavorite(id)]
        );
    }

    #[tokio::test]
    async fn failure_keeps_the_request() {
        let api = InMemoryEventApi::new();
        api.fail_next(ApiError::Status {
            status: 500,
            body: String::new(),
        });
        let action = toggle_follow(Arc::new(api));
        let request = FollowRequest {
            user_profile_id: UserProfileId::new("host"),
            following: false,
        };

        match action.run(request.clone()).await {
            FeedAction::ToggleFollow(AsyncSignal::Failed { request: echoed, .. }) => {
                assert_eq!(echoed, request);
            },
            other => panic!("expected a failed follow toggle, got {other:?}"),
        }
    }

    #[test]
    fn envelope_of_a_settled_toggle() {
        let action = FeedAction::ToggleFavorite(AsyncSignal::Failed {
            request: ToggleFavoriteRequest::untracked(EventId::new("evt-1"), false),
            error: ApiError::NotFound,
        });

        let envelope = signal_envelope(&action).unwrap().unwrap();
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "event/toggle-favorite-failure",
                "payload": {
                    "req": { "eventId": "evt-1", "favorite": false },
                    "error": "Not found"
                }
            })
        );

        let tap = FeedAction::FavoriteTapped { event_id: EventId::new("evt-1") };
        assert!(signal_envelope(&tap).unwrap().is_none());
    }

    #[test]
    fn kind_names() {
        let action = fetch_feed(Arc::new(InMemoryEventApi::new()));
        assert_eq!(action.types().succeeded, "event/get-feed-success");
        assert_eq!(action.types().failed, "event/get-feed-failure");

        let action = fetch_favorites(Arc::new(InMemoryEventApi::new()));
        assert_eq!(action.types().started, "profile/get-favorite-events");
    }

    #[test]
    fn envelope_of_a_favorites_page() {
        let action = FeedAction::FetchFavorites(AsyncSignal::Started {
            request: Page::new(20, 10),
        });
        let json = serde_json::to_value(signal_envelope(&action).unwrap().unwrap()).unwrap();
        assert_eq!(json["type"], "profile/get-favorite-events");
        assert_eq!(json["payload"]["req"], serde_json::json!({ "offset": 20, "limit": 10 }));
    }
}
