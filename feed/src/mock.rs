//! In-memory [`EventApi`] for tests and the demo binary.
//!
//! Holds a catalogue of events, the user's favorites and follows, and
//! public profiles. Failures and latency can be scripted, and every call
//! is recorded for assertions.

use crate::api::{ApiError, ApiFuture, EventApi};
use crate::types::{Event, EventId, FeedQuery, Page, UserProfile, UserProfileId};
use futures::FutureExt;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A call received by [`InMemoryEventApi`]
#[derive(Clone, Debug, PartialEq)]
pub enum ApiCall {
    /// `create_favorite_event`
    CreateFavorite(EventId),
    /// `remove_favorite_event`
    RemoveFavorite(EventId),
    /// `get_favorite_events`
    GetFavorites(Page),
    /// `get_event_feed`
    GetFeed(FeedQuery),
    /// `create_follower`
    CreateFollower(UserProfileId),
    /// `remove_follower`
    RemoveFollower(UserProfileId),
    /// `get_user_profile`
    GetUserProfile(UserProfileId),
}

#[derive(Debug, Default)]
struct Inner {
    events: Vec<Event>,
    favorites: HashSet<EventId>,
    following: HashSet<UserProfileId>,
    profiles: HashMap<UserProfileId, UserProfile>,
    scripted_failures: VecDeque<ApiError>,
    failing: Option<ApiError>,
    latency: Duration,
    calls: Vec<ApiCall>,
}

/// In-memory remote API.
///
/// Cloning shares the underlying data.
///
/// # Example
///
/// ```
/// use plugg_feed::mock::InMemoryEventApi;
/// use plugg_feed::{Event, EventId};
///
/// let api = InMemoryEventApi::new()
///     .with_events(vec![Event::new(EventId::new("evt-1"), "Rooftop Sessions", false)]);
/// assert_eq!(api.favorites().len(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryEventApi {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryEventApi {
    /// Create an empty API
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed the event catalogue; events marked favorite seed the favorites
    #[must_use]
    pub fn with_events(self, events: Vec<Event>) -> Self {
        {
            let mut inner = self.lock();
            inner.favorites.extend(
                events
                    .iter()
                    .filter(|event| event.favorite)
                    .map(|event| event.event_id.clone()),
            );
            inner.events = events;
        }
        self
    }

    /// Seed a public profile
    #[must_use]
    pub fn with_profile(self, profile: UserProfile) -> Self {
        self.lock()
            .profiles
            .insert(profile.user_profile_id.clone(), profile);
        self
    }

    /// Delay every call by `latency`, measured from when the call starts
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Fail the next call with `error`; queued failures are used in order
    pub fn fail_next(&self, error: ApiError) {
        self.lock().scripted_failures.push_back(error);
    }

    /// Fail every call with `error` until [`recover`](Self::recover)
    pub fn fail_all(&self, error: ApiError) {
        self.lock().failing = Some(error);
    }

    /// Stop failing calls
    pub fn recover(&self) {
        let mut inner = self.lock();
        inner.failing = None;
        inner.scripted_failures.clear();
    }

    /// Event ids the server considers favorited
    #[must_use]
    pub fn favorites(&self) -> HashSet<EventId> {
        self.lock().favorites.clone()
    }

    /// Hosts the server considers followed
    #[must_use]
    pub fn following(&self) -> HashSet<UserProfileId> {
        self.lock().following.clone()
    }

    /// Every call received, in order
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Record a call and decide its fate: the latency to wait and the
    /// scripted failure, if any
    fn begin(&self, call: ApiCall) -> (Duration, Option<ApiError>) {
        let mut inner = self.lock();
        tracing::trace!(?call, "In-memory API call");
        inner.calls.push(call);
        let failure = inner
            .scripted_failures
            .pop_front()
            .or_else(|| inner.failing.clone());
        (inner.latency, failure)
    }

    fn call<'a, T, F>(&'a self, call: ApiCall, apply: F) -> ApiFuture<'a, T>
    where
        T: Send + 'a,
        F: FnOnce(&mut Inner) -> Result<T, ApiError> + Send + 'a,
    {
        let (latency, failure) = self.begin(call);
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            if let Some(error) = failure {
                return Err(error);
            }
            apply(&mut self.lock())
        }
        .boxed()
    }
}

impl EventApi for InMemoryEventApi {
    fn create_favorite_event<'a>(&'a self, event_id: &'a EventId) -> ApiFuture<'a, ()> {
        self.call(ApiCall::CreateFavorite(event_id.clone()), move |inner| {
            inner.favorites.insert(event_id.clone());
            Ok(())
        })
    }

    fn remove_favorite_event<'a>(&'a self, event_id: &'a EventId) -> ApiFuture<'a, ()> {
        self.call(ApiCall::RemoveFavorite(event_id.clone()), move |inner| {
            inner.favorites.remove(event_id);
            Ok(())
        })
    }

    fn get_favorite_events<'a>(&'a self, page: &'a Page) -> ApiFuture<'a, Vec<Event>> {
        self.call(ApiCall::GetFavorites(*page), move |inner| {
            Ok(inner
                .events
                .iter()
                .filter(|event| inner.favorites.contains(&event.event_id))
                .skip(as_index(page.offset))
                .take(as_index(page.limit))
                .map(|event| Event {
                    favorite: true,
                    ..event.clone()
                })
                .collect())
        })
    }

    fn get_event_feed<'a>(&'a self, query: &'a FeedQuery) -> ApiFuture<'a, Vec<Event>> {
        self.call(ApiCall::GetFeed(query.clone()), move |inner| {
            Ok(inner
                .events
                .iter()
                .skip(as_index(query.offset))
                .take(as_index(query.limit))
                .map(|event| Event {
                    favorite: inner.favorites.contains(&event.event_id),
                    ..event.clone()
                })
                .collect())
        })
    }

    fn create_follower<'a>(&'a self, user_profile_id: &'a UserProfileId) -> ApiFuture<'a, ()> {
        self.call(ApiCall::CreateFollower(user_profile_id.clone()), move |inner| {
            inner.following.insert(user_profile_id.clone());
            Ok(())
        })
    }

    fn remove_follower<'a>(&'a self, user_profile_id: &'a UserProfileId) -> ApiFuture<'a, ()> {
        self.call(ApiCall::RemoveFollower(user_profile_id.clone()), move |inner| {
            inner.following.remove(user_profile_id);
            Ok(())
        })
    }

    fn get_user_profile<'a>(
        &'a self,
        user_profile_id: &'a UserProfileId,
    ) -> ApiFuture<'a, UserProfile> {
        self.call(ApiCall::GetUserProfile(user_profile_id.clone()), move |inner| {
            inner
                .profiles
                .get(user_profile_id)
                .cloned()
                .ok_or(ApiError::NotFound)
        })
    }
}

fn as_index(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn catalogue() -> InMemoryEventApi {
        InMemoryEventApi::new().with_events(vec![
            Event::new(EventId::new("1"), "one", false),
            Event::new(EventId::new("2"), "two", true),
            Event::new(EventId::new("3"), "three", false),
        ])
    }

    #[tokio::test]
    async fn feed_reflects_favorites_and_pages() {
        let api = catalogue();
        api.create_favorite_event(&EventId::new("3")).await.unwrap();

        let page = api
            .get_event_feed(&FeedQuery::around(0.0, 0.0, 10.0).page(1, 5))
            .await
            .unwrap();

        assert_eq!(page.len(), 2);
        assert!(page.iter().all(|event| event.favorite));
    }

    #[tokio::test]
    async fn favorites_list_follows_the_server_set() {
        let api = catalogue();
        api.create_favorite_event(&EventId::new("3")).await.unwrap();

        let favorites = api.get_favorite_events(&Page::default()).await.unwrap();
        let ids: Vec<&str> = favorites.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert!(favorites.iter().all(|event| event.favorite));

        let second = api.get_favorite_events(&Page::new(1, 1)).await.unwrap();
        assert_eq!(second[0].event_id, EventId::new("3"));
        assert_eq!(api.calls().last(), Some(&ApiCall::GetFavorites(Page::new(1, 1))));
    }

    #[tokio::test]
    async fn scripted_failures_are_used_once_in_order() {
        let api = catalogue();
        api.fail_next(ApiError::NotFound);
        api.fail_next(ApiError::Transport("reset".to_string()));

        let id = EventId::new("1");
        assert_eq!(api.create_favorite_event(&id).await, Err(ApiError::NotFound));
        assert!(matches!(
            api.create_favorite_event(&id).await,
            Err(ApiError::Transport(_))
        ));
        assert_eq!(api.create_favorite_event(&id).await, Ok(()));
        assert!(api.favorites().contains(&id));
        assert_eq!(api.calls().len(), 3);
    }

    #[tokio::test]
    async fn fail_all_until_recover() {
        let api = catalogue();
        api.fail_all(ApiError::Status {
            status: 503,
            body: "maintenance".to_string(),
        });

        let host = UserProfileId::new("host");
        assert!(api.create_follower(&host).await.is_err());
        assert!(api.create_follower(&host).await.is_err());

        api.recover();
        api.create_follower(&host).await.unwrap();
        assert!(api.following().contains(&host));
    }

    #[tokio::test]
    async fn unknown_profile_is_not_found() {
        let api = catalogue();
        let error = api
            .get_user_profile(&UserProfileId::new("nobody"))
            .await
            .unwrap_err();
        assert_eq!(error, ApiError::NotFound);
    }
}
