//! Domain types for the event feed.
//!
//! The feed is an ordered list of [`Event`]s owned by the reducer. Each
//! event carries a `favorite` flag that only changes through a confirmed
//! toggle or a feed replacement. While a tracked toggle is in flight the
//! displayed value comes from a [`PendingToggle`] overlay instead.

use crate::api::ApiError;
use chrono::{DateTime, Utc};
use plugg_core::AsyncSignal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Unique identifier for an event
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates a new `EventId` from a string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user profile (event hosts included)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfileId(String);

impl UserProfileId {
    /// Creates a new `UserProfileId` from a string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An event as returned by the feed endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event identifier
    pub event_id: EventId,
    /// Display name
    #[serde(rename = "eventName", default)]
    pub name: String,
    /// Venue name
    #[serde(rename = "venueName", default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    /// City the venue is in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Start time
    #[serde(rename = "eventStartTime", default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    /// End time
    #[serde(rename = "eventEndTime", default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    /// Whether the current user has favorited the event
    #[serde(default)]
    pub favorite: bool,
    /// The host who owns the event
    #[serde(rename = "ownerUserProfileId", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserProfileId>,
    /// Cover image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_image_url: Option<String>,
}

impl Event {
    /// Creates an event with only an id, a name and a favorite flag
    #[must_use]
    pub fn new(event_id: EventId, name: impl Into<String>, favorite: bool) -> Self {
        Self {
            event_id,
            name: name.into(),
            venue: None,
            city: None,
            starts_at: None,
            ends_at: None,
            favorite,
            owner: None,
            primary_image_url: None,
        }
    }

    /// Sets the owning host
    #[must_use]
    pub fn with_owner(mut self, owner: UserProfileId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Sets the venue and city
    #[must_use]
    pub fn at_venue(mut self, venue: impl Into<String>, city: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self.city = Some(city.into());
        self
    }

    /// Sets the start and end times
    #[must_use]
    pub fn scheduled(mut self, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        self.starts_at = Some(starts_at);
        self.ends_at = Some(ends_at);
        self
    }
}

/// Per-event sequence number of a tracked favorite toggle
pub type Generation = u64;

/// Request to toggle an event's favorite flag.
///
/// `favorite` is the state *before* the toggle: `true` means "currently
/// favorited, remove it". `generation` is set only for toggles issued
/// through the reducer's overlay path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteRequest {
    /// Event to toggle
    pub event_id: EventId,
    /// Current (pre-toggle) favorite state
    pub favorite: bool,
    /// Sequence number for tracked toggles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<Generation>,
}

impl ToggleFavoriteRequest {
    /// A toggle without a generation; its response always applies
    #[must_use]
    pub const fn untracked(event_id: EventId, favorite: bool) -> Self {
        Self {
            event_id,
            favorite,
            generation: None,
        }
    }

    /// A toggle tagged with the event's latest generation
    #[must_use]
    pub const fn tracked(event_id: EventId, favorite: bool, generation: Generation) -> Self {
        Self {
            event_id,
            favorite,
            generation: Some(generation),
        }
    }
}

/// Parameters of a feed fetch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    /// Latitude of the search center
    pub lat: f64,
    /// Longitude of the search center
    pub lon: f64,
    /// Search radius
    pub distance_in_miles: f64,
    /// Page offset
    pub offset: u32,
    /// Page size
    pub limit: u32,
}

impl FeedQuery {
    /// Default page size
    pub const DEFAULT_LIMIT: u32 = 20;

    /// First page around a location
    #[must_use]
    pub const fn around(lat: f64, lon: f64, distance_in_miles: f64) -> Self {
        Self {
            lat,
            lon,
            distance_in_miles,
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    /// Same location, different page
    #[must_use]
    pub const fn page(mut self, offset: u32, limit: u32) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

/// Offset and size of a paged listing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    /// Number of items to skip
    pub offset: u32,
    /// Maximum number of items returned
    pub limit: u32,
}

impl Page {
    /// First page of the default size
    pub const FIRST: Self = Self {
        offset: 0,
        limit: FeedQuery::DEFAULT_LIMIT,
    };

    /// A page at `offset` holding up to `limit` items
    #[must_use]
    pub const fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Request to follow or unfollow a host
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    /// Host to follow or unfollow
    pub user_profile_id: UserProfileId,
    /// Current (pre-toggle) follow state
    pub following: bool,
}

/// A user's public profile
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Profile identifier
    pub user_profile_id: UserProfileId,
    /// Handle
    pub username: String,
    /// Full display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Free-form bio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Avatar image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

/// Provisional favorite value shown while a tracked toggle is in flight
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingToggle {
    /// Generation of the request that owns this overlay
    pub generation: Generation,
    /// The value displayed until the request settles
    pub favorite: bool,
    /// When the toggle was requested
    pub requested_at: DateTime<Utc>,
}

/// Signals of the favorite toggle
pub type ToggleFavoriteSignal = AsyncSignal<ToggleFavoriteRequest, (), ApiError>;

/// Signals of the feed fetch
pub type FetchFeedSignal = AsyncSignal<FeedQuery, Vec<Event>, ApiError>;

/// Signals of the favorites list fetch
pub type FetchFavoritesSignal = AsyncSignal<Page, Vec<Event>, ApiError>;

/// Signals of the host follow toggle
pub type ToggleFollowSignal = AsyncSignal<FollowRequest, (), ApiError>;

/// Actions for the feed reducer
#[derive(Clone, Debug, PartialEq)]
pub enum FeedAction {
    /// Favorite toggle signals
    ToggleFavorite(ToggleFavoriteSignal),
    /// Feed fetch signals
    FetchFeed(FetchFeedSignal),
    /// Host follow toggle signals
    ToggleFollow(ToggleFollowSignal),
    /// Favorites list fetch signals
    FetchFavorites(FetchFavoritesSignal),

    /// The user tapped the favorite control of an event
    FavoriteTapped {
        /// Event tapped
        event_id: EventId,
    },
    /// The feed should be (re)loaded
    RefreshFeed {
        /// Fetch parameters
        query: FeedQuery,
    },
    /// The user's favorites list should be (re)loaded
    RefreshFavorites {
        /// Page to load
        page: Page,
    },
    /// The user tapped the follow control of a host
    FollowTapped {
        /// Host tapped
        host: UserProfileId,
    },
}

impl FeedAction {
    /// Whether this action is a settled async signal (`Succeeded` or `Failed`)
    #[must_use]
    pub const fn is_settled_signal(&self) -> bool {
        match self {
            Self::ToggleFavorite(signal) => signal.is_settled(),
            Self::FetchFeed(signal) => signal.is_settled(),
            Self::ToggleFollow(signal) => signal.is_settled(),
            Self::FetchFavorites(signal) => signal.is_settled(),
            Self::FavoriteTapped { .. }
            | Self::RefreshFeed { .. }
            | Self::RefreshFavorites { .. }
            | Self::FollowTapped { .. } => false,
        }
    }
}

/// State owned by the feed reducer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedState {
    /// The feed, in server order
    pub feed: Vec<Event>,
    /// Overlays of in-flight tracked toggles
    pub pending: HashMap<EventId, PendingToggle>,
    /// Latest generation issued per event
    pub generations: HashMap<EventId, Generation>,
    /// Hosts the user follows
    pub following: HashSet<UserProfileId>,
    /// The user's favorite events, as last loaded and then kept in step
    /// with confirmed toggles
    pub favorites: Vec<Event>,
}

impl FeedState {
    /// State with a loaded feed and nothing in flight
    #[must_use]
    pub fn with_feed(feed: Vec<Event>) -> Self {
        Self {
            feed,
            ..Self::default()
        }
    }

    /// The event with this id, if it is in the feed
    #[must_use]
    pub fn event(&self, event_id: &EventId) -> Option<&Event> {
        self.feed.iter().find(|event| &event.event_id == event_id)
    }

    /// The favorite value to display: the overlay while a tracked toggle
    /// is in flight, otherwise the confirmed value. `None` when the event
    /// is not in the feed.
    #[must_use]
    pub fn is_favorite(&self, event_id: &EventId) -> Option<bool> {
        let confirmed = self.event(event_id)?.favorite;
        Some(
            self.pending
                .get(event_id)
                .map_or(confirmed, |pending| pending.favorite),
        )
    }

    /// The confirmed favorite value, ignoring any overlay
    #[must_use]
    pub fn confirmed_favorite(&self, event_id: &EventId) -> Option<bool> {
        self.event(event_id).map(|event| event.favorite)
    }

    /// Whether a tracked toggle is in flight for this event
    #[must_use]
    pub fn is_pending(&self, event_id: &EventId) -> bool {
        self.pending.contains_key(event_id)
    }

    /// Whether the user follows this host
    #[must_use]
    pub fn is_following(&self, host: &UserProfileId) -> bool {
        self.following.contains(host)
    }

    /// Whether the event is in the user's favorites list
    #[must_use]
    pub fn in_favorites(&self, event_id: &EventId) -> bool {
        self.favorites.iter().any(|event| &event.event_id == event_id)
    }

    /// Ids of the events currently displayed as favorited
    #[must_use]
    pub fn favorite_ids(&self) -> Vec<EventId> {
        self.feed
            .iter()
            .filter(|event| self.is_favorite(&event.event_id) == Some(true))
            .map(|event| event.event_id.clone())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(s: &str) -> EventId {
        EventId::new(s)
    }

    #[test]
    fn event_reads_the_feed_wire_format() {
        let json = r#"{
            "eventId": "evt-1",
            "eventName": "Rooftop Sessions",
            "venueName": "The Deck",
            "city": "Austin",
            "eventStartTime": "2025-06-01T20:00:00Z",
            "eventEndTime": "2025-06-02T02:00:00Z",
            "favorite": true,
            "ownerUserProfileId": "host-9",
            "primaryImageUrl": "https://cdn.example.com/evt-1.jpg"
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_id, id("evt-1"));
        assert_eq!(event.venue.as_deref(), Some("The Deck"));
        assert_eq!(event.owner, Some(UserProfileId::new("host-9")));
        assert!(event.favorite);
        assert!(event.starts_at.unwrap() < event.ends_at.unwrap());
    }

    #[test]
    fn event_tolerates_missing_optional_fields() {
        let event: Event = serde_json::from_str(r#"{"eventId": "evt-2"}"#).unwrap();
        assert_eq!(event, Event::new(id("evt-2"), "", false));
    }

    #[test]
    fn untracked_request_omits_generation() {
        let json = serde_json::to_value(ToggleFavoriteRequest::untracked(id("1"), true)).unwrap();
        assert_eq!(json, serde_json::json!({ "eventId": "1", "favorite": true }));

        let json = serde_json::to_value(ToggleFavoriteRequest::tracked(id("1"), false, 3)).unwrap();
        assert_eq!(json["generation"], 3);
    }

    #[test]
    fn overlay_takes_precedence_over_confirmed_value() {
        let mut state = FeedState::with_feed(vec![Event::new(id("1"), "a", false)]);
        assert_eq!(state.is_favorite(&id("1")), Some(false));

        state.pending.insert(
            id("1"),
            PendingToggle {
                generation: 1,
                favorite: true,
                requested_at: Utc::now(),
            },
        );
        assert_eq!(state.is_favorite(&id("1")), Some(true));
        assert_eq!(state.confirmed_favorite(&id("1")), Some(false));
        assert_eq!(state.favorite_ids(), vec![id("1")]);
    }

    #[test]
    fn absent_event_has_no_favorite_value() {
        let state = FeedState::default();
        assert_eq!(state.is_favorite(&id("missing")), None);
        assert!(!state.is_pending(&id("missing")));
    }

    #[test]
    fn feed_query_serializes_camel_case() {
        let query = FeedQuery::around(30.26, -97.74, 25.0).page(20, 10);
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["distanceInMiles"], 25.0);
        assert_eq!(json["offset"], 20);
        assert_eq!(json["limit"], 10);
    }

    #[test]
    fn default_page_is_the_first() {
        assert_eq!(Page::default(), Page::new(0, FeedQuery::DEFAULT_LIMIT));
    }
}
