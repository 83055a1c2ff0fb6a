//! Event feed and favorite reconciliation for the Plugg client.
//!
//! This crate wires the Plugg remote API into the store architecture:
//!
//! - **Remote calls** ([`EventApi`]) are injected through [`FeedEnvironment`],
//!   with an HTTP implementation and an in-memory one
//! - **Async actions** ([`actions`]) turn each call into Started, then
//!   Succeeded or Failed
//! - **The reducer** ([`feed_reducer`]) owns the feed, reconciles favorite
//!   toggles and keeps optimistic overlays for in-flight tracked toggles
//! - **Trigger sites** ([`FavoriteButton`], [`HostProfileLoader`]) act on
//!   user gestures and view lifetimes
//!
//! # Example Usage
//!
//! ```no_run
//! use plugg_feed::mock::InMemoryEventApi;
//! use plugg_feed::{Event, EventApi, EventId, FeedAction, FeedEnvironment, FeedQuery, FeedState, feed_reducer};
//! use plugg_core::environment::{Clock, SystemClock};
//! use plugg_runtime::Store;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api: Arc<dyn EventApi> = Arc::new(InMemoryEventApi::new().with_events(vec![
//!     Event::new(EventId::new("evt-1"), "Rooftop Sessions", false),
//! ]));
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//!
//! let store = Store::new(FeedState::default(), feed_reducer(), FeedEnvironment::new(api, clock));
//!
//! let mut handle = store
//!     .send(FeedAction::RefreshFeed { query: FeedQuery::around(30.27, -97.74, 25.0) })
//!     .await?;
//! handle.wait().await;
//!
//! store.send(FeedAction::FavoriteTapped { event_id: EventId::new("evt-1") }).await?;
//! let favorite = store.state(|s| s.is_favorite(&EventId::new("evt-1"))).await;
//! assert_eq!(favorite, Some(true));
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod api;
pub mod config;
pub mod host;
pub mod http;
pub mod mock;
pub mod reducer;
pub mod trigger;
pub mod types;

use plugg_runtime::Store;

// Re-export commonly used types
pub use api::{ApiError, ApiResult, EventApi};
pub use config::{ConfigError, FeedConfig};
pub use host::HostProfileLoader;
pub use http::HttpEventApi;
pub use reducer::{FeedEnvironment, FeedReducer, feed_reducer};
pub use trigger::FavoriteButton;
pub use types::{
    Event, EventId, FeedAction, FeedQuery, FeedState, FollowRequest, Page, PendingToggle,
    ToggleFavoriteRequest, UserProfile, UserProfileId,
};

/// A store running the feed reducer
pub type FeedStore = Store<FeedState, FeedAction, FeedEnvironment, FeedReducer>;
