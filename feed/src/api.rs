//! Remote call layer.
//!
//! [`EventApi`] is the collaborator the reducer's effects and the trigger
//! sites call into. It is injected through the environment as
//! `Arc<dyn EventApi>`; there is no process-wide client.
//!
//! Two implementations live in this crate:
//!
//! - [`HttpEventApi`](crate::http::HttpEventApi): the Plugg REST API over `reqwest`
//! - [`InMemoryEventApi`](crate::mock::InMemoryEventApi): scriptable, for
//!   tests and the demo binary

use crate::types::{Event, EventId, FeedQuery, Page, UserProfile, UserProfileId};
use plugg_core::OperationPanicked;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors returned by the remote call layer.
///
/// Messages are kept as strings so the error is `Clone` and can travel
/// inside a `Failed` signal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (connect, TLS, timeout)
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status
    #[error("API error {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, if readable
        body: String,
    },

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The configured API URL cannot be used as a request base
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// The requested resource does not exist
    #[error("Not found")]
    NotFound,

    /// The operation panicked before producing a result
    #[error(transparent)]
    Panicked(#[from] OperationPanicked),
}

/// Result alias for remote calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Boxed future returned by [`EventApi`] methods
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = ApiResult<T>> + Send + 'a>>;

/// The Plugg remote API, as far as the feed is concerned.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so the trait can be used as
/// `Arc<dyn EventApi>` inside an environment.
pub trait EventApi: Send + Sync {
    /// Mark an event as a favorite of the current user
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    fn create_favorite_event<'a>(&'a self, event_id: &'a EventId) -> ApiFuture<'a, ()>;

    /// Remove an event from the current user's favorites
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    fn remove_favorite_event<'a>(&'a self, event_id: &'a EventId) -> ApiFuture<'a, ()>;

    /// Fetch one page of the current user's favorite events
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    fn get_favorite_events<'a>(&'a self, page: &'a Page) -> ApiFuture<'a, Vec<Event>>;

    /// Fetch one page of the feed around a location
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    fn get_event_feed<'a>(&'a self, query: &'a FeedQuery) -> ApiFuture<'a, Vec<Event>>;

    /// Follow a host
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    fn create_follower<'a>(&'a self, user_profile_id: &'a UserProfileId) -> ApiFuture<'a, ()>;

    /// Unfollow a host
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    fn remove_follower<'a>(&'a self, user_profile_id: &'a UserProfileId) -> ApiFuture<'a, ()>;

    /// Look up a user's public profile
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if there is no such user.
    fn get_user_profile<'a>(
        &'a self,
        user_profile_id: &'a UserProfileId,
    ) -> ApiFuture<'a, UserProfile>;
}
