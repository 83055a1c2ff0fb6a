//! `reqwest` implementation of [`EventApi`].
//!
//! Every endpoint answers with a `{ "data": ... }` envelope. Requests carry
//! the bearer token from [`FeedConfig`](crate::config::FeedConfig).

use crate::api::{ApiError, ApiFuture, ApiResult, EventApi};
use crate::config::FeedConfig;
use crate::types::{Event, EventId, FeedQuery, Page, UserProfile, UserProfileId};
use futures::FutureExt;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Response envelope used by every Plugg endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// HTTP client for the Plugg API
#[derive(Clone, Debug)]
pub struct HttpEventApi {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpEventApi {
    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if the configured API URL cannot
    /// carry a path, and [`ApiError::Transport`] if the underlying client
    /// cannot be built (e.g. the TLS backend fails to initialise).
    pub fn from_config(config: &FeedConfig) -> Result<Self, ApiError> {
        let base = parse_base(&config.api_url)?;
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base,
            token: config.api_token.clone(),
        })
    }

    /// Create a client with an explicit base URL and no credentials
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if `api_url` is not an absolute
    /// URL that can carry a path.
    pub fn new(api_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client: Client::new(),
            base: parse_base(api_url)?,
            token: None,
        })
    }

    /// Attach a bearer token to every request
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// The base URL requests are sent to
    #[must_use]
    pub fn api_url(&self) -> &str {
        self.base.as_str()
    }

    /// The base URL with `segments` appended, each percent-encoded as a
    /// single path segment
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        // `url` drops dot segments instead of encoding them
        if let Some(segment) = segments
            .iter()
            .find(|segment| matches!(**segment, "" | "." | ".."))
        {
            return Err(ApiError::InvalidUrl(format!("unroutable path segment {segment:?}")));
        }

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> ApiResult<RequestBuilder> {
        let builder = self.client.request(method, self.endpoint(segments)?);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::Status {
                    status: status.as_u16(),
                    body,
                })
            },
        }
    }

    async fn execute(&self, method: Method, segments: &[&str]) -> ApiResult<()> {
        let builder = self.request(method, segments)?;
        self.send(builder).await.map(|_| ())
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = self.send(builder).await?;
        response
            .json::<Envelope<T>>()
            .await
            .map(|envelope| envelope.data)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn parse_base(api_url: &str) -> ApiResult<Url> {
    let base = Url::parse(api_url).map_err(|e| ApiError::InvalidUrl(format!("{api_url}: {e}")))?;
    if base.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl(api_url.to_string()));
    }
    Ok(base)
}

impl EventApi for HttpEventApi {
    fn create_favorite_event<'a>(&'a self, event_id: &'a EventId) -> ApiFuture<'a, ()> {
        tracing::debug!(event_id = %event_id, "PUT favorite");
        async move {
            self.execute(Method::PUT, &["me", "favorites", event_id.as_str()])
                .await
        }
        .boxed()
    }

    fn remove_favorite_event<'a>(&'a self, event_id: &'a EventId) -> ApiFuture<'a, ()> {
        tracing::debug!(event_id = %event_id, "DELETE favorite");
        async move {
            self.execute(Method::DELETE, &["me", "favorites", event_id.as_str()])
                .await
        }
        .boxed()
    }

    fn get_favorite_events<'a>(&'a self, page: &'a Page) -> ApiFuture<'a, Vec<Event>> {
        tracing::debug!(?page, "GET favorites");
        async move {
            let builder = self.request(Method::GET, &["me", "favorites"])?.query(&[
                ("offset", page.offset.to_string()),
                ("limit", page.limit.to_string()),
            ]);
            self.fetch(builder).await
        }
        .boxed()
    }

    fn get_event_feed<'a>(&'a self, query: &'a FeedQuery) -> ApiFuture<'a, Vec<Event>> {
        tracing::debug!(?query, "GET feed");
        async move {
            let builder = self.request(Method::GET, &["events", "feed"])?.query(&[
                ("lat", query.lat.to_string()),
                ("lon", query.lon.to_string()),
                ("distanceInMiles", query.distance_in_miles.to_string()),
                ("offset", query.offset.to_string()),
                ("limit", query.limit.to_string()),
            ]);
            self.fetch(builder).await
        }
        .boxed()
    }

    fn create_follower<'a>(&'a self, user_profile_id: &'a UserProfileId) -> ApiFuture<'a, ()> {
        async move {
            self.execute(Method::PUT, &["me", "followers", user_profile_id.as_str()])
                .await
        }
        .boxed()
    }

    fn remove_follower<'a>(&'a self, user_profile_id: &'a UserProfileId) -> ApiFuture<'a, ()> {
        async move {
            self.execute(Method::DELETE, &["me", "followers", user_profile_id.as_str()])
                .await
        }
        .boxed()
    }

    fn get_user_profile<'a>(
        &'a self,
        user_profile_id: &'a UserProfileId,
    ) -> ApiFuture<'a, UserProfile> {
        async move {
            let builder = self.request(Method::GET, &["users", user_profile_id.as_str()])?;
            let profiles: Vec<UserProfile> = self.fetch(builder).await?;
            profiles.into_iter().next().ok_or(ApiError::NotFound)
        }
        .boxed()
    }
}
