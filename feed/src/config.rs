//! Configuration for the feed client.
//!
//! Loads configuration from environment variables with defaults. Unset
//! variables take their default; a variable that is set but cannot be
//! parsed is an error.

use crate::types::FeedQuery;
use plugg_runtime::StoreConfig;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default API base URL
pub const DEFAULT_API_URL: &str = "http://api-dev.pluggnation.com";

/// Errors from loading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to a value that does not parse
    #[error("Invalid value for {key}: {value:?}")]
    Invalid {
        /// Environment variable name
        key: String,
        /// The raw value
        value: String,
    },
}

/// Feed client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// API base URL (`PLUGG_API_URL`)
    pub api_url: String,
    /// Bearer token (`PLUGG_API_TOKEN`)
    pub api_token: Option<String>,
    /// Per-request timeout (`PLUGG_HTTP_TIMEOUT_SECS`)
    pub http_timeout: Duration,
    /// Feed center latitude (`PLUGG_FEED_LAT`)
    pub feed_lat: f64,
    /// Feed center longitude (`PLUGG_FEED_LON`)
    pub feed_lon: f64,
    /// Feed radius (`PLUGG_FEED_DISTANCE_MILES`)
    pub feed_distance_miles: f64,
    /// Feed page size (`PLUGG_FEED_PAGE_SIZE`)
    pub feed_page_size: u32,
    /// Store shutdown timeout (`PLUGG_SHUTDOWN_TIMEOUT_SECS`)
    pub shutdown_timeout: Duration,
    /// Store action broadcast capacity (`PLUGG_BROADCAST_CAPACITY`)
    pub broadcast_capacity: usize,
    /// Address the Prometheus scrape endpoint listens on (`PLUGG_METRICS_ADDR`)
    pub metrics_addr: SocketAddr,
    /// Log filter (`RUST_LOG`)
    pub log_level: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            http_timeout: Duration::from_secs(30),
            feed_lat: 30.2672,
            feed_lon: -97.7431,
            feed_distance_miles: 25.0,
            feed_page_size: FeedQuery::DEFAULT_LIMIT,
            shutdown_timeout: Duration::from_secs(30),
            broadcast_capacity: 16,
            metrics_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            log_level: "info".to_string(),
        }
    }
}

impl FeedConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set but malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            api_url: lookup("PLUGG_API_URL").unwrap_or(defaults.api_url),
            api_token: lookup("PLUGG_API_TOKEN").filter(|token| !token.is_empty()),
            http_timeout: parse(&lookup, "PLUGG_HTTP_TIMEOUT_SECS")?
                .map_or(defaults.http_timeout, Duration::from_secs),
            feed_lat: parse(&lookup, "PLUGG_FEED_LAT")?.unwrap_or(defaults.feed_lat),
            feed_lon: parse(&lookup, "PLUGG_FEED_LON")?.unwrap_or(defaults.feed_lon),
            feed_distance_miles: parse(&lookup, "PLUGG_FEED_DISTANCE_MILES")?
                .unwrap_or(defaults.feed_distance_miles),
            feed_page_size: parse(&lookup, "PLUGG_FEED_PAGE_SIZE")?
                .unwrap_or(defaults.feed_page_size),
            shutdown_timeout: parse(&lookup, "PLUGG_SHUTDOWN_TIMEOUT_SECS")?
                .map_or(defaults.shutdown_timeout, Duration::from_secs),
            broadcast_capacity: parse(&lookup, "PLUGG_BROADCAST_CAPACITY")?
                .unwrap_or(defaults.broadcast_capacity),
            metrics_addr: parse(&lookup, "PLUGG_METRICS_ADDR")?.unwrap_or(defaults.metrics_addr),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        })
    }

    /// The first feed page for the configured location
    #[must_use]
    pub const fn feed_query(&self) -> FeedQuery {
        FeedQuery::around(self.feed_lat, self.feed_lon, self.feed_distance_miles)
            .page(0, self.feed_page_size)
    }

    /// Store configuration derived from this configuration
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default()
            .with_broadcast_capacity(self.broadcast_capacity)
            .with_shutdown_timeout(self.shutdown_timeout)
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value,
            })
        })
        .transpose()
}
