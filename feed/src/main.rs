//! Plugg feed demo.
//!
//! Loads the feed, toggles favorites through both trigger paths, follows a
//! host and loads its profile, logging every async signal in its dispatch
//! form.
//!
//! # Usage
//!
//! Against the in-memory API (with an injected failure):
//! ```bash
//! RUST_LOG=plugg_feed=debug,plugg_runtime=debug cargo run --bin plugg-feed
//! ```
//!
//! Against the live API:
//! ```bash
//! PLUGG_API_URL=http://api-dev.pluggnation.com PLUGG_API_TOKEN=... \
//!   cargo run --bin plugg-feed
//! ```

use anyhow::Context;
use plugg_core::environment::{Clock, SystemClock};
use plugg_feed::actions::signal_envelope;
use plugg_feed::mock::InMemoryEventApi;
use plugg_feed::{
    ApiError, Event, EventApi, EventId, FavoriteButton, FeedAction, FeedConfig, FeedEnvironment,
    FeedState, FeedStore, HostProfileLoader, HttpEventApi, Page, UserProfile, UserProfileId,
    feed_reducer,
};
use plugg_runtime::metrics::MetricsServer;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = FeedConfig::from_env().context("loading configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_level)
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut metrics = MetricsServer::new(config.metrics_addr);
    metrics.start()?;

    // Live API when credentials are configured, otherwise a seeded in-memory one
    let (api, in_memory): (Arc<dyn EventApi>, Option<InMemoryEventApi>) =
        if config.api_token.is_some() {
            info!(api_url = %config.api_url, "Using live API");
            (Arc::new(HttpEventApi::from_config(&config)?), None)
        } else {
            info!("Using in-memory API");
            let demo = demo_api();
            (Arc::new(demo.clone()), Some(demo))
        };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: FeedStore = FeedStore::with_config(
        FeedState::default(),
        feed_reducer(),
        FeedEnvironment::new(Arc::clone(&api), clock),
        config.store_config(),
    );

    let observer = tokio::spawn(log_signals(store.subscribe_actions()));

    // Load the feed
    let mut handle = store
        .send(FeedAction::RefreshFeed {
            query: config.feed_query(),
        })
        .await?;
    handle.wait().await;

    let feed = store.state(|s| s.feed.clone()).await;
    info!(events = feed.len(), "Feed loaded");
    let Some(first) = feed.first().cloned() else {
        info!("Feed is empty, nothing to toggle");
        return shutdown(&store, observer, &metrics).await;
    };

    // Tracked toggle through the reducer: overlay first, then confirmation
    let mut handle = store
        .send(FeedAction::FavoriteTapped {
            event_id: first.event_id.clone(),
        })
        .await?;
    let displayed = store.state(|s| s.is_favorite(&first.event_id)).await;
    info!(event_id = %first.event_id, ?displayed, "Favorite tapped");
    handle.wait().await;
    let confirmed = store.state(|s| s.confirmed_favorite(&first.event_id)).await;
    info!(event_id = %first.event_id, ?confirmed, "Favorite confirmed");

    // The favorites list, kept in step with later toggles
    let mut handle = store
        .send(FeedAction::RefreshFavorites {
            page: Page::default(),
        })
        .await?;
    handle.wait().await;
    let favorites = store.state(|s| s.favorites.len()).await;
    info!(favorites, "Favorites loaded");

    // A failing tracked toggle rolls its overlay back
    if let Some(demo) = &in_memory {
        demo.fail_next(ApiError::Status {
            status: 503,
            body: "maintenance".to_string(),
        });
        let mut handle = store
            .send(FeedAction::FavoriteTapped {
                event_id: first.event_id.clone(),
            })
            .await?;
        handle.wait().await;
        let displayed = store.state(|s| s.is_favorite(&first.event_id)).await;
        info!(event_id = %first.event_id, ?displayed, "Overlay after failed toggle");
    }

    // Untracked toggle through a button with its own mirror
    if let Some(second) = feed.get(1) {
        let mut button = FavoriteButton::new(store.clone(), Arc::clone(&api), second);
        button.press().await?;
        let in_store = store.state(|s| s.is_favorite(&second.event_id)).await;
        info!(
            event_id = %second.event_id,
            button = button.is_favorite(),
            ?in_store,
            "Favorite button pressed"
        );
    }

    // Follow the host and load their profile
    if let Some(host) = first.owner.clone() {
        let mut handle = store
            .send(FeedAction::FollowTapped { host: host.clone() })
            .await?;
        handle.wait().await;
        let following = store.state(|s| s.is_following(&host)).await;
        info!(host = %host, following, "Follow toggled");

        let loader = HostProfileLoader::new(Arc::clone(&api));
        match loader.load(host).await {
            Ok(profile) => info!(username = %profile.username, "Host profile loaded"),
            Err(error) => tracing::warn!(error = %error, "Host profile unavailable"),
        }
    }

    shutdown(&store, observer, &metrics).await
}

async fn log_signals(mut actions: tokio::sync::broadcast::Receiver<FeedAction>) {
    loop {
        match actions.recv().await {
            Ok(action) => match signal_envelope(&action) {
                Ok(Some(envelope)) => match serde_json::to_string(&envelope) {
                    Ok(json) => info!(signal = %json, "Signal"),
                    Err(error) => tracing::warn!(error = %error, "Unrenderable signal"),
                },
                Ok(None) => {},
                Err(error) => tracing::warn!(error = %error, "Unrenderable signal"),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Signal observer lagged");
            },
            Err(RecvError::Closed) => break,
        }
    }
}

async fn shutdown(
    store: &FeedStore,
    observer: tokio::task::JoinHandle<()>,
    metrics: &MetricsServer,
) -> anyhow::Result<()> {
    store.shutdown(store.shutdown_timeout()).await?;
    observer.abort();

    if let Some(rendered) = metrics.render() {
        info!("Metrics:\n{rendered}");
    }
    info!("Done");
    Ok(())
}

fn demo_api() -> InMemoryEventApi {
    let host = UserProfileId::new("host-djkay");
    InMemoryEventApi::new()
        .with_events(vec![
            Event::new(EventId::new("evt-rooftop"), "Rooftop Sessions", false)
                .at_venue("The Deck", "Austin")
                .with_owner(host.clone()),
            Event::new(EventId::new("evt-warehouse"), "Warehouse 12", true)
                .at_venue("Warehouse 12", "Austin"),
            Event::new(EventId::new("evt-sunday"), "Sunday Social", false)
                .at_venue("Zilker Park", "Austin"),
        ])
        .with_profile(UserProfile {
            user_profile_id: host,
            username: "djkay".to_string(),
            display_name: Some("DJ Kay".to_string()),
            bio: Some("House and disco, every weekend".to_string()),
            profile_image_url: None,
        })
}
