//! Favorite button trigger site.
//!
//! The button keeps its own `favorite` mirror, initialised from the event
//! it renders. A press flips the mirror immediately and then dispatches an
//! untracked toggle through the store. The mirror is never corrected from
//! the settled signal: if the toggle fails the button keeps showing the
//! flipped value while the reducer's feed does not change. Reads that must
//! agree with the server go through [`FeedState::is_favorite`](crate::FeedState::is_favorite)
//! and [`FeedAction::FavoriteTapped`] instead.

use crate::FeedStore;
use crate::actions::{ToggleFavoriteAction, toggle_favorite};
use crate::api::EventApi;
use crate::types::{Event, EventId, FeedAction, ToggleFavoriteRequest};
use plugg_core::AsyncSignal;
use plugg_runtime::StoreError;
use std::sync::Arc;

/// A favorite control bound to one event
pub struct FavoriteButton {
    event_id: EventId,
    favorite: bool,
    toggle: ToggleFavoriteAction,
    store: FeedStore,
}

impl FavoriteButton {
    /// Create a button for `event`, mirroring its current favorite flag
    #[must_use]
    pub fn new(store: FeedStore, api: Arc<dyn EventApi>, event: &Event) -> Self {
        Self {
            event_id: event.event_id.clone(),
            favorite: event.favorite,
            toggle: toggle_favorite(api),
            store,
        }
    }

    /// The event this button toggles
    #[must_use]
    pub const fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// The locally mirrored favorite flag
    #[must_use]
    pub const fn is_favorite(&self) -> bool {
        self.favorite
    }

    /// Flip the mirror and dispatch the toggle with the pre-press value.
    ///
    /// Resolves once the settled signal has been reduced and returns it.
    /// A failed toggle is logged here and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting
    /// down. The mirror has already flipped by then.
    pub async fn press(&mut self) -> Result<FeedAction, StoreError> {
        let request = ToggleFavoriteRequest::untracked(self.event_id.clone(), self.favorite);
        self.favorite = !self.favorite;

        let settled = self.store.dispatch_async(&self.toggle, request).await?;

        if let FeedAction::ToggleFavorite(AsyncSignal::Failed { error, .. }) = &settled {
            tracing::warn!(
                event_id = %self.event_id,
                error = %error,
                "Favorite toggle failed; button keeps its flipped state"
            );
        }

        Ok(settled)
    }
}
