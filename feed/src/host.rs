//! Host profile lookups tied to a view's lifetime.
//!
//! An event card shows its host's profile. The lookup is started when the
//! card appears and must not deliver a result after the card is gone, so
//! every lookup runs inside the loader's [`CancellationScope`]. Dropping
//! the loader or calling [`HostProfileLoader::unmount`] cancels them.

use crate::api::{ApiError, EventApi};
use crate::types::{UserProfile, UserProfileId};
use plugg_core::{CancellableError, CancellationScope};
use std::sync::Arc;

/// Loads host profiles for one view
pub struct HostProfileLoader {
    api: Arc<dyn EventApi>,
    scope: CancellationScope,
}

impl HostProfileLoader {
    /// Create a loader with an empty scope
    #[must_use]
    pub fn new(api: Arc<dyn EventApi>) -> Self {
        Self {
            api,
            scope: CancellationScope::new(),
        }
    }

    /// Fetch a host's profile.
    ///
    /// # Errors
    ///
    /// Returns [`CancellableError::Canceled`] if the loader was unmounted
    /// before the lookup settled, whatever its outcome, and
    /// [`CancellableError::Failed`] if the lookup itself failed.
    pub async fn load(
        &self,
        host: UserProfileId,
    ) -> Result<UserProfile, CancellableError<ApiError>> {
        let api = Arc::clone(&self.api);
        let lookup = async move { api.get_user_profile(&host).await };

        let outcome = self.scope.wrap(lookup).await;
        if let Err(CancellableError::Canceled) = &outcome {
            tracing::debug!("Host profile lookup canceled");
        }
        outcome
    }

    /// Cancel every lookup still in flight
    pub fn unmount(&self) {
        self.scope.cancel_all();
    }

    /// Number of lookups still tracked by the scope
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.scope.in_flight()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::InMemoryEventApi;
    use std::time::Duration;

    fn host() -> UserProfile {
        UserProfile {
            user_profile_id: UserProfileId::new("host-1"),
            username: "djkay".to_string(),
            display_name: Some("DJ Kay".to_string()),
            bio: None,
            profile_image_url: None,
        }
    }

    #[tokio::test]
    async fn loads_while_mounted() {
        let loader = HostProfileLoader::new(Arc::new(InMemoryEventApi::new().with_profile(host())));
        let profile = loader.load(UserProfileId::new("host-1")).await.unwrap();
        assert_eq!(profile, host());
    }

    #[tokio::test]
    async fn lookup_failure_is_reported() {
        let loader = HostProfileLoader::new(Arc::new(InMemoryEventApi::new()));
        let error = loader.load(UserProfileId::new("nobody")).await.unwrap_err();
        assert!(matches!(error, CancellableError::Failed(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn unmount_cancels_in_flight_lookups() {
        let api = InMemoryEventApi::new().with_profile(host());
        api.set_latency(Duration::from_millis(50));
        let loader = Arc::new(HostProfileLoader::new(Arc::new(api)));

        let pending = {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { loader.load(UserProfileId::new("host-1")).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        loader.unmount();

        let outcome = pending.await.unwrap();
        assert!(outcome.unwrap_err().is_canceled());
    }
}
