//! # Profile Service
//!
//! Mirrors the signed-in user's display metadata against the cloud profile
//! store. Used only for display; never for inventory or bill records.
//!
//! Failure policy: a load that cannot reach the store falls back to a
//! usable default profile (the shop keeps selling); a save failure is
//! reported to the caller and nothing local is corrupted.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use kirana_core::validation::{
    normalize_gst_number, validate_mobile_number, validate_person_name, validate_store_name,
};
use kirana_core::UserProfile;

use crate::error::{AppError, AppResult};
use crate::external::ProfileStore;

/// Service for loading and saving the user profile.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        ProfileService { store }
    }

    /// Loads the user's profile.
    ///
    /// A missing document or an unreachable store both fall back to a
    /// default profile, so the rest of the app keeps working offline.
    pub async fn load(&self, user_id: &str) -> UserProfile {
        match self.store.get(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => UserProfile::default_for(user_id),
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "Profile fetch failed, using default");
                UserProfile::default_for(user_id)
            }
        }
    }

    /// Validates and saves the user's profile.
    pub async fn save(&self, mut profile: UserProfile) -> AppResult<()> {
        validate_person_name(&profile.name)?;
        validate_store_name(&profile.store_name)?;
        if !profile.mobile_number.trim().is_empty() {
            validate_mobile_number(&profile.mobile_number)?;
        }

        profile.name = profile.name.trim().to_string();
        profile.store_name = profile.store_name.trim().to_string();
        profile.mobile_number = profile.mobile_number.trim().to_string();
        profile.gst_number = normalize_gst_number(&profile.gst_number);
        profile.updated_at = Utc::now();

        self.store
            .put(&profile)
            .await
            .map_err(|e| AppError::Profile(e.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::external::{InMemoryProfileStore, ProfileStoreError};
    use async_trait::async_trait;

    /// A store that is always unreachable.
    struct DownStore;

    #[async_trait]
    impl ProfileStore for DownStore {
        async fn get(&self, _user_id: &str) -> Result<Option<UserProfile>, ProfileStoreError> {
            Err(ProfileStoreError("network down".to_string()))
        }

        async fn put(&self, _profile: &UserProfile) -> Result<(), ProfileStoreError> {
            Err(ProfileStoreError("network down".to_string()))
        }
    }

    fn valid_profile(user_id: &str) -> UserProfile {
        UserProfile {
            name: "Asha Devi".to_string(),
            store_name: "Asha General Store".to_string(),
            mobile_number: "9876543210".to_string(),
            gst_number: " 27aapfu0939f1zv ".to_string(),
            profile_setup_completed: true,
            ..UserProfile::default_for(user_id)
        }
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let svc = ProfileService::new(Arc::new(InMemoryProfileStore::new()));

        svc.save(valid_profile("u-1")).await.unwrap();

        let loaded = svc.load("u-1").await;
        assert_eq!(loaded.name, "Asha Devi");
        // GST is normalized on save
        assert_eq!(loaded.gst_number, "27AAPFU0939F1ZV");
    }

    #[tokio::test]
    async fn test_missing_document_falls_back_to_default() {
        let svc = ProfileService::new(Arc::new(InMemoryProfileStore::new()));

        let loaded = svc.load("nobody").await;
        assert_eq!(loaded.user_id, "nobody");
        assert!(loaded.unlocked);
        assert!(!loaded.profile_setup_completed);
    }

    #[tokio::test]
    async fn test_unreachable_store_falls_back_to_default() {
        let svc = ProfileService::new(Arc::new(DownStore));

        let loaded = svc.load("u-1").await;
        assert_eq!(loaded.user_id, "u-1");
        assert!(loaded.unlocked);
    }

    #[tokio::test]
    async fn test_save_validates_fields() {
        let svc = ProfileService::new(Arc::new(InMemoryProfileStore::new()));

        let mut bad = valid_profile("u-1");
        bad.name = "A".to_string(); // too short
        assert_eq!(
            svc.save(bad).await.unwrap_err().code(),
            ErrorCode::ValidationError
        );

        let mut bad = valid_profile("u-1");
        bad.mobile_number = "12345".to_string();
        assert_eq!(
            svc.save(bad).await.unwrap_err().code(),
            ErrorCode::ValidationError
        );
    }

    #[tokio::test]
    async fn test_save_failure_surfaces_as_profile_error() {
        let svc = ProfileService::new(Arc::new(DownStore));

        let err = svc.save(valid_profile("u-1")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProfileError);
    }
}
