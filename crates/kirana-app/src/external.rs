//! # External Collaborator Contracts
//!
//! Narrow interfaces to everything the core consumes but does not implement:
//! the authentication provider, the cloud profile store, and the receipt
//! renderer.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Collaborator Boundaries                          │
//! │                                                                     │
//! │  AuthProvider    → stable user id for the signed-in user; absence  │
//! │                    means "no operations permitted" (fail closed)   │
//! │  ProfileStore    → get/put of display metadata only; NEVER used    │
//! │                    for inventory or bill records                   │
//! │  ReceiptRenderer → (Bill, [BillItem]) → bytes; layout is its own   │
//! │                    business                                        │
//! │                                                                     │
//! │  The barcode recognizer has no trait: its whole contract is the    │
//! │  decoded string, which the scan entry point accepts directly.      │
//! │                                                                     │
//! │  A collaborator failure becomes a user-visible message; the local  │
//! │  catalog and bill data are never corrupted by one.                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use kirana_core::{Bill, BillItem, UserProfile};

// =============================================================================
// Authentication
// =============================================================================

/// Supplies the stable user id of the signed-in user.
pub trait AuthProvider: Send + Sync {
    /// The signed-in user's id, or `None` when nobody is signed in.
    fn current_user_id(&self) -> Option<String>;
}

/// A fixed auth provider for tests and headless tooling.
#[derive(Debug, Clone)]
pub struct FixedAuth {
    user_id: Option<String>,
}

impl FixedAuth {
    /// A provider with `user_id` signed in.
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        FixedAuth {
            user_id: Some(user_id.into()),
        }
    }

    /// A provider with nobody signed in.
    pub fn signed_out() -> Self {
        FixedAuth { user_id: None }
    }
}

impl AuthProvider for FixedAuth {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}

// =============================================================================
// Cloud Profile Store
// =============================================================================

/// Failure talking to the profile store.
#[derive(Debug, Error)]
#[error("profile store unavailable: {0}")]
pub struct ProfileStoreError(pub String);

/// Cloud document store for user profiles.
///
/// `get` returning `Ok(None)` means "no document yet" - an expected outcome,
/// distinct from the store being unreachable.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, ProfileStoreError>;
    async fn put(&self, profile: &UserProfile) -> Result<(), ProfileStoreError>;
}

/// In-memory profile store for tests and offline runs.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<String, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, ProfileStoreError> {
        let profiles = self
            .profiles
            .lock()
            .map_err(|_| ProfileStoreError("store lock poisoned".to_string()))?;
        Ok(profiles.get(user_id).cloned())
    }

    async fn put(&self, profile: &UserProfile) -> Result<(), ProfileStoreError> {
        let mut profiles = self
            .profiles
            .lock()
            .map_err(|_| ProfileStoreError("store lock poisoned".to_string()))?;
        profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}

// =============================================================================
// Receipt Renderer
// =============================================================================

/// Failure rendering a receipt.
#[derive(Debug, Error)]
#[error("receipt rendering failed: {0}")]
pub struct RenderError(pub String);

/// Renders a bill and its items into a shareable document.
///
/// The core does not depend on the output layout; it only hands the bytes
/// onward.
pub trait ReceiptRenderer: Send + Sync {
    fn render(&self, bill: &Bill, items: &[BillItem]) -> Result<Vec<u8>, RenderError>;
}

// =============================================================================
// Unit Tests
// =============================================================================
