//! # Composition Root
//!
//! Explicitly constructs the store handle and wires it into the services -
//! there is no global singleton anywhere; whoever builds the [`App`] owns
//! its lifecycle.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Application Startup                           │
//! │                                                                     │
//! │  1. init_logging()            tracing-subscriber + env filter      │
//! │  2. AppConfig::load_or_default()                                    │
//! │  3. App::new(config, auth, profile_store)                          │
//! │       ├── Database::new (WAL, migrations)                          │
//! │       ├── EventBus                                                 │
//! │       └── Inventory / Billing / Profile services                   │
//! │  4. per signed-in user: product_list() / bill_history() /          │
//! │     checkout() state objects                                       │
//! │                                                                     │
//! │  No signed-in user ⇒ every state constructor fails closed with     │
//! │  Unauthenticated; the UI routes to sign-in instead of retrying.    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::info;

use kirana_core::UserProfile;
use kirana_db::{Database, DbConfig};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::external::{AuthProvider, ProfileStore, ReceiptRenderer};
use crate::live::EventBus;
use crate::services::billing::BillingService;
use crate::services::inventory::InventoryService;
use crate::services::profile::ProfileService;
use crate::state::bills::BillHistoryState;
use crate::state::checkout::CheckoutState;
use crate::state::products::ProductListState;

/// The assembled application: store handle, services, and collaborator
/// seams, built once at startup.
#[derive(Clone)]
pub struct App {
    db: Database,
    config: AppConfig,
    inventory: InventoryService,
    billing: BillingService,
    profiles: ProfileService,
    auth: Arc<dyn AuthProvider>,
}

impl App {
    /// Builds the application from configuration and collaborators.
    pub async fn new(
        config: AppConfig,
        auth: Arc<dyn AuthProvider>,
        profile_store: Arc<dyn ProfileStore>,
    ) -> AppResult<Self> {
        let db_config = if config.database_path.as_os_str() == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&config.database_path)
        };

        let db = Database::new(db_config).await.map_err(AppError::from)?;
        let events = EventBus::new();

        let inventory = InventoryService::new(db.clone(), events.clone());
        let billing = BillingService::new(db.clone(), events);
        let profiles = ProfileService::new(profile_store);

        info!(db = %config.database_path.display(), "Application assembled");

        Ok(App {
            db,
            config,
            inventory,
            billing,
            profiles,
            auth,
        })
    }

    /// The resolved configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The inventory service.
    pub fn inventory(&self) -> &InventoryService {
        &self.inventory
    }

    /// The billing service.
    pub fn billing(&self) -> &BillingService {
        &self.billing
    }

    /// The profile service.
    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    /// The signed-in user's id; fails closed when nobody is signed in.
    pub fn current_user(&self) -> AppResult<String> {
        self.auth.current_user_id().ok_or(AppError::Unauthenticated)
    }

    /// Observable product-list state for the signed-in user.
    pub async fn product_list(&self) -> AppResult<ProductListState> {
        let user_id = self.current_user()?;
        ProductListState::for_user(self.inventory.clone(), user_id).await
    }

    /// Observable bill-history state for the signed-in user.
    pub async fn bill_history(&self) -> AppResult<BillHistoryState> {
        let user_id = self.current_user()?;
        BillHistoryState::for_user(self.billing.clone(), &user_id).await
    }

    /// Checkout state (empty cart) for the signed-in user.
    pub fn checkout(&self, renderer: Option<Arc<dyn ReceiptRenderer>>) -> AppResult<CheckoutState> {
        let user_id = self.current_user()?;
        Ok(CheckoutState::new(
            self.billing.clone(),
            self.inventory.clone(),
            user_id,
            renderer,
        ))
    }

    /// The signed-in user's profile (default on store failure).
    pub async fn profile(&self) -> AppResult<UserProfile> {
        let user_id = self.current_user()?;
        Ok(self.profiles.load(&user_id).await)
    }

    /// The signed-in user's products at or below the configured low-stock
    /// threshold.
    pub async fn low_stock(&self) -> AppResult<Vec<kirana_core::Product>> {
        let user_id = self.current_user()?;
        self.inventory
            .low_stock(&user_id, self.config.low_stock_threshold)
            .await
    }

    /// The signed-in user's most recent bills, capped by the configured
    /// limit.
    pub async fn recent_bills(&self) -> AppResult<Vec<kirana_core::Bill>> {
        let user_id = self.current_user()?;
        self.billing
            .recent_bills(&user_id, self.config.recent_bills_limit)
            .await
    }

    /// Closes the store handle. Every operation fails afterwards.
    pub async fn close(&self) {
        self.db.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{FixedAuth, InMemoryProfileStore};
    use std::path::PathBuf;

    fn memory_config() -> AppConfig {
        AppConfig {
            database_path: PathBuf::from(":memory:"),
            ..AppConfig::default()
        }
    }

    async fn app_with(auth: FixedAuth) -> App {
        App::new(
            memory_config(),
            Arc::new(auth),
            Arc::new(InMemoryProfileStore::new()),
        )
        .await
        .unwrap()
    }

    /// Without a signed-in user every entry point fails closed.
    #[tokio::test]
    async fn test_signed_out_fails_closed() {
        let app = app_with(FixedAuth::signed_out()).await;

        assert!(matches!(
            app.current_user(),
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            app.product_list().await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            app.bill_history().await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            app.checkout(None),
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            app.profile().await,
            Err(AppError::Unauthenticated)
        ));
    }

    /// End-to-end: create a product, sell it at checkout, see the bill in
    /// history and the stock deducted.
    #[tokio::test]
    async fn test_signed_in_end_to_end() {
        let app = app_with(FixedAuth::signed_in("u-1")).await;
        let user = app.current_user().unwrap();

        app.inventory()
            .create(&user, Some("8901030865278"), "Soap", 3500, 5)
            .await
            .unwrap();

        let checkout = app.checkout(None).unwrap();
        checkout.scan("8901030865278").await.unwrap();
        checkout
            .submit("Asha".to_string(), String::new())
            .await
            .unwrap();
        let outcome = checkout.last_outcome().expect("checkout should succeed");

        let bill = app
            .billing()
            .get_bill(&outcome.bill_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bill.total_cents, 3500);

        let soap = app
            .inventory()
            .get("8901030865278", &user)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(soap.quantity, 4);
    }
}
