//! # Product List State
//!
//! Observable state for the inventory screen: the live product list
//! re-filtered by a free-text search term, inventory stats, and a
//! loading/error pair updated by fire-and-forget mutations.
//!
//! ## Reactive Filtering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │   live product list ──┐                                             │
//! │                       ├──► visible_products()                       │
//! │   search term ────────┘    (name or id substring, case-insensitive) │
//! │                                                                     │
//! │   Mutations are dispatched as tasks; completion updates stats and  │
//! │   the error message instead of returning a value. The returned     │
//! │   JoinHandle is the completion callback for callers that care.     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use kirana_core::{Money, Product};

use crate::error::AppResult;
use crate::live::{LiveQuery, Subscription};
use crate::services::inventory::InventoryService;

/// Headline numbers for the inventory screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InventoryStats {
    pub product_count: i64,
    pub inventory_value_cents: i64,
}

impl InventoryStats {
    /// Total inventory value as Money.
    pub fn inventory_value(&self) -> Money {
        Money::from_cents(self.inventory_value_cents)
    }
}

struct Inner {
    service: InventoryService,
    user_id: String,
    products: LiveQuery<Vec<Product>>,
    search: watch::Sender<String>,
    loading: watch::Sender<bool>,
    error: watch::Sender<Option<String>>,
    stats: watch::Sender<InventoryStats>,
}

/// Observable product-list state for one signed-in user.
#[derive(Clone)]
pub struct ProductListState {
    inner: Arc<Inner>,
}

impl ProductListState {
    /// Builds the state for a signed-in user: subscribes the live list and
    /// loads the initial stats.
    pub async fn for_user(
        service: InventoryService,
        user_id: impl Into<String>,
    ) -> AppResult<Self> {
        let user_id = user_id.into();
        let products = service.watch_products(&user_id).await?;

        let initial_stats = InventoryStats {
            product_count: service.count(&user_id).await?,
            inventory_value_cents: service.total_inventory_value(&user_id).await?.cents(),
        };

        let (search, _) = watch::channel(String::new());
        let (loading, _) = watch::channel(false);
        let (error, _) = watch::channel(None);
        let (stats, _) = watch::channel(initial_stats);

        Ok(ProductListState {
            inner: Arc::new(Inner {
                service,
                user_id,
                products,
                search,
                loading,
                error,
                stats,
            }),
        })
    }

    // =========================================================================
    // Observables
    // =========================================================================

    /// Updates the free-text search term; `visible_products` re-filters
    /// immediately.
    pub fn set_search_query(&self, query: impl Into<String>) {
        self.inner.search.send_replace(query.into());
    }

    /// The current search term.
    pub fn search_query(&self) -> String {
        self.inner.search.borrow().clone()
    }

    /// The current list snapshot filtered by the search term: a product is
    /// visible when its name or id contains the term, case-insensitively.
    pub fn visible_products(&self) -> Vec<Product> {
        let query = self.inner.search.borrow().trim().to_lowercase();
        let all = self.inner.products.snapshot();

        if query.is_empty() {
            return all;
        }

        all.into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&query)
                    || p.product_id.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// A subscription onto the unfiltered live list.
    pub fn subscribe_products(&self) -> Subscription<Vec<Product>> {
        self.inner.products.subscribe()
    }

    /// Latest inventory stats.
    pub fn stats(&self) -> InventoryStats {
        *self.inner.stats.borrow()
    }

    /// A receiver onto the stats observable.
    pub fn subscribe_stats(&self) -> watch::Receiver<InventoryStats> {
        self.inner.stats.subscribe()
    }

    /// The current error message, if any.
    pub fn error_message(&self) -> Option<String> {
        self.inner.error.borrow().clone()
    }

    /// Clears the error message.
    pub fn clear_error(&self) {
        self.inner.error.send_replace(None);
    }

    /// Whether a mutation is in flight.
    pub fn is_loading(&self) -> bool {
        *self.inner.loading.borrow()
    }

    // =========================================================================
    // Fire-and-forget mutations
    // =========================================================================

    /// Adds a product (generated id unless `custom_id` is given).
    pub fn add_product(
        &self,
        name: String,
        price_cents: i64,
        quantity: i64,
        custom_id: Option<String>,
    ) -> JoinHandle<()> {
        self.dispatch(move |inner| async move {
            inner
                .service
                .create(
                    &inner.user_id,
                    custom_id.as_deref(),
                    &name,
                    price_cents,
                    quantity,
                )
                .await
                .map(|_| ())
        })
    }

    /// Sets a product's stock quantity.
    pub fn update_quantity(&self, product_id: String, new_quantity: i64) -> JoinHandle<()> {
        self.dispatch(move |inner| async move {
            inner
                .service
                .update_quantity(&product_id, &inner.user_id, new_quantity)
                .await
        })
    }

    /// Sets a product's unit price.
    pub fn update_price(&self, product_id: String, new_price_cents: i64) -> JoinHandle<()> {
        self.dispatch(move |inner| async move {
            inner
                .service
                .update_price(&product_id, &inner.user_id, new_price_cents)
                .await
        })
    }

    /// Adds or removes stock; an underflowing removal surfaces as an error
    /// message with nothing written.
    pub fn adjust_stock(&self, product_id: String, delta: i64) -> JoinHandle<()> {
        self.dispatch(move |inner| async move {
            let applied = inner
                .service
                .adjust_stock(&product_id, &inner.user_id, delta)
                .await?;
            if !applied {
                return Err(kirana_core::CoreError::InsufficientStock {
                    name: product_id.clone(),
                    available: 0,
                    requested: -delta,
                }
                .into());
            }
            Ok(())
        })
    }

    /// Deletes a product.
    pub fn delete_product(&self, product_id: String) -> JoinHandle<()> {
        self.dispatch(move |inner| async move {
            inner.service.delete(&product_id, &inner.user_id).await
        })
    }

    /// Runs one unit of work, then updates loading/error/stats. The caller
    /// may await the handle as a completion callback, or drop it for pure
    /// fire-and-forget.
    fn dispatch<F, Fut>(&self, work: F) -> JoinHandle<()>
    where
        F: FnOnce(Arc<Inner>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = AppResult<()>> + Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            inner.loading.send_replace(true);

            match work(inner.clone()).await {
                Ok(()) => {
                    inner.error.send_replace(None);
                    refresh_stats(&inner).await;
                }
                Err(err) => {
                    inner.error.send_replace(Some(err.user_message()));
                }
            }

            inner.loading.send_replace(false);
        })
    }
}

async fn refresh_stats(inner: &Inner) {
    let count = inner.service.count(&inner.user_id).await;
    let value = inner.service.total_inventory_value(&inner.user_id).await;

    match (count, value) {
        (Ok(product_count), Ok(value)) => {
            inner.stats.send_replace(InventoryStats {
                product_count,
                inventory_value_cents: value.cents(),
            });
        }
        (Err(err), _) | (_, Err(err)) => {
            inner.error.send_replace(Some(err.user_message()));
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
