//! # Inventory Service
//!
//! CRUD and stock-level operations over the product catalog, always scoped
//! to the acting user.
//!
//! ## Operation Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Inventory Service                              │
//! │                                                                     │
//! │  reads                          writes (validate → repo → emit)     │
//! │  ─────                          ────────────────────────────────    │
//! │  list / search                  create (upsert semantics)           │
//! │  get / lookup_scanned           update_quantity / update_price      │
//! │  count / total_inventory_value  adjust_stock (guarded)              │
//! │  low_stock                      delete                              │
//! │  watch_products (live)          import_catalog                      │
//! │  export_catalog                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All operations are local, single-row or small-batch; there are no
//! retries because there is no transient failure mode - an operation
//! either validates and lands, or reports "not found" / "rejected".

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use kirana_core::validation::{
    validate_price_cents, validate_product_id, validate_product_name, validate_search_query,
    validate_stock_quantity,
};
use kirana_core::{Money, Product};
use kirana_db::repository::product::generate_product_id;
use kirana_db::Database;

use crate::error::{AppError, AppResult};
use crate::export::{CatalogExport, ImportSummary};
use crate::live::{EventBus, LiveQuery, StoreEvent};

/// Result of looking up a scanned barcode string.
///
/// The barcode recognizer's decoded string is treated as a candidate
/// product id: either it matches a catalog row or it is unknown (and the
/// caller may offer to create the product).
#[derive(Debug, Clone, PartialEq)]
pub enum ScanLookup {
    Matched(Product),
    Unknown { code: String },
}

/// Service for catalog operations, scoped per acting user.
#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
    events: EventBus,
}

impl InventoryService {
    /// Creates the service over an injected database handle and event bus.
    pub fn new(db: Database, events: EventBus) -> Self {
        InventoryService { db, events }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All of the user's products, alphabetical by name.
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<Product>> {
        Ok(self.db.products().list_for_user(user_id).await?)
    }

    /// Case-insensitive substring search on product name.
    pub async fn search(&self, user_id: &str, query: &str) -> AppResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        Ok(self.db.products().search_for_user(user_id, &query).await?)
    }

    /// One product, or `None`. Never another user's row, even for an
    /// identical id.
    pub async fn get(&self, product_id: &str, user_id: &str) -> AppResult<Option<Product>> {
        Ok(self.db.products().get(product_id, user_id).await?)
    }

    /// Looks up a scanned code as a candidate product id.
    pub async fn lookup_scanned(&self, user_id: &str, code: &str) -> AppResult<ScanLookup> {
        let code = code.trim();
        validate_product_id(code)?;

        match self.db.products().get(code, user_id).await? {
            Some(product) => Ok(ScanLookup::Matched(product)),
            None => Ok(ScanLookup::Unknown {
                code: code.to_string(),
            }),
        }
    }

    /// Number of products in the user's catalog.
    pub async fn count(&self, user_id: &str) -> AppResult<i64> {
        Ok(self.db.products().count(user_id).await?)
    }

    /// Σ(price × quantity) over the user's catalog.
    pub async fn total_inventory_value(&self, user_id: &str) -> AppResult<Money> {
        let cents = self.db.products().total_inventory_value(user_id).await?;
        Ok(Money::from_cents(cents))
    }

    /// Products at or below the low-stock threshold.
    pub async fn low_stock(&self, user_id: &str, threshold: i64) -> AppResult<Vec<Product>> {
        Ok(self.db.products().low_stock(user_id, threshold).await?)
    }

    /// A live, push-updated snapshot of the user's product list.
    pub async fn watch_products(&self, user_id: &str) -> AppResult<LiveQuery<Vec<Product>>> {
        let db = self.db.clone();
        let user_id = user_id.to_string();

        LiveQuery::spawn(
            &self.events,
            StoreEvent::ProductsChanged,
            Arc::new(move || {
                let db = db.clone();
                let user_id = user_id.clone();
                Box::pin(async move {
                    db.products()
                        .list_for_user(&user_id)
                        .await
                        .map_err(AppError::from)
                })
            }),
        )
        .await
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates a product.
    ///
    /// The id may be supplied (manual entry, scanned barcode) or left blank
    /// to be generated. Creating an id that already exists for this user
    /// replaces the row - upsert semantics, not a failure.
    ///
    /// Rejected before any write when the price is not positive, the
    /// quantity is negative, or the name is empty.
    pub async fn create(
        &self,
        user_id: &str,
        product_id: Option<&str>,
        name: &str,
        price_cents: i64,
        quantity: i64,
    ) -> AppResult<Product> {
        validate_product_name(name)?;
        validate_price_cents(price_cents)?;
        validate_stock_quantity(quantity)?;

        let product_id = match product_id.map(str::trim) {
            Some(id) if !id.is_empty() => {
                validate_product_id(id)?;
                id.to_string()
            }
            _ => generate_product_id(),
        };

        let now = Utc::now();
        let product = Product {
            product_id,
            user_id: user_id.to_string(),
            name: name.trim().to_string(),
            price_cents,
            quantity,
            created_at: now,
            updated_at: now,
        };

        self.db.products().upsert(&product).await?;
        self.events.emit(StoreEvent::ProductsChanged);

        info!(product_id = %product.product_id, user_id = %user_id, "Product created");
        Ok(product)
    }

    /// Sets a product's stock quantity.
    pub async fn update_quantity(
        &self,
        product_id: &str,
        user_id: &str,
        new_quantity: i64,
    ) -> AppResult<()> {
        validate_stock_quantity(new_quantity)?;

        self.db
            .products()
            .update_quantity(product_id, user_id, new_quantity)
            .await?;
        self.events.emit(StoreEvent::ProductsChanged);

        Ok(())
    }

    /// Sets a product's unit price.
    pub async fn update_price(
        &self,
        product_id: &str,
        user_id: &str,
        new_price_cents: i64,
    ) -> AppResult<()> {
        validate_price_cents(new_price_cents)?;

        self.db
            .products()
            .update_price(product_id, user_id, new_price_cents)
            .await?;
        self.events.emit(StoreEvent::ProductsChanged);

        Ok(())
    }

    /// Adds or removes stock.
    ///
    /// Returns `false` - with nothing written - when the removal would take
    /// the quantity below zero or the product is missing.
    pub async fn adjust_stock(
        &self,
        product_id: &str,
        user_id: &str,
        delta: i64,
    ) -> AppResult<bool> {
        let applied = self
            .db
            .products()
            .adjust_stock(product_id, user_id, delta)
            .await?;

        if applied {
            self.events.emit(StoreEvent::ProductsChanged);
        } else {
            debug!(product_id = %product_id, delta = %delta, "Stock adjustment rejected");
        }

        Ok(applied)
    }

    /// Hard-deletes a product.
    pub async fn delete(&self, product_id: &str, user_id: &str) -> AppResult<()> {
        self.db.products().delete(product_id, user_id).await?;
        self.events.emit(StoreEvent::ProductsChanged);

        Ok(())
    }

    // =========================================================================
    // Catalog backup / restore
    // =========================================================================

    /// Exports the user's full catalog to the backup format.
    pub async fn export_catalog(&self, user_id: &str) -> AppResult<CatalogExport> {
        let products = self.db.products().list_for_user(user_id).await?;
        Ok(CatalogExport::from_products(user_id, &products, Utc::now()))
    }

    /// Imports a catalog backup for the user.
    ///
    /// Products whose id already exists for this user are skipped, not
    /// overwritten; the rest are inserted with `updated_at` reset to the
    /// import time. Importing the same file twice is a no-op the second
    /// time. Every row is validated before anything is written.
    pub async fn import_catalog(
        &self,
        user_id: &str,
        export: &CatalogExport,
    ) -> AppResult<ImportSummary> {
        let imported_at = Utc::now();

        let mut products = Vec::with_capacity(export.products.len());
        for entry in &export.products {
            validate_product_id(&entry.product_id)?;
            validate_product_name(&entry.name)?;
            validate_price_cents(entry.price)?;
            validate_stock_quantity(entry.quantity)?;
            products.push(entry.to_product(user_id, imported_at));
        }

        let (imported, skipped) = self
            .db
            .products()
            .insert_if_absent_batch(user_id, &products)
            .await?;

        if imported > 0 {
            self.events.emit(StoreEvent::ProductsChanged);
        }

        info!(user_id = %user_id, imported, skipped, "Catalog import complete");
        Ok(ImportSummary { imported, skipped })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
