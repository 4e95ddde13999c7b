//! # Billing Service
//!
//! Turns cart selections into a persisted bill with frozen line items, and
//! drives the follow-up inventory deduction.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       generate_bill                                 │
//! │                                                                     │
//! │  1. validate customer fields, drop zero-quantity selections        │
//! │  2. resolve (name, unit price) from the supplied catalog SNAPSHOT  │
//! │     - never a live re-read: prices are frozen at sale time         │
//! │     - a lookup miss degrades to a zero-price "Unknown" line        │
//! │  3. integer totals: total = Σ line totals, items = Σ quantities    │
//! │  4. ONE TRANSACTION: bill row + every item row                     │
//! │  5. after commit: per catalog-backed selection, decrement stock    │
//! │     clamped at zero; missing products skipped; never rolled back   │
//! │  6. return the bill id (for receipt rendering downstream)          │
//! │                                                                     │
//! │  Step 5 is deliberately OUTSIDE the bill transaction: a crash      │
//! │  between 4 and 5 leaves stock overstated, never a partial bill.    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use kirana_core::validation::{
    validate_customer_name, validate_line_quantity, validate_mobile_number,
};
use kirana_core::{Bill, BillItem, BillStatus, Money, ValidationError};
use kirana_db::Database;

use crate::error::{AppError, AppResult};
use crate::live::{EventBus, LiveQuery, StoreEvent};

/// Fallback name for a selection whose product id is missing from the
/// catalog snapshot.
const UNKNOWN_PRODUCT_NAME: &str = "Unknown";

// =============================================================================
// Checkout Inputs / Outputs
// =============================================================================

/// One cart selection handed to `generate_bill`.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub product_id: String,
    pub quantity: i64,
    /// Ad-hoc manual line: its id is synthetic and it never participates in
    /// inventory deduction.
    pub manual: bool,
}

/// A frozen (name, unit price) entry in the catalog snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    pub unit_price_cents: i64,
}

/// The last-read product data used to resolve names and prices at
/// bill-generation time, keyed by product id.
pub type CatalogSnapshot = HashMap<String, CatalogEntry>;

/// What `generate_bill` reports back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct BillOutcome {
    pub bill_id: String,
    pub total_cents: i64,
    pub total_items: i64,
    /// Selections that missed the catalog snapshot and degraded to a
    /// zero-price "Unknown" line. Zero on a clean checkout.
    pub degraded_lines: u32,
}

// =============================================================================
// Billing Service
// =============================================================================

/// Service for bill creation, deletion, and history queries.
#[derive(Debug, Clone)]
pub struct BillingService {
    db: Database,
    events: EventBus,
}

impl BillingService {
    /// Creates the service over an injected database handle and event bus.
    pub fn new(db: Database, events: EventBus) -> Self {
        BillingService { db, events }
    }

    /// Assembles and persists a bill from cart selections.
    ///
    /// See the module docs for the full flow. The bill and all of its items
    /// land in one transaction; the inventory deduction is a best-effort
    /// follow-up per catalog-backed selection.
    pub async fn generate_bill(
        &self,
        user_id: &str,
        customer_name: &str,
        customer_phone: &str,
        selections: &[Selection],
        catalog: &CatalogSnapshot,
    ) -> AppResult<BillOutcome> {
        validate_customer_name(customer_name)?;
        let customer_phone = customer_phone.trim();
        if !customer_phone.is_empty() {
            validate_mobile_number(customer_phone)?;
        }

        // Zero-quantity selections never become bill items.
        let lines: Vec<&Selection> = selections.iter().filter(|s| s.quantity != 0).collect();
        if lines.is_empty() {
            return Err(ValidationError::Required {
                field: "selections".to_string(),
            }
            .into());
        }
        for line in &lines {
            validate_line_quantity(line.quantity)?;
        }

        let bill_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let mut degraded_lines = 0u32;

        let items: Vec<BillItem> = lines
            .iter()
            .map(|selection| {
                let (name, unit_price_cents) = match catalog.get(&selection.product_id) {
                    Some(entry) => (entry.name.clone(), entry.unit_price_cents),
                    None => {
                        // Stale cart data: degrade this one line rather than
                        // losing the whole sale.
                        degraded_lines += 1;
                        warn!(
                            product_id = %selection.product_id,
                            "Selection missing from catalog snapshot, degrading to zero-price line"
                        );
                        (UNKNOWN_PRODUCT_NAME.to_string(), 0)
                    }
                };

                BillItem {
                    bill_item_id: Uuid::new_v4().to_string(),
                    bill_id: bill_id.clone(),
                    product_id: selection.product_id.clone(),
                    product_name: name,
                    unit_price_cents,
                    quantity: selection.quantity,
                    total_cents: Money::from_cents(unit_price_cents)
                        .multiply_quantity(selection.quantity)
                        .cents(),
                }
            })
            .collect();

        let total_cents: i64 = items.iter().map(|i| i.total_cents).sum();
        let total_items: i64 = items.iter().map(|i| i.quantity).sum();

        let bill = Bill {
            bill_id: bill_id.clone(),
            user_id: user_id.to_string(),
            customer_name: customer_name.trim().to_string(),
            customer_phone: customer_phone.to_string(),
            total_cents,
            total_items,
            status: BillStatus::Completed,
            created_at: now,
        };

        self.db.bills().insert_bill_with_items(&bill, &items).await?;
        self.events.emit(StoreEvent::BillsChanged);

        // Post-commit deduction: best-effort, clamped at zero, skipping
        // products that no longer exist. A failure here never rolls the
        // bill back.
        for selection in lines.iter().filter(|s| !s.manual) {
            match self
                .db
                .products()
                .deduct_stock_clamped(&selection.product_id, user_id, selection.quantity)
                .await
            {
                Ok(0) => debug!(
                    product_id = %selection.product_id,
                    "Product gone from catalog, deduction skipped"
                ),
                Ok(_) => {}
                Err(err) => warn!(
                    product_id = %selection.product_id,
                    error = %err,
                    "Inventory deduction failed after bill commit"
                ),
            }
        }
        self.events.emit(StoreEvent::ProductsChanged);

        info!(
            bill_id = %bill_id,
            total = %Money::from_cents(total_cents),
            items = items.len(),
            degraded_lines,
            "Bill generated"
        );

        Ok(BillOutcome {
            bill_id,
            total_cents,
            total_items,
            degraded_lines,
        })
    }

    /// Deletes a bill and its items as one atomic unit.
    pub async fn delete_bill(&self, bill_id: &str) -> AppResult<()> {
        self.db.bills().delete_bill_with_items(bill_id).await?;
        self.events.emit(StoreEvent::BillsChanged);
        Ok(())
    }

    /// Voids a completed bill, keeping it and its items for history.
    pub async fn void_bill(&self, bill_id: &str) -> AppResult<()> {
        self.db.bills().void_bill(bill_id).await?;
        self.events.emit(StoreEvent::BillsChanged);
        Ok(())
    }

    /// One bill, or `None`.
    pub async fn get_bill(&self, bill_id: &str) -> AppResult<Option<Bill>> {
        Ok(self.db.bills().get_by_id(bill_id).await?)
    }

    /// All items of a bill.
    pub async fn get_bill_items(&self, bill_id: &str) -> AppResult<Vec<BillItem>> {
        Ok(self.db.bills().get_items(bill_id).await?)
    }

    /// The user's bills, newest first.
    pub async fn list_bills(&self, user_id: &str) -> AppResult<Vec<Bill>> {
        Ok(self.db.bills().list_for_user(user_id).await?)
    }

    /// The user's most recent bills, newest first.
    pub async fn recent_bills(&self, user_id: &str, limit: u32) -> AppResult<Vec<Bill>> {
        Ok(self.db.bills().recent_for_user(user_id, limit).await?)
    }

    /// Number of bills for the user.
    pub async fn bill_count(&self, user_id: &str) -> AppResult<i64> {
        Ok(self.db.bills().count(user_id).await?)
    }

    /// Σ total over the user's bills (voided excluded).
    pub async fn total_sales(&self, user_id: &str) -> AppResult<Money> {
        let cents = self.db.bills().total_sales(user_id).await?;
        Ok(Money::from_cents(cents))
    }

    /// A live, push-updated snapshot of the user's bill history (newest
    /// first).
    pub async fn watch_bills(&self, user_id: &str) -> AppResult<LiveQuery<Vec<Bill>>> {
        let db = self.db.clone();
        let user_id = user_id.to_string();

        LiveQuery::spawn(
            &self.events,
            StoreEvent::BillsChanged,
            std::sync::Arc::new(move || {
                let db = db.clone();
                let user_id = user_id.clone();
                Box::pin(async move {
                    db.bills()
                        .list_for_user(&user_id)
                        .await
                        .map_err(AppError::from)
                })
            }),
        )
        .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::inventory::InventoryService;
    use kirana_db::DbConfig;

    async fn services() -> (InventoryService, BillingService) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let events = EventBus::new();
        (
            InventoryService::new(db.clone(), events.clone()),
            BillingService::new(db, events),
        )
    }

    fn selection(product_id: &str, quantity: i64) -> Selection {
        Selection {
            product_id: product_id.to_string(),
            quantity,
            manual: false,
        }
    }

    fn snapshot_of(entries: &[(&str, &str, i64)]) -> CatalogSnapshot {
        entries
            .iter()
            .map(|(id, name, price)| {
                (
                    id.to_string(),
                    CatalogEntry {
                        name: name.to_string(),
                        unit_price_cents: *price,
                    },
                )
            })
            .collect()
    }

    /// Scenario: selling 2 × Sugar at ₹45.00 produces a ₹90.00 bill with one
    /// frozen line item, and Sugar's stock drops by 2.
    #[tokio::test]
    async fn test_generate_bill_totals_and_deduction() {
        let (inventory, billing) = services().await;
        inventory
            .create("u-1", Some("sugar"), "Sugar", 4500, 10)
            .await
            .unwrap();

        let outcome = billing
            .generate_bill(
                "u-1",
                "Asha",
                "9876543210",
                &[selection("sugar", 2)],
                &snapshot_of(&[("sugar", "Sugar", 4500)]),
            )
            .await
            .unwrap();

        assert_eq!(outcome.total_cents, 9000);
        assert_eq!(outcome.total_items, 2);
        assert_eq!(outcome.degraded_lines, 0);

        let bill = billing.get_bill(&outcome.bill_id).await.unwrap().unwrap();
        assert_eq!(bill.total_cents, 9000);
        assert_eq!(bill.status, BillStatus::Completed);

        let items = billing.get_bill_items(&outcome.bill_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price_cents, 4500);
        assert_eq!(items[0].total_cents, 9000);

        // Bill total equals the sum of its items' totals, exactly
        let item_sum: i64 = items.iter().map(|i| i.total_cents).sum();
        assert_eq!(item_sum, bill.total_cents);
        let qty_sum: i64 = items.iter().map(|i| i.quantity).sum();
        assert_eq!(qty_sum, bill.total_items);

        // Inventory deducted
        let sugar = inventory.get("sugar", "u-1").await.unwrap().unwrap();
        assert_eq!(sugar.quantity, 8);
    }

    /// The snapshot freezes prices: a later catalog price change never
    /// alters a historical bill.
    #[tokio::test]
    async fn test_bill_items_are_frozen_snapshots() {
        let (inventory, billing) = services().await;
        inventory
            .create("u-1", Some("sugar"), "Sugar", 4500, 10)
            .await
            .unwrap();

        let outcome = billing
            .generate_bill(
                "u-1",
                "Asha",
                "",
                &[selection("sugar", 1)],
                &snapshot_of(&[("sugar", "Sugar", 4500)]),
            )
            .await
            .unwrap();

        inventory.update_price("sugar", "u-1", 9900).await.unwrap();

        let items = billing.get_bill_items(&outcome.bill_id).await.unwrap();
        assert_eq!(items[0].unit_price_cents, 4500);
        assert_eq!(items[0].product_name, "Sugar");
    }

    /// Deduction clamps at zero instead of erroring the bill.
    #[tokio::test]
    async fn test_deduction_clamps_at_zero() {
        let (inventory, billing) = services().await;
        inventory
            .create("u-1", Some("sugar"), "Sugar", 4500, 2)
            .await
            .unwrap();

        let outcome = billing
            .generate_bill(
                "u-1",
                "Asha",
                "",
                &[selection("sugar", 5)],
                &snapshot_of(&[("sugar", "Sugar", 4500)]),
            )
            .await
            .unwrap();

        // The bill keeps the full sale...
        assert_eq!(outcome.total_cents, 4500 * 5);
        // ...and stock clamps at zero rather than going negative
        let sugar = inventory.get("sugar", "u-1").await.unwrap().unwrap();
        assert_eq!(sugar.quantity, 0);
    }

    /// A selection missing from the snapshot degrades to one zero-price
    /// "Unknown" line; the bill still commits.
    #[tokio::test]
    async fn test_catalog_miss_degrades_line() {
        let (_inventory, billing) = services().await;

        let outcome = billing
            .generate_bill(
                "u-1",
                "Asha",
                "",
                &[selection("ghost", 3)],
                &CatalogSnapshot::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.degraded_lines, 1);
        assert_eq!(outcome.total_cents, 0);
        assert_eq!(outcome.total_items, 3);

        let items = billing.get_bill_items(&outcome.bill_id).await.unwrap();
        assert_eq!(items[0].product_name, "Unknown");
        assert_eq!(items[0].unit_price_cents, 0);
    }

    /// A vanished product is skipped by the deduction without failing the
    /// bill.
    #[tokio::test]
    async fn test_deduction_skips_missing_product() {
        let (_inventory, billing) = services().await;

        // Catalog snapshot still knows the product, but the row is gone.
        let outcome = billing
            .generate_bill(
                "u-1",
                "Asha",
                "",
                &[selection("gone", 1)],
                &snapshot_of(&[("gone", "Was here", 1000)]),
            )
            .await
            .unwrap();

        assert_eq!(outcome.total_cents, 1000);
        assert!(billing.get_bill(&outcome.bill_id).await.unwrap().is_some());
    }

    /// Manual ad-hoc lines never touch inventory.
    #[tokio::test]
    async fn test_manual_lines_skip_deduction() {
        let (inventory, billing) = services().await;
        // A real product that happens to share the synthetic id would still
        // be safe: the manual flag short-circuits the deduction.
        inventory
            .create("u-1", Some("manual-1"), "Coincidence", 1000, 5)
            .await
            .unwrap();

        billing
            .generate_bill(
                "u-1",
                "Asha",
                "",
                &[Selection {
                    product_id: "manual-1".to_string(),
                    quantity: 2,
                    manual: true,
                }],
                &snapshot_of(&[("manual-1", "Loose jaggery", 1500)]),
            )
            .await
            .unwrap();

        let p = inventory.get("manual-1", "u-1").await.unwrap().unwrap();
        assert_eq!(p.quantity, 5);
    }

    #[tokio::test]
    async fn test_zero_quantity_selections_are_dropped() {
        let (_inventory, billing) = services().await;

        let outcome = billing
            .generate_bill(
                "u-1",
                "Asha",
                "",
                &[selection("sugar", 0), selection("salt", 1)],
                &snapshot_of(&[("sugar", "Sugar", 4500), ("salt", "Salt", 2000)]),
            )
            .await
            .unwrap();

        let items = billing.get_bill_items(&outcome.bill_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, "salt");
    }

    #[tokio::test]
    async fn test_empty_cart_and_bad_inputs_rejected() {
        let (_inventory, billing) = services().await;
        let snapshot = snapshot_of(&[("sugar", "Sugar", 4500)]);

        let err = billing
            .generate_bill("u-1", "Asha", "", &[], &snapshot)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        // All-zero selections are an empty cart too
        let err = billing
            .generate_bill("u-1", "Asha", "", &[selection("sugar", 0)], &snapshot)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        // Missing customer name
        let err = billing
            .generate_bill("u-1", "  ", "", &[selection("sugar", 1)], &snapshot)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        // Malformed phone (when present)
        let err = billing
            .generate_bill("u-1", "Asha", "12345", &[selection("sugar", 1)], &snapshot)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        // Negative quantity
        let err = billing
            .generate_bill("u-1", "Asha", "", &[selection("sugar", -2)], &snapshot)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        assert_eq!(billing.bill_count("u-1").await.unwrap(), 0);
    }

    /// Deleting a bill removes its items with it.
    #[tokio::test]
    async fn test_delete_bill_removes_items() {
        let (_inventory, billing) = services().await;

        let outcome = billing
            .generate_bill(
                "u-1",
                "Asha",
                "",
                &[selection("sugar", 2)],
                &snapshot_of(&[("sugar", "Sugar", 4500)]),
            )
            .await
            .unwrap();

        billing.delete_bill(&outcome.bill_id).await.unwrap();

        assert!(billing.get_bill(&outcome.bill_id).await.unwrap().is_none());
        assert!(billing
            .get_bill_items(&outcome.bill_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_history_queries_and_total_sales() {
        let (_inventory, billing) = services().await;
        let snapshot = snapshot_of(&[("sugar", "Sugar", 4500)]);

        let first = billing
            .generate_bill("u-1", "Asha", "", &[selection("sugar", 1)], &snapshot)
            .await
            .unwrap();
        billing
            .generate_bill("u-1", "Ravi", "", &[selection("sugar", 2)], &snapshot)
            .await
            .unwrap();

        assert_eq!(billing.bill_count("u-1").await.unwrap(), 2);
        assert_eq!(
            billing.total_sales("u-1").await.unwrap(),
            Money::from_cents(4500 * 3)
        );

        // Voiding keeps history but drops the amount out of sales
        billing.void_bill(&first.bill_id).await.unwrap();
        assert_eq!(billing.bill_count("u-1").await.unwrap(), 2);
        assert_eq!(
            billing.total_sales("u-1").await.unwrap(),
            Money::from_cents(4500 * 2)
        );

        // Other users see nothing
        assert_eq!(billing.bill_count("u-2").await.unwrap(), 0);
        assert!(billing.list_bills("u-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watch_bills_sees_new_bill() {
        let (_inventory, billing) = services().await;

        let live = billing.watch_bills("u-1").await.unwrap();
        let mut sub = live.subscribe();
        assert!(sub.snapshot().is_empty());

        billing
            .generate_bill(
                "u-1",
                "Asha",
                "",
                &[selection("sugar", 1)],
                &snapshot_of(&[("sugar", "Sugar", 4500)]),
            )
            .await
            .unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(1), sub.changed())
            .await
            .expect("live query should refresh");
        assert_eq!(sub.snapshot().len(), 1);
    }
}
