//! # Checkout State
//!
//! Drives an active sale: barcode scan-to-cart, then checkout.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Checkout Flow                                │
//! │                                                                     │
//! │  scan(code) ──► lookup as candidate product id                     │
//! │     ├── matched + in stock  → +1 in cart  → ScanOutcome::Added     │
//! │     ├── matched, cart full of its stock   → ScanOutcome::OutOfStock│
//! │     └── unknown code                      → ScanOutcome::Unknown   │
//! │                                                                     │
//! │  submit(customer) ──► task:                                        │
//! │     cart → selections + catalog snapshot                           │
//! │     billing.generate_bill(...)                                     │
//! │     on success: clear cart, publish outcome,                       │
//! │                 render receipt (best-effort)                       │
//! │     on failure: publish error message, cart untouched              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A receipt-renderer failure becomes a message; the committed bill is
//! never affected by it.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use kirana_core::{CoreError, ValidationError};

use crate::error::{AppError, AppResult};
use crate::external::ReceiptRenderer;
use crate::services::billing::{BillOutcome, BillingService};
use crate::services::inventory::{InventoryService, ScanLookup};
use crate::state::cart::CartState;

/// What a barcode scan did to the cart.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// The code matched a product; one unit was added (or merged).
    Added {
        product_id: String,
        quantity_in_cart: i64,
    },
    /// The code matched, but the cart already holds all available stock.
    OutOfStock { name: String, available: i64 },
    /// No product with this id exists for the user; the caller may offer
    /// to create one.
    Unknown { code: String },
}

struct Inner {
    billing: BillingService,
    inventory: InventoryService,
    user_id: String,
    cart: CartState,
    renderer: Option<Arc<dyn ReceiptRenderer>>,
    last_outcome: watch::Sender<Option<BillOutcome>>,
    error: watch::Sender<Option<String>>,
    processing: watch::Sender<bool>,
}

/// Observable checkout state for one signed-in user.
#[derive(Clone)]
pub struct CheckoutState {
    inner: Arc<Inner>,
}

impl CheckoutState {
    /// Builds checkout state with an empty cart.
    pub fn new(
        billing: BillingService,
        inventory: InventoryService,
        user_id: impl Into<String>,
        renderer: Option<Arc<dyn ReceiptRenderer>>,
    ) -> Self {
        let (last_outcome, _) = watch::channel(None);
        let (error, _) = watch::channel(None);
        let (processing, _) = watch::channel(false);

        CheckoutState {
            inner: Arc::new(Inner {
                billing,
                inventory,
                user_id: user_id.into(),
                cart: CartState::new(),
                renderer,
                last_outcome,
                error,
                processing,
            }),
        }
    }

    /// The shared cart, for direct line edits from the UI.
    pub fn cart(&self) -> CartState {
        self.inner.cart.clone()
    }

    /// Handles a decoded barcode string as a candidate product id.
    pub async fn scan(&self, code: &str) -> AppResult<ScanOutcome> {
        let inner = &self.inner;

        match inner.inventory.lookup_scanned(&inner.user_id, code).await? {
            ScanLookup::Unknown { code } => Ok(ScanOutcome::Unknown { code }),
            ScanLookup::Matched(product) => {
                let added = inner.cart.with_cart_mut(|cart| {
                    cart.add_product(&product, 1).map(|()| {
                        cart.items
                            .iter()
                            .find(|i| i.product_id == product.product_id)
                            .map(|i| i.quantity)
                            .unwrap_or(1)
                    })
                });

                match added {
                    Ok(quantity_in_cart) => Ok(ScanOutcome::Added {
                        product_id: product.product_id,
                        quantity_in_cart,
                    }),
                    Err(CoreError::InsufficientStock { available, .. }) => {
                        Ok(ScanOutcome::OutOfStock {
                            name: product.name,
                            available,
                        })
                    }
                    Err(other) => Err(other.into()),
                }
            }
        }
    }

    /// Submits the current cart as a bill, fire-and-forget. Completion
    /// publishes either `last_outcome` or `error_message`; the returned
    /// handle is the completion callback for callers that await it.
    pub fn submit(&self, customer_name: String, customer_phone: String) -> JoinHandle<()> {
        let inner = self.inner.clone();

        tokio::spawn(async move {
            inner.processing.send_replace(true);

            match run_checkout(&inner, &customer_name, &customer_phone).await {
                Ok(outcome) => {
                    inner.error.send_replace(None);
                    render_receipt(&inner, &outcome).await;
                    inner.last_outcome.send_replace(Some(outcome));
                }
                Err(err) => {
                    inner.error.send_replace(Some(err.user_message()));
                }
            }

            inner.processing.send_replace(false);
        })
    }

    /// The outcome of the most recent successful checkout.
    pub fn last_outcome(&self) -> Option<BillOutcome> {
        self.inner.last_outcome.borrow().clone()
    }

    /// A receiver onto the checkout-outcome observable.
    pub fn subscribe_outcome(&self) -> watch::Receiver<Option<BillOutcome>> {
        self.inner.last_outcome.subscribe()
    }

    /// The current error message, if any.
    pub fn error_message(&self) -> Option<String> {
        self.inner.error.borrow().clone()
    }

    /// Whether a checkout is in flight.
    pub fn is_processing(&self) -> bool {
        *self.inner.processing.borrow()
    }
}

async fn run_checkout(
    inner: &Inner,
    customer_name: &str,
    customer_phone: &str,
) -> AppResult<BillOutcome> {
    let (selections, catalog, empty) = inner
        .cart
        .with_cart(|c| (c.selections(), c.catalog_snapshot(), c.is_empty()));

    if empty {
        return Err(ValidationError::Required {
            field: "cart".to_string(),
        }
        .into());
    }

    let outcome = inner
        .billing
        .generate_bill(
            &inner.user_id,
            customer_name,
            customer_phone,
            &selections,
            &catalog,
        )
        .await?;

    // The sale is committed; only now is the cart cleared.
    inner.cart.with_cart_mut(|c| c.clear());

    Ok(outcome)
}

/// Best-effort receipt rendering. A collaborator failure becomes a message
/// and aborts only the rendering - never the committed bill.
async fn render_receipt(inner: &Inner, outcome: &BillOutcome) {
    let Some(renderer) = &inner.renderer else {
        return;
    };

    let rendered: AppResult<Vec<u8>> = async {
        let bill = inner
            .billing
            .get_bill(&outcome.bill_id)
            .await?
            .ok_or_else(|| AppError::not_found("Bill", &outcome.bill_id))?;
        let items = inner.billing.get_bill_items(&outcome.bill_id).await?;

        renderer
            .render(&bill, &items)
            .map_err(|e| AppError::Receipt(e.to_string()))
    }
    .await;

    if let Err(err) = rendered {
        warn!(bill_id = %outcome.bill_id, error = %err, "Receipt rendering failed");
        inner.error.send_replace(Some(err.user_message()));
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::RenderError;
    use crate::live::EventBus;
    use kirana_core::{Bill, BillItem};
    use kirana_db::{Database, DbConfig};
    use std::sync::Mutex;

    async fn checkout_with(renderer: Option<Arc<dyn ReceiptRenderer>>) -> CheckoutState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let events = EventBus::new();
        let inventory = InventoryService::new(db.clone(), events.clone());
        let billing = BillingService::new(db, events);

        inventory
            .create("u-1", Some("8901030865278"), "Soap", 3500, 2)
            .await
            .unwrap();

        CheckoutState::new(billing, inventory, "u-1", renderer)
    }

    /// Records every render call; can be told to fail.
    struct RecordingRenderer {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingRenderer {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(RecordingRenderer {
                calls: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    impl ReceiptRenderer for RecordingRenderer {
        fn render(&self, bill: &Bill, items: &[BillItem]) -> Result<Vec<u8>, RenderError> {
            self.calls.lock().unwrap().push(bill.bill_id.clone());
            if self.fail {
                return Err(RenderError("printer on fire".to_string()));
            }
            Ok(format!("receipt for {} items", items.len()).into_bytes())
        }
    }

    #[tokio::test]
    async fn test_scan_adds_until_out_of_stock() {
        let state = checkout_with(None).await;

        match state.scan("8901030865278").await.unwrap() {
            ScanOutcome::Added {
                quantity_in_cart, ..
            } => assert_eq!(quantity_in_cart, 1),
            other => panic!("expected Added, got {other:?}"),
        }

        match state.scan("8901030865278").await.unwrap() {
            ScanOutcome::Added {
                quantity_in_cart, ..
            } => assert_eq!(quantity_in_cart, 2),
            other => panic!("expected Added, got {other:?}"),
        }

        // Stock is 2: a third scan reports out of stock
        match state.scan("8901030865278").await.unwrap() {
            ScanOutcome::OutOfStock { available, .. } => assert_eq!(available, 2),
            other => panic!("expected OutOfStock, got {other:?}"),
        }
        assert_eq!(state.cart().with_cart(|c| c.total_quantity()), 2);
    }

    #[tokio::test]
    async fn test_scan_unknown_code() {
        let state = checkout_with(None).await;

        match state.scan("0000000000000").await.unwrap() {
            ScanOutcome::Unknown { code } => assert_eq!(code, "0000000000000"),
            other => panic!("expected Unknown, got {other:?}"),
        }
        assert!(state.cart().with_cart(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn test_submit_commits_bill_and_clears_cart() {
        let renderer = RecordingRenderer::new(false);
        let state = checkout_with(Some(renderer.clone())).await;

        state.scan("8901030865278").await.unwrap();
        state
            .submit("Asha".to_string(), "9876543210".to_string())
            .await
            .unwrap();

        let outcome = state.last_outcome().expect("checkout should succeed");
        assert_eq!(outcome.total_cents, 3500);
        assert!(state.error_message().is_none());
        assert!(state.cart().with_cart(|c| c.is_empty()));

        // Receipt rendered for the committed bill
        assert_eq!(renderer.calls.lock().unwrap().as_slice(), &[outcome.bill_id]);
    }

    #[tokio::test]
    async fn test_submit_empty_cart_sets_error() {
        let state = checkout_with(None).await;

        state
            .submit("Asha".to_string(), String::new())
            .await
            .unwrap();

        assert!(state.last_outcome().is_none());
        assert!(state.error_message().is_some());
    }

    #[tokio::test]
    async fn test_failed_checkout_keeps_cart() {
        let state = checkout_with(None).await;
        state.scan("8901030865278").await.unwrap();

        // Missing customer name: validation failure
        state.submit(String::new(), String::new()).await.unwrap();

        assert!(state.last_outcome().is_none());
        assert!(state.error_message().is_some());
        // The cart survives a failed checkout
        assert_eq!(state.cart().with_cart(|c| c.total_quantity()), 1);
    }

    #[tokio::test]
    async fn test_renderer_failure_does_not_lose_the_bill() {
        let renderer = RecordingRenderer::new(true);
        let state = checkout_with(Some(renderer)).await;

        state.scan("8901030865278").await.unwrap();
        state
            .submit("Asha".to_string(), String::new())
            .await
            .unwrap();

        // The bill committed and the outcome is published...
        let outcome = state.last_outcome().expect("bill should commit");
        assert!(outcome.total_cents > 0);
        // ...while the collaborator failure surfaces as a message
        assert!(state.error_message().is_some());
    }
}
