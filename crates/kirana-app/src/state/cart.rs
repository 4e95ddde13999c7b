//! # Cart State
//!
//! The in-progress, not-yet-committed set of product selections for an
//! active sale. Client-side only until checkout.
//!
//! ## Invariants
//! - Lines are unique by `product_id`; adding the same product again
//!   merges into the existing line.
//! - A catalog-backed line's quantity can never exceed the stock captured
//!   when the product was added.
//! - Manual ad-hoc lines carry a generated synthetic id and are never
//!   deducted from inventory.
//! - Name and unit price are frozen at add time: a catalog edit after the
//!   product landed in the cart does not change the cart.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use kirana_core::validation::{validate_price_cents, validate_product_name};
use kirana_core::{CoreError, CoreResult, Product, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

use crate::services::billing::{CatalogEntry, CatalogSnapshot, Selection};

// =============================================================================
// Cart Item
// =============================================================================

/// One line in the cart: a frozen product snapshot plus a quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub product_id: String,

    /// Name at time of adding (frozen).
    pub name: String,

    /// Unit price in paise at time of adding (frozen).
    pub unit_price_cents: i64,

    pub quantity: i64,

    /// Stock on hand when the product was added; the cap for this line.
    /// `None` for manual lines, which have no stock to cap against.
    pub available_stock: Option<i64>,

    /// Ad-hoc manual entry, not backed by the catalog.
    pub manual: bool,

    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Builds a cart line from a catalog product, freezing name and price.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.product_id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            available_stock: Some(product.quantity),
            manual: false,
            added_at: Utc::now(),
        }
    }

    /// Line total (unit price × quantity).
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The active cart.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Some(Utc::now()),
        }
    }

    /// Adds a catalog product, merging into an existing line.
    ///
    /// Fails with `InsufficientStock` when the merged quantity would exceed
    /// the stock captured at add time, with `CartTooLarge` /
    /// `QuantityTooLarge` at the cart limits.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product.product_id)
        {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            if let Some(stock) = item.available_stock {
                if new_qty > stock {
                    return Err(CoreError::InsufficientStock {
                        name: item.name.clone(),
                        available: stock,
                        requested: new_qty,
                    });
                }
            }
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if quantity > product.quantity {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.quantity,
                requested: quantity,
            });
        }

        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Adds an ad-hoc manual line with a generated synthetic id.
    ///
    /// Returns the generated id. Manual lines have no stock cap and never
    /// deduct inventory at checkout.
    pub fn add_manual_line(
        &mut self,
        name: &str,
        unit_price_cents: i64,
        quantity: i64,
    ) -> CoreResult<String> {
        validate_product_name(name)?;
        validate_price_cents(unit_price_cents)?;
        if quantity <= 0 || quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        let product_id = format!("manual-{}", Uuid::new_v4());
        self.items.push(CartItem {
            product_id: product_id.clone(),
            name: name.trim().to_string(),
            unit_price_cents,
            quantity,
            available_stock: None,
            manual: true,
            added_at: Utc::now(),
        });

        Ok(product_id)
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_line(product_id);
        }

        if quantity < 0 || quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        if let Some(stock) = item.available_stock {
            if quantity > stock {
                return Err(CoreError::InsufficientStock {
                    name: item.name.clone(),
                    available: stock,
                    requested: quantity,
                });
            }
        }

        item.quantity = quantity;
        Ok(())
    }

    /// Removes a line.
    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == before {
            Err(CoreError::ProductNotFound(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Some(Utc::now());
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Cart total in paise.
    pub fn total_cents(&self) -> i64 {
        self.items.iter().map(|i| i.line_total_cents()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The selections to hand to the billing service.
    pub fn selections(&self) -> Vec<Selection> {
        self.items
            .iter()
            .map(|i| Selection {
                product_id: i.product_id.clone(),
                quantity: i.quantity,
                manual: i.manual,
            })
            .collect()
    }

    /// The frozen catalog snapshot resolving names and prices at checkout.
    pub fn catalog_snapshot(&self) -> CatalogSnapshot {
        self.items
            .iter()
            .map(|i| {
                (
                    i.product_id.clone(),
                    CatalogEntry {
                        name: i.name.clone(),
                        unit_price_cents: i.unit_price_cents,
                    },
                )
            })
            .collect()
    }
}

/// Cart totals summary for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            total_cents: cart.total_cents(),
        }
    }
}

// =============================================================================
// Shared Cart State
// =============================================================================

/// Shared, mutex-guarded cart.
///
/// `Arc<Mutex<Cart>>` because checkout and scan handlers may touch the cart
/// from different tasks, and only one should modify it at a time. Cart
/// operations are quick, so a plain mutex beats a RwLock here.
#[derive(Debug, Clone)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    /// Creates a new empty cart state.
    pub fn new() -> Self {
        CartState {
            cart: Arc::new(Mutex::new(Cart::new())),
        }
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().expect("Cart mutex poisoned");
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().expect("Cart mutex poisoned");
        f(&mut cart)
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(id: &str, price_cents: i64, quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            product_id: id.to_string(),
            user_id: "u-1".to_string(),
            name: format!("Product {id}"),
            price_cents,
            quantity,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_add_item_and_totals() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("p-1", 999, 10), 2).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.total_cents(), 1998);
    }

    #[test]
    fn test_add_same_product_merges_line() {
        let mut cart = Cart::new();
        let product = test_product("p-1", 999, 10);

        cart.add_product(&product, 2).unwrap();
        cart.add_product(&product, 3).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_quantity_capped_by_stock() {
        let mut cart = Cart::new();
        let product = test_product("p-1", 999, 3);

        assert!(matches!(
            cart.add_product(&product, 4),
            Err(CoreError::InsufficientStock { available: 3, .. })
        ));

        cart.add_product(&product, 2).unwrap();
        // Merging past the captured stock also fails
        assert!(matches!(
            cart.add_product(&product, 2),
            Err(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(cart.total_quantity(), 2);

        // And so does raising the line directly
        assert!(cart.set_quantity("p-1", 3).is_ok());
        assert!(matches!(
            cart.set_quantity("p-1", 4),
            Err(CoreError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("p-1", 999, 10), 2).unwrap();

        cart.set_quantity("p-1", 0).unwrap();
        assert!(cart.is_empty());

        assert!(matches!(
            cart.set_quantity("p-1", 1),
            Err(CoreError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_manual_lines() {
        let mut cart = Cart::new();
        let id = cart.add_manual_line("Loose jaggery", 1500, 2).unwrap();

        assert!(id.starts_with("manual-"));
        assert_eq!(cart.total_cents(), 3000);

        let selections = cart.selections();
        assert_eq!(selections.len(), 1);
        assert!(selections[0].manual);

        // Manual lines have no stock cap
        cart.set_quantity(&id, 50).unwrap();
        assert_eq!(cart.total_quantity(), 50);

        // But still validate name and price
        assert!(cart.add_manual_line("", 1500, 1).is_err());
        assert!(cart.add_manual_line("Ok", 0, 1).is_err());
    }

    #[test]
    fn test_snapshot_freezes_price() {
        let mut cart = Cart::new();
        let product = test_product("p-1", 4500, 10);
        cart.add_product(&product, 1).unwrap();

        let snapshot = cart.catalog_snapshot();
        let entry = snapshot.get("p-1").unwrap();
        assert_eq!(entry.unit_price_cents, 4500);
        assert_eq!(entry.name, "Product p-1");
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("p-1", 999, 10), 2).unwrap();

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_cents(), 0);
    }

    #[test]
    fn test_cart_state_shared_access() {
        let state = CartState::new();
        let product = test_product("p-1", 999, 10);

        state
            .with_cart_mut(|c| c.add_product(&product, 2))
            .unwrap();

        let totals = state.with_cart(|c| CartTotals::from(c));
        assert_eq!(totals.total_cents, 1998);

        // Clones share the same cart
        let clone = state.clone();
        assert_eq!(clone.with_cart(|c| c.total_quantity()), 2);
    }
}
