//! # Domain Types
//!
//! Core domain types used throughout Kirana POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐   │
//! │  │    Product      │   │      Bill       │   │    BillItem     │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │   │
//! │  │  product_id ┐   │   │  bill_id        │   │  bill_item_id   │   │
//! │  │  user_id    ┘pk │   │  customer_name  │   │  bill_id (FK)   │   │
//! │  │  name           │   │  total_cents    │   │  product_name*  │   │
//! │  │  price_cents    │   │  total_items    │   │  unit_price*    │   │
//! │  │  quantity       │   │  status         │   │  quantity       │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘   │
//! │                                                * frozen snapshots   │
//! │                                                                     │
//! │  Ownership: every row belongs to exactly one user_id.               │
//! │  BillItem is lifecycle-bound to its parent Bill (cascade delete).   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `BillItem` copies the product's name and unit price at bill-creation
//! time. Later edits to the catalog must never alter historical bills.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// One catalog entry: a sellable item and its current stock level.
///
/// `(product_id, user_id)` uniquely identifies a row; the product id may be
/// user-supplied, derived from a scanned barcode, or generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Catalog identifier (unique within one user's catalog).
    pub product_id: String,

    /// Owning user. All queries and mutations are scoped by this.
    pub user_id: String,

    /// Display name shown in lists and on bills.
    pub name: String,

    /// Unit price in paise. Strictly positive.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub quantity: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Value of the stock on hand (price × quantity).
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.price().multiply_quantity(self.quantity)
    }

    /// Whether `quantity` more units can be sold from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }

    /// Whether the stock level counts as low against the given threshold.
    #[inline]
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.quantity <= threshold
    }
}

// =============================================================================
// Bill Status
// =============================================================================

/// The status of a bill.
///
/// Bills are created already completed (checkout persists the final state in
/// one step); voiding keeps the record for history instead of deleting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    /// Sale completed and paid.
    #[default]
    Completed,
    /// Sale cancelled after the fact; kept for the record.
    Voided,
}

// =============================================================================
// Bill
// =============================================================================

/// A single completed sale transaction.
///
/// Invariant: `total_cents` equals the sum of its items' `total_cents` and
/// `total_items` equals the sum of their quantities, exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Bill {
    pub bill_id: String,
    pub user_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    /// Grand total in paise.
    pub total_cents: i64,
    /// Total units across all line items.
    pub total_items: i64,
    pub status: BillStatus,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Bill Item
// =============================================================================

/// One line entry within a bill.
///
/// Name and unit price are frozen copies taken at bill-creation time, not
/// live references into the catalog. `product_id` may be synthetic for
/// ad-hoc manual lines that never existed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BillItem {
    pub bill_item_id: String,
    /// Owning bill; items live and die with their parent.
    pub bill_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// Unit price in paise at time of sale (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// Line total: `unit_price_cents × quantity`.
    pub total_cents: i64,
}

impl BillItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// User Profile
// =============================================================================

/// Display metadata for the signed-in user, mirrored from the cloud profile
/// store. Never used for inventory or bill records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub mobile_number: String,
    pub store_name: String,
    pub gst_number: String,
    pub unlocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub profile_setup_completed: bool,
}

impl UserProfile {
    /// A usable default profile for `user_id`, used when the cloud store is
    /// unreachable or has no document yet.
    pub fn default_for(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        UserProfile {
            user_id: user_id.into(),
            name: String::new(),
            email: String::new(),
            mobile_number: String::new(),
            store_name: String::new(),
            gst_number: String::new(),
            unlocked: true,
            created_at: now,
            updated_at: now,
            profile_setup_completed: false,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price_cents: i64, quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            product_id: "p-1".to_string(),
            user_id: "u-1".to_string(),
            name: "Sugar 1kg".to_string(),
            price_cents,
            quantity,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_stock_value() {
        let p = product(4500, 10);
        assert_eq!(p.stock_value().cents(), 45_000);
    }

    #[test]
    fn test_can_sell() {
        let p = product(4500, 3);
        assert!(p.can_sell(3));
        assert!(!p.can_sell(4));
    }

    #[test]
    fn test_low_stock() {
        let p = product(4500, 10);
        assert!(p.is_low_stock(10));
        assert!(!p.is_low_stock(9));
    }

    #[test]
    fn test_bill_status_default() {
        assert_eq!(BillStatus::default(), BillStatus::Completed);
    }
}
