//! # kirana-core: Pure Business Logic for Kirana POS
//!
//! This crate is the heart of Kirana POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Kirana POS Architecture                        │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                 kirana-app (state + services)               │   │
//! │  │   product list ──► cart ──► checkout ──► bill history      │   │
//! │  └─────────────────────────────┬───────────────────────────────┘   │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼───────────────────────────────┐   │
//! │  │              ★ kirana-core (THIS CRATE) ★                   │   │
//! │  │                                                             │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌────────────┐               │   │
//! │  │   │  types   │  │  money   │  │ validation │               │   │
//! │  │   │ Product  │  │  Money   │  │   rules    │               │   │
//! │  │   │ Bill     │  │ (paise)  │  │   checks   │               │   │
//! │  │   └──────────┘  └──────────┘  └────────────┘               │   │
//! │  │                                                             │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────┬───────────────────────────────┘   │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼───────────────────────────────┐   │
//! │  │                 kirana-db (Database Layer)                  │   │
//! │  │            SQLite queries, migrations, repositories        │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic - same input = same output
//! 2. **No I/O**: database, network, file system access is forbidden here
//! 3. **Integer Money**: all monetary values are in paise (i64), never floats
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
///
/// Prevents runaway carts and keeps a single transaction a reasonable size.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in a cart or bill.
///
/// Guards against fat-finger entry (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Stock level at or below which a product counts as "low stock".
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;
