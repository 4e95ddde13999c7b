//! # Presentation State
//!
//! Observable view state mediating between user actions and the services.
//!
//! ## Contract
//! Every mutating user action is dispatched as an asynchronous task; its
//! completion updates the relevant observable state (list snapshot, stats,
//! error message) rather than returning a value synchronously. Failures
//! become a human-readable message and leave prior state unchanged.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      State Architecture                             │
//! │                                                                     │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────┐    │
//! │  │ ProductListState │ │ BillHistoryState │ │  CheckoutState   │    │
//! │  │                  │ │                  │ │                  │    │
//! │  │ • live list      │ │ • live bills     │ │ • CartState      │    │
//! │  │ • search filter  │ │ • date filter    │ │ • scan-to-cart   │    │
//! │  │ • stats          │ │ • filtered stats │ │ • submit         │    │
//! │  │ • error/loading  │ │ • error          │ │ • error/outcome  │    │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────┘    │
//! │                                                                     │
//! │  Each state type is constructed for a signed-in user; without one  │
//! │  the composition root refuses to build it (fail closed).           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

pub mod bills;
pub mod cart;
pub mod checkout;
pub mod products;

pub use bills::{BillHistoryState, BillStats, DateFilter};
pub use cart::{Cart, CartItem, CartState, CartTotals};
pub use checkout::{CheckoutState, ScanOutcome};
pub use products::{InventoryStats, ProductListState};
