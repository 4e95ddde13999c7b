//! # Service Layer
//!
//! The two domain services (inventory, billing) plus the profile mirror.
//!
//! Services validate first, then talk to the repositories, then publish a
//! [`crate::live::StoreEvent`] so every live query refreshes. They are the
//! only call sites that mutate the store: nothing bypasses them to touch
//! rows directly.

pub mod billing;
pub mod inventory;
pub mod profile;

pub use billing::{BillOutcome, BillingService, CatalogEntry, CatalogSnapshot, Selection};
pub use inventory::{InventoryService, ScanLookup};
pub use profile::ProfileService;
