//! # kirana-db: Database Layer for Kirana POS
//!
//! This crate provides database access for the Kirana POS system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Kirana POS Data Flow                          │
//! │                                                                     │
//! │  Service call (inventory / billing)                                │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                   kirana-db (THIS CRATE)                    │   │
//! │  │                                                             │   │
//! │  │   ┌─────────────┐   ┌───────────────┐   ┌──────────────┐  │   │
//! │  │   │  Database   │   │ Repositories  │   │  Migrations  │  │   │
//! │  │   │  (pool.rs)  │◄──│ product/bill  │   │  (embedded)  │  │   │
//! │  │   └─────────────┘   └───────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database file (WAL mode, foreign keys on)                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, bill)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kirana_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/kirana.db")).await?;
//! let products = db.products().list_for_user("user-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::bill::BillRepository;
pub use repository::product::ProductRepository;
