//! # kirana-app: Services and Presentation State for Kirana POS
//!
//! The application layer over [`kirana_core`] and [`kirana_db`]: domain
//! services, observable view state, catalog export/import, configuration,
//! and the narrow seams to external collaborators.
//!
//! ## Module Organization
//! ```text
//! kirana_app/
//! ├── lib.rs          ◄─── module wiring + logging init
//! ├── app.rs          ◄─── composition root (explicit DI, no singletons)
//! ├── config.rs       ◄─── TOML + env configuration
//! ├── error.rs        ◄─── AppError / ErrorCode / user messages
//! ├── export.rs       ◄─── catalog JSON backup/restore
//! ├── external.rs     ◄─── auth / profile store / receipt renderer seams
//! ├── live.rs         ◄─── event bus + live-query subscriptions
//! ├── services/
//! │   ├── inventory.rs    catalog CRUD, stock ops, import/export
//! │   ├── billing.rs      bill generation, deletion, history
//! │   └── profile.rs      cloud profile mirror with offline fallback
//! └── state/
//!     ├── cart.rs         shared cart with frozen line snapshots
//!     ├── products.rs     live product list + search + stats
//!     ├── bills.rs        live bill history + date filter
//!     └── checkout.rs     scan-to-cart + checkout submission
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod export;
pub mod external;
pub mod live;
pub mod services;
pub mod state;

pub use app::App;
pub use config::AppConfig;
pub use error::{AppError, AppResult, ErrorCode};

use tracing_subscriber::EnvFilter;

/// Initializes logging for the application.
///
/// Default level is INFO; override with `RUST_LOG` (e.g.
/// `RUST_LOG=kirana_db=debug`). Safe to call more than once - later calls
/// are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
