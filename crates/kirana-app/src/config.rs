//! # App Configuration
//!
//! Configuration for the Kirana POS runtime.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                           │
//! │                                                                     │
//! │  1. Environment Variables (highest priority)                       │
//! │     KIRANA_DB_PATH=/data/kirana.db                                  │
//! │     KIRANA_STORE_NAME="Asha General Store"                          │
//! │     KIRANA_LOW_STOCK_THRESHOLD=5                                    │
//! │     KIRANA_RECENT_BILLS_LIMIT=10                                    │
//! │                                                                     │
//! │  2. TOML Config File                                                │
//! │     ~/.config/kirana-pos/config.toml (Linux)                        │
//! │                                                                     │
//! │  3. Default Values (lowest priority)                                │
//! │     platform data dir + kirana.db, threshold 10, 5 recent bills    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! database_path = "/home/asha/.local/share/kirana-pos/kirana.db"
//! store_name = "Asha General Store"
//! low_stock_threshold = 10
//! recent_bills_limit = 5
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use kirana_core::DEFAULT_LOW_STOCK_THRESHOLD;

use crate::error::{AppError, AppResult};

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Store name shown on receipts.
    pub store_name: String,

    /// Stock level at or below which a product counts as low.
    pub low_stock_threshold: i64,

    /// How many bills the "recent bills" view shows.
    pub recent_bills_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: default_database_path(),
            store_name: "Kirana Store".to_string(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            recent_bills_limit: 5,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    pub fn load_from_path(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
        let config: AppConfig =
            toml::from_str(&raw).map_err(|e| AppError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Loads from the default config path when the file exists, otherwise
    /// starts from defaults; environment overrides are applied last.
    pub fn load_or_default() -> Self {
        let base = match default_config_path() {
            Some(path) if path.exists() => match Self::load_from_path(&path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(error = %err, "Config file unreadable, using defaults");
                    AppConfig::default()
                }
            },
            _ => AppConfig::default(),
        };

        base.apply_env_overrides()
    }

    /// Applies `KIRANA_*` environment variable overrides.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("KIRANA_DB_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Ok(name) = std::env::var("KIRANA_STORE_NAME") {
            self.store_name = name;
        }
        if let Ok(threshold) = std::env::var("KIRANA_LOW_STOCK_THRESHOLD") {
            if let Ok(threshold) = threshold.parse() {
                self.low_stock_threshold = threshold;
            }
        }
        if let Ok(limit) = std::env::var("KIRANA_RECENT_BILLS_LIMIT") {
            if let Ok(limit) = limit.parse() {
                self.recent_bills_limit = limit;
            }
        }

        debug!(?self, "Configuration resolved");
        self
    }
}

/// Platform default for the database file.
///
/// Linux: `~/.local/share/kirana-pos/kirana.db`
fn default_database_path() -> PathBuf {
    match ProjectDirs::from("in", "kirana", "kirana-pos") {
        Some(dirs) => dirs.data_dir().join("kirana.db"),
        None => PathBuf::from("kirana.db"),
    }
}

/// Platform default for the config file.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("in", "kirana", "kirana-pos")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

// =============================================================================
// Unit Tests
// =============================================================================
