//! # Catalog Export / Import
//!
//! JSON backup and restore of a user's product catalog.
//!
//! ## Wire Format
//! ```json
//! {
//!   "exportTimestamp": 1754640000000,
//!   "userId": "u-1",
//!   "products": [
//!     {"productId": "8901030865278", "name": "Soap 75g", "price": 3500,
//!      "quantity": 12, "createdAt": 1754600000000, "updatedAt": 1754610000000}
//!   ]
//! }
//! ```
//!
//! Timestamps are epoch milliseconds; `price` is carried in minor currency
//! units (paise) as an integer, keeping the round trip exact with no
//! floating-point drift.
//!
//! ## Import Policy
//! For each product in the file: if the id already exists for the current
//! user it is skipped (never overwritten); otherwise it is inserted with
//! `updatedAt` reset to import time. The operation reports imported vs.
//! skipped counts, which makes a re-import of the same file a visible
//! no-op.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kirana_core::Product;

use crate::error::{AppError, AppResult};

// =============================================================================
// Format Types
// =============================================================================

/// A full catalog backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogExport {
    /// When the export was taken (epoch millis).
    pub export_timestamp: i64,
    /// The catalog's owner at export time.
    pub user_id: String,
    pub products: Vec<ExportedProduct>,
}

/// One product in the backup file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedProduct {
    pub product_id: String,
    pub name: String,
    /// Unit price in minor currency units (paise).
    pub price: i64,
    pub quantity: i64,
    /// Epoch millis.
    pub created_at: i64,
    /// Epoch millis.
    pub updated_at: i64,
}

/// What an import reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows newly inserted.
    pub imported: u32,
    /// Rows skipped because the product id already existed.
    pub skipped: u32,
}

// =============================================================================
// Conversions
// =============================================================================

impl CatalogExport {
    /// Builds an export document from catalog rows.
    pub fn from_products(user_id: &str, products: &[Product], exported_at: DateTime<Utc>) -> Self {
        CatalogExport {
            export_timestamp: exported_at.timestamp_millis(),
            user_id: user_id.to_string(),
            products: products
                .iter()
                .map(|p| ExportedProduct {
                    product_id: p.product_id.clone(),
                    name: p.name.clone(),
                    price: p.price_cents,
                    quantity: p.quantity,
                    created_at: p.created_at.timestamp_millis(),
                    updated_at: p.updated_at.timestamp_millis(),
                })
                .collect(),
        }
    }

    /// Serializes the export as pretty-printed JSON.
    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AppError::Export(e.to_string()))
    }

    /// Parses an export document from JSON.
    pub fn from_json(json: &str) -> AppResult<Self> {
        serde_json::from_str(json).map_err(|e| AppError::Export(e.to_string()))
    }

    /// Writes the export to a file.
    pub fn save_to_path(&self, path: &Path) -> AppResult<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| AppError::Export(e.to_string()))
    }

    /// Reads an export from a file.
    pub fn load_from_path(path: &Path) -> AppResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| AppError::Export(e.to_string()))?;
        Self::from_json(&json)
    }
}

impl ExportedProduct {
    /// Converts back into a catalog row for `user_id`.
    ///
    /// `created_at` is preserved from the file; `updated_at` is reset to the
    /// import time per the import policy. An unparseable timestamp falls
    /// back to the import time rather than failing the whole file.
    pub fn to_product(&self, user_id: &str, imported_at: DateTime<Utc>) -> Product {
        Product {
            product_id: self.product_id.clone(),
            user_id: user_id.to_string(),
            name: self.name.clone(),
            price_cents: self.price,
            quantity: self.quantity,
            created_at: DateTime::<Utc>::from_timestamp_millis(self.created_at)
                .unwrap_or(imported_at),
            updated_at: imported_at,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str, price_cents: i64, quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            product_id: id.to_string(),
            user_id: "u-1".to_string(),
            name: name.to_string(),
            price_cents,
            quantity,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_wire_format_field_names() {
        let export = CatalogExport::from_products("u-1", &[product("p-1", "Sugar", 4500, 10)], Utc::now());
        let json: serde_json::Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();

        assert!(json.get("exportTimestamp").is_some());
        assert_eq!(json["userId"], "u-1");
        let first = &json["products"][0];
        assert_eq!(first["productId"], "p-1");
        assert_eq!(first["name"], "Sugar");
        assert_eq!(first["price"], 4500);
        assert_eq!(first["quantity"], 10);
        assert!(first.get("createdAt").is_some());
        assert!(first.get("updatedAt").is_some());
    }

    #[test]
    fn test_json_round_trip() {
        let export = CatalogExport::from_products(
            "u-1",
            &[product("p-1", "Sugar", 4500, 10), product("p-2", "Salt", 2000, 3)],
            Utc::now(),
        );

        let parsed = CatalogExport::from_json(&export.to_json().unwrap()).unwrap();
        assert_eq!(parsed, export);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let export = CatalogExport::from_products("u-1", &[product("p-1", "Sugar", 4500, 10)], Utc::now());
        export.save_to_path(&path).unwrap();

        let loaded = CatalogExport::load_from_path(&path).unwrap();
        assert_eq!(loaded, export);
    }

    #[test]
    fn test_to_product_resets_updated_at() {
        let exported = ExportedProduct {
            product_id: "p-1".to_string(),
            name: "Sugar".to_string(),
            price: 4500,
            quantity: 10,
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_000,
        };

        let imported_at = Utc::now();
        let p = exported.to_product("u-2", imported_at);

        assert_eq!(p.user_id, "u-2");
        assert_eq!(p.created_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(p.updated_at, imported_at);
    }

    #[test]
    fn test_malformed_json_is_an_export_error() {
        let err = CatalogExport::from_json("{not json").unwrap_err();
        assert!(matches!(err, AppError::Export(_)));
    }
}
