//! # Product Repository
//!
//! Database operations for the per-user product catalog.
//!
//! ## Key Operations
//! - Alphabetical listing and case-insensitive substring search
//! - Upsert (insert-or-replace by `(product_id, user_id)`)
//! - Stock adjustments with an underflow guard
//! - Clamped post-sale deductions
//! - Catalog aggregates (count, total inventory value)
//!
//! ## Stock Update Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Stock changes are single guarded UPDATE statements, not            │
//! │  read-modify-write round trips:                                     │
//! │                                                                     │
//! │  adjust_stock(-3):                                                  │
//! │    UPDATE products SET quantity = quantity - 3                      │
//! │    WHERE ... AND quantity - 3 >= 0                                  │
//! │    → 0 rows affected means "rejected, nothing written"              │
//! │                                                                     │
//! │  deduct_stock_clamped(5):                                           │
//! │    UPDATE products SET quantity = MAX(quantity - 5, 0) WHERE ...    │
//! │    → stock can never go below zero                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kirana_core::Product;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let products = repo.search_for_user("user-1", "sugar").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products for a user, alphabetical by name.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, user_id, name, price_cents, quantity, created_at, updated_at
            FROM products
            WHERE user_id = ?
            ORDER BY name COLLATE NOCASE ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches a user's products by case-insensitive substring match on name.
    ///
    /// An empty query behaves like [`Self::list_for_user`]. Results keep the
    /// alphabetical ordering of the full listing.
    pub async fn search_for_user(&self, user_id: &str, query: &str) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(user_id = %user_id, query = %query, "Searching products");

        if query.is_empty() {
            return self.list_for_user(user_id).await;
        }

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, user_id, name, price_cents, quantity, created_at, updated_at
            FROM products
            WHERE user_id = ? AND name LIKE '%' || ? || '%'
            ORDER BY name COLLATE NOCASE ASC
            "#,
        )
        .bind(user_id)
        .bind(query)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Gets a product by `(product_id, user_id)`.
    ///
    /// Never returns another user's row, even for an identical product id.
    pub async fn get(&self, product_id: &str, user_id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, user_id, name, price_cents, quantity, created_at, updated_at
            FROM products
            WHERE product_id = ? AND user_id = ?
            "#,
        )
        .bind(product_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Checks whether a product exists for the user.
    pub async fn exists(&self, product_id: &str, user_id: &str) -> DbResult<bool> {
        let found: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM products WHERE product_id = ? AND user_id = ?)",
        )
        .bind(product_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(found != 0)
    }

    /// Inserts a product, replacing any existing row with the same
    /// `(product_id, user_id)`.
    ///
    /// This is the explicit insert-or-replace contract: creating a product
    /// whose id already exists for the user overwrites it rather than
    /// failing.
    pub async fn upsert(&self, product: &Product) -> DbResult<()> {
        debug!(product_id = %product.product_id, user_id = %product.user_id, "Upserting product");

        sqlx::query(
            r#"
            INSERT INTO products (product_id, user_id, name, price_cents, quantity, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (product_id, user_id) DO UPDATE SET
                name = excluded.name,
                price_cents = excluded.price_cents,
                quantity = excluded.quantity,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&product.product_id)
        .bind(&product.user_id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.quantity)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sets a product's quantity, touching `updated_at`.
    pub async fn update_quantity(
        &self,
        product_id: &str,
        user_id: &str,
        new_quantity: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET quantity = ?, updated_at = ?
            WHERE product_id = ? AND user_id = ?
            "#,
        )
        .bind(new_quantity)
        .bind(now)
        .bind(product_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Sets a product's unit price, touching `updated_at`.
    pub async fn update_price(
        &self,
        product_id: &str,
        user_id: &str,
        new_price_cents: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET price_cents = ?, updated_at = ?
            WHERE product_id = ? AND user_id = ?
            "#,
        )
        .bind(new_price_cents)
        .bind(now)
        .bind(product_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Adds or removes stock.
    ///
    /// Returns `false` (and writes nothing) when the product is missing or
    /// the delta would take the quantity below zero. The guard is part of
    /// the UPDATE itself, so a concurrent writer cannot slip the quantity
    /// negative between a read and a write.
    pub async fn adjust_stock(&self, product_id: &str, user_id: &str, delta: i64) -> DbResult<bool> {
        debug!(product_id = %product_id, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET quantity = quantity + ?, updated_at = ?
            WHERE product_id = ? AND user_id = ? AND quantity + ? >= 0
            "#,
        )
        .bind(delta)
        .bind(now)
        .bind(product_id)
        .bind(user_id)
        .bind(delta)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Decrements stock by the sold amount, clamped so it never goes
    /// negative. Returns the number of rows touched (0 when the product no
    /// longer exists - the caller skips it).
    pub async fn deduct_stock_clamped(
        &self,
        product_id: &str,
        user_id: &str,
        sold: i64,
    ) -> DbResult<u64> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET quantity = MAX(quantity - ?, 0), updated_at = ?
            WHERE product_id = ? AND user_id = ?
            "#,
        )
        .bind(sold)
        .bind(now)
        .bind(product_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Hard-deletes a product.
    pub async fn delete(&self, product_id: &str, user_id: &str) -> DbResult<()> {
        debug!(product_id = %product_id, user_id = %user_id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE product_id = ? AND user_id = ?")
            .bind(product_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Counts a user's products.
    pub async fn count(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Total inventory value: Σ(price × quantity) over the user's catalog,
    /// in paise.
    pub async fn total_inventory_value(&self, user_id: &str) -> DbResult<i64> {
        let value: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(price_cents * quantity), 0) FROM products WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(value)
    }

    /// Products at or below the low-stock threshold, lowest stock first.
    pub async fn low_stock(&self, user_id: &str, threshold: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, user_id, name, price_cents, quantity, created_at, updated_at
            FROM products
            WHERE user_id = ? AND quantity <= ?
            ORDER BY quantity ASC, name COLLATE NOCASE ASC
            "#,
        )
        .bind(user_id)
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts every product that does not already exist for the user, in
    /// one transaction. Existing `(product_id, user_id)` rows are skipped,
    /// not overwritten.
    ///
    /// Returns `(inserted, skipped)` counts. This backs the catalog import
    /// flow, which must be idempotent: importing the same file twice inserts
    /// nothing the second time.
    pub async fn insert_if_absent_batch(
        &self,
        user_id: &str,
        products: &[Product],
    ) -> DbResult<(u32, u32)> {
        let mut tx = self.pool.begin().await?;

        let mut inserted = 0u32;
        let mut skipped = 0u32;

        for product in products {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO products
                    (product_id, user_id, name, price_cents, quantity, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&product.product_id)
            .bind(user_id)
            .bind(&product.name)
            .bind(product.price_cents)
            .bind(product.quantity)
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                inserted += 1;
            } else {
                skipped += 1;
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(inserted, skipped, "Batch insert complete");
        Ok((inserted, skipped))
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
