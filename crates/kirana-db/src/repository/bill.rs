//! # Bill Repository
//!
//! Database operations for bills and their line items.
//!
//! ## Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  insert_bill_with_items            delete_bill_with_items           │
//! │  ─────────────────────             ──────────────────────           │
//! │  BEGIN                             BEGIN                            │
//! │    INSERT INTO bills ...             DELETE FROM bill_items ...     │
//! │    INSERT INTO bill_items ... (×N)   DELETE FROM bills ...          │
//! │  COMMIT                            COMMIT                           │
//! │                                                                     │
//! │  A concurrent reader never observes a bill without its items, and  │
//! │  never observes orphaned items: both writes are all-or-nothing,    │
//! │  and deletion removes items before the parent.                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kirana_core::{Bill, BillItem, BillStatus};

/// Repository for bill database operations.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Persists a bill and all of its line items as one atomic unit.
    ///
    /// Either both the bill and every item become visible together, or
    /// nothing does. There is never a partial bill with missing items.
    pub async fn insert_bill_with_items(&self, bill: &Bill, items: &[BillItem]) -> DbResult<()> {
        debug!(bill_id = %bill.bill_id, items = items.len(), "Inserting bill with items");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO bills
                (bill_id, user_id, customer_name, customer_phone,
                 total_cents, total_items, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&bill.bill_id)
        .bind(&bill.user_id)
        .bind(&bill.customer_name)
        .bind(&bill.customer_phone)
        .bind(bill.total_cents)
        .bind(bill.total_items)
        .bind(bill.status)
        .bind(bill.created_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO bill_items
                    (bill_item_id, bill_id, product_id, product_name,
                     unit_price_cents, quantity, total_cents)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.bill_item_id)
            .bind(&item.bill_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.total_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Deletes a bill and all of its items as one atomic unit, items before
    /// the parent. Deleting a missing bill is a no-op.
    pub async fn delete_bill_with_items(&self, bill_id: &str) -> DbResult<()> {
        debug!(bill_id = %bill_id, "Deleting bill with items");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM bill_items WHERE bill_id = ?")
            .bind(bill_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM bills WHERE bill_id = ?")
            .bind(bill_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Marks a completed bill as voided, keeping it (and its items) for the
    /// record.
    pub async fn void_bill(&self, bill_id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE bills SET status = ? WHERE bill_id = ? AND status = ?")
            .bind(BillStatus::Voided)
            .bind(bill_id)
            .bind(BillStatus::Completed)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bill (completed)", bill_id));
        }

        Ok(())
    }

    /// Gets a bill by ID.
    pub async fn get_by_id(&self, bill_id: &str) -> DbResult<Option<Bill>> {
        let bill = sqlx::query_as::<_, Bill>(
            r#"
            SELECT bill_id, user_id, customer_name, customer_phone,
                   total_cents, total_items, status, created_at
            FROM bills
            WHERE bill_id = ?
            "#,
        )
        .bind(bill_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bill)
    }

    /// Lists a user's bills, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Bill>> {
        let bills = sqlx::query_as::<_, Bill>(
            r#"
            SELECT bill_id, user_id, customer_name, customer_phone,
                   total_cents, total_items, status, created_at
            FROM bills
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bills)
    }

    /// The user's most recent bills, newest first.
    pub async fn recent_for_user(&self, user_id: &str, limit: u32) -> DbResult<Vec<Bill>> {
        let bills = sqlx::query_as::<_, Bill>(
            r#"
            SELECT bill_id, user_id, customer_name, customer_phone,
                   total_cents, total_items, status, created_at
            FROM bills
            WHERE user_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(bills)
    }

    /// Gets all items for a bill.
    pub async fn get_items(&self, bill_id: &str) -> DbResult<Vec<BillItem>> {
        let items = sqlx::query_as::<_, BillItem>(
            r#"
            SELECT bill_item_id, bill_id, product_id, product_name,
                   unit_price_cents, quantity, total_cents
            FROM bill_items
            WHERE bill_id = ?
            "#,
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts a user's bills.
    pub async fn count(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Total sales in paise: Σ total over the user's bills, voided bills
    /// excluded.
    pub async fn total_sales(&self, user_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_cents), 0) FROM bills WHERE user_id = ? AND status != ?",
        )
        .bind(user_id)
        .bind(BillStatus::Voided)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

/// Generates a new bill ID.
pub fn generate_bill_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new bill item ID.
pub fn generate_bill_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, Utc};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// A bill whose created_at is `age_secs` seconds in the past, with one
    /// item per `(name, unit_price_cents, quantity)` entry.
    fn bill_with_items(
        bill_id: &str,
        user_id: &str,
        age_secs: i64,
        lines: &[(&str, i64, i64)],
    ) -> (Bill, Vec<BillItem>) {
        let items: Vec<BillItem> = lines
            .iter()
            .enumerate()
            .map(|(i, (name, price, qty))| BillItem {
                bill_item_id: format!("{bill_id}-item-{i}"),
                bill_id: bill_id.to_string(),
                product_id: format!("prod-{i}"),
                product_name: name.to_string(),
                unit_price_cents: *price,
                quantity: *qty,
                total_cents: price * qty,
            })
            .collect();

        let bill = Bill {
            bill_id: bill_id.to_string(),
            user_id: user_id.to_string(),
            customer_name: "Asha".to_string(),
            customer_phone: "9876543210".to_string(),
            total_cents: items.iter().map(|i| i.total_cents).sum(),
            total_items: items.iter().map(|i| i.quantity).sum(),
            status: BillStatus::Completed,
            created_at: Utc::now() - Duration::seconds(age_secs),
        };

        (bill, items)
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = test_db().await;
        let repo = db.bills();

        let (bill, items) = bill_with_items("b-1", "u-1", 0, &[("Sugar", 4500, 2), ("Salt", 2000, 1)]);
        repo.insert_bill_with_items(&bill, &items).await.unwrap();

        let found = repo.get_by_id("b-1").await.unwrap().unwrap();
        assert_eq!(found.total_cents, 4500 * 2 + 2000);
        assert_eq!(found.total_items, 3);
        assert_eq!(found.status, BillStatus::Completed);

        let found_items = repo.get_items("b-1").await.unwrap();
        assert_eq!(found_items.len(), 2);

        // Item totals sum to the bill total exactly
        let item_sum: i64 = found_items.iter().map(|i| i.total_cents).sum();
        assert_eq!(item_sum, found.total_cents);
    }

    #[tokio::test]
    async fn test_delete_leaves_no_orphaned_items() {
        let db = test_db().await;
        let repo = db.bills();

        let (bill, items) = bill_with_items("b-1", "u-1", 0, &[("Sugar", 4500, 2)]);
        repo.insert_bill_with_items(&bill, &items).await.unwrap();

        repo.delete_bill_with_items("b-1").await.unwrap();

        assert!(repo.get_by_id("b-1").await.unwrap().is_none());
        assert!(repo.get_items("b-1").await.unwrap().is_empty());

        // Deleting again is a no-op
        repo.delete_bill_with_items("b-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_is_reverse_chronological() {
        let db = test_db().await;
        let repo = db.bills();

        for (id, age) in [("b-old", 300), ("b-new", 0), ("b-mid", 120)] {
            let (bill, items) = bill_with_items(id, "u-1", age, &[("Sugar", 4500, 1)]);
            repo.insert_bill_with_items(&bill, &items).await.unwrap();
        }

        let ids: Vec<String> = repo
            .list_for_user("u-1")
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.bill_id)
            .collect();
        assert_eq!(ids, vec!["b-new", "b-mid", "b-old"]);

        let recent: Vec<String> = repo
            .recent_for_user("u-1", 2)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.bill_id)
            .collect();
        assert_eq!(recent, vec!["b-new", "b-mid"]);
    }

    #[tokio::test]
    async fn test_bills_scoped_by_user() {
        let db = test_db().await;
        let repo = db.bills();

        let (bill, items) = bill_with_items("b-1", "alice", 0, &[("Sugar", 4500, 1)]);
        repo.insert_bill_with_items(&bill, &items).await.unwrap();

        assert_eq!(repo.count("alice").await.unwrap(), 1);
        assert_eq!(repo.count("bob").await.unwrap(), 0);
        assert!(repo.list_for_user("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_void_keeps_items_and_drops_from_sales() {
        let db = test_db().await;
        let repo = db.bills();

        let (bill, items) = bill_with_items("b-1", "u-1", 60, &[("Sugar", 4500, 2)]);
        repo.insert_bill_with_items(&bill, &items).await.unwrap();
        let (bill2, items2) = bill_with_items("b-2", "u-1", 0, &[("Salt", 2000, 1)]);
        repo.insert_bill_with_items(&bill2, &items2).await.unwrap();

        assert_eq!(repo.total_sales("u-1").await.unwrap(), 9000 + 2000);

        repo.void_bill("b-1").await.unwrap();

        let voided = repo.get_by_id("b-1").await.unwrap().unwrap();
        assert_eq!(voided.status, BillStatus::Voided);
        assert_eq!(repo.get_items("b-1").await.unwrap().len(), 1);
        assert_eq!(repo.total_sales("u-1").await.unwrap(), 2000);

        // Voiding twice fails: the bill is no longer completed
        assert!(matches!(
            repo.void_bill("b-1").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
