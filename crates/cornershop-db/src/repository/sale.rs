//! # Sale Repository
//!
//! Persistence for completed sales and their line items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. RECORD (inside the sale transaction)                               │
//! │     └── insert_in() → sales row + one sale_items row per line          │
//! │                                                                         │
//! │  2. BROWSE                                                             │
//! │     └── recent(limit) → newest first                                   │
//! │     └── get_by_id()   → items in entry order                           │
//! │                                                                         │
//! │  3. (OPTIONAL) CANCEL (inside the cancel transaction)                  │
//! │     └── delete_in() → sale and its items removed                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales are immutable once recorded: there is no update path.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use cornershop_core::{Sale, SaleItem};

/// Header row of a sale, before its items are attached.
#[derive(Debug, FromRow)]
struct SaleRow {
    id: String,
    created_at: DateTime<Utc>,
    total_cents: i64,
}

impl SaleRow {
    fn into_sale(self, items: Vec<SaleItem>) -> Sale {
        let sale = Sale {
            id: self.id,
            created_at: self.created_at,
            items,
            total_cents: self.total_cents,
        };
        if !sale.total_matches_items() {
            warn!(id = %sale.id, total_cents = sale.total_cents, "Stored total differs from its items");
        }
        sale
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale with all of its items.
    pub async fn insert(&self, sale: &Sale) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_in(&mut conn, sale).await
    }

    /// Inserts a sale with all of its items on a caller-supplied connection.
    ///
    /// Items keep their position through `line_no`, so reads return them in
    /// the order they were entered. Re-inserting a stored id fails with
    /// `DbError::UniqueViolation` naming that id.
    pub async fn insert_in(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, items = sale.items.len(), "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (id, created_at, total_cents)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.created_at)
        .bind(sale.total_cents)
        .execute(&mut *conn)
        .await
        .map_err(|e| DbError::on_insert(e, "id", &sale.id))?;

        for (line_no, item) in sale.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (sale_id, line_no, product_name, quantity, unit_price_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&sale.id)
            .bind(line_no as i64)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Gets a sale by ID, items included.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_in(&mut conn, id).await
    }

    /// [`Self::get_by_id`] on a caller-supplied connection or transaction.
    pub async fn get_by_id_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, created_at, total_cents
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => {
                let items = Self::items_in(conn, &row.id).await?;
                Ok(Some(row.into_sale(items)))
            }
            None => Ok(None),
        }
    }

    /// Returns up to `limit` sales, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, created_at, total_cents
            FROM sales
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&mut *conn)
        .await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            let items = Self::items_in(&mut conn, &row.id).await?;
            sales.push(row.into_sale(items));
        }

        debug!(count = sales.len(), limit = limit, "Loaded recent sales");
        Ok(sales)
    }

    /// Counts recorded sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Deletes a sale and its items.
    ///
    /// ## Returns
    /// `true` if a sale with that ID existed.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Self::delete_in(&mut conn, id).await
    }

    /// [`Self::delete`] on a caller-supplied connection or transaction.
    pub async fn delete_in(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting sale");

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn items_in(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT product_name, quantity, unit_price_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(sale_id)
        .fetch_all(conn)
        .await?;

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::ProductRepository;
    use chrono::{Duration, TimeZone};
    use cornershop_core::{Money, Product};

    fn item(name: &str, quantity: i64, unit_price_cents: i64) -> SaleItem {
        SaleItem {
            product_name: name.to_string(),
            quantity,
            unit_price_cents,
        }
    }

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
    }

    #[tokio::test]
    async fn test_insert_and_get_preserves_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        let sale = Sale::from_items(vec![
            item("Laptop", 1, 99_999),
            item("Apple", 3, 199),
            item("Banana", 2, 99),
        ]);
        repo.insert(&sale).await.unwrap();

        let loaded = repo.get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.items, sale.items);
        assert_eq!(loaded.total_cents, 100_794);
        assert!(loaded.total_matches_items());
        assert_eq!(loaded.created_at, sale.created_at);
    }

    #[tokio::test]
    async fn test_get_missing_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.sales().get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        for minute in [5, 1, 12, 3] {
            let sale = Sale::from_items_at(vec![item("Apple", minute, 199)], at(minute));
            repo.insert(&sale).await.unwrap();
        }

        let recent = repo.recent(3).await.unwrap();
        let minutes: Vec<i64> = recent.iter().map(|s| s.items[0].quantity).collect();
        assert_eq!(minutes, vec![12, 5, 3]);

        assert_eq!(repo.recent(10).await.unwrap().len(), 4);
        assert!(repo.recent(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_sale_and_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        let sale = Sale::from_items(vec![item("Apple", 2, 199)]);
        repo.insert(&sale).await.unwrap();

        assert!(repo.delete(&sale.id).await.unwrap());
        assert!(repo.get_by_id(&sale.id).await.unwrap().is_none());
        assert!(!repo.delete(&sale.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_rolled_back_insert_leaves_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let sale = Sale::from_items(vec![item("Apple", 2, 199)]);
        {
            let mut tx = db.begin().await.unwrap();
            SaleRepository::insert_in(&mut tx, &sale).await.unwrap();
        }

        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_sale_id_names_the_id() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        let sale = Sale::from_items(vec![item("Apple", 1, 199)]);
        repo.insert(&sale).await.unwrap();

        let err = repo.insert(&sale).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::UniqueViolation { ref field, ref value } if field == "id" && *value == sale.id
        ));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_uncommitted_cancellation_changes_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .insert(&Product::new("Apple", "Fruits", Money::from_cents(199), 97))
            .await
            .unwrap();
        let sale = Sale::from_items(vec![item("Apple", 3, 199)]);
        db.sales().insert(&sale).await.unwrap();

        {
            let mut tx = db.begin().await.unwrap();
            assert!(ProductRepository::adjust_stock_in(&mut tx, "Apple", 3)
                .await
                .unwrap());
            assert!(SaleRepository::delete_in(&mut tx, &sale.id).await.unwrap());
            // Both changes are visible inside the transaction
            assert!(SaleRepository::get_by_id_in(&mut tx, &sale.id)
                .await
                .unwrap()
                .is_none());
            // Dropped without commit
        }

        let apple = db.products().get_by_name("Apple").await.unwrap().unwrap();
        assert_eq!(apple.stock_quantity, 97);

        let kept = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(kept.items, sale.items);
    }
}
