//! # Product Repository
//!
//! The product store: lookups, search, and stock mutations.
//!
//! ## Name Matching
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Product Names Match                              │
//! │                                                                         │
//! │  search("App")         name.to_lowercase().contains("app")             │
//! │       │                                                                 │
//! │       ├── Apple       ← MATCH                                          │
//! │       ├── Pineapple   ← MATCH                                          │
//! │       └── Banana                                                       │
//! │                                                                         │
//! │  get_by_name("laptop") name = 'laptop' COLLATE NOCASE                  │
//! │       │                                                                 │
//! │       └── Laptop      ← MATCH   ("Lap" would not match)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Search folds case in Rust with full Unicode rules, so `éclair` finds
//! `Éclair`. Name identity (lookup, the unique index, stock updates) stays
//! in SQLite and uses `NOCASE`, which only folds ASCII letters: `Éclair` and
//! `éclair` are two different names there.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ Read-then-write (races with other writers)                     │
//! │     SELECT stock ... ; UPDATE products SET stock_quantity = 7      │
//! │                                                                     │
//! │  ✅ Sale: conditional delta, one statement                         │
//! │     UPDATE products SET stock_quantity = stock_quantity - 3        │
//! │     WHERE name = ? AND stock_quantity >= 3                         │
//! │                                                                     │
//! │  ✅ Cancellation: plain delta                                      │
//! │     UPDATE products SET stock_quantity = stock_quantity + 3        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Mutations come in two forms: methods on the repository that take a pooled
//! connection, and `*_in` associated functions that run on a caller-supplied
//! connection so they can share a transaction with sale writes.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use cornershop_core::validation::validate_product;
use cornershop_core::Product;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let fruit = repo.search("app").await?;
/// let laptop = repo.get_by_name("laptop").await?;
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

    /// Case-insensitive substring search over product names.
    ///
    /// An empty (or blank) term returns every product. A term nothing
    /// contains, however long, returns an empty list.
    /// Results are ordered by name.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Product>> {
        let term = term.trim();

        debug!(term = %term, "Searching products");

        let all = self.list_all().await?;
        if term.is_empty() {
            return Ok(all);
        }

        // SQLite's lower() and NOCASE only fold ASCII
        let needle = term.to_lowercase();
        let products: Vec<Product> = all
            .into_iter()
            .filter(|product| product.name.to_lowercase().contains(&needle))
            .collect();

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Gets a product by exact name, ignoring ASCII case.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - No product with that name
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, price_cents, stock_quantity, created_at, updated_at
            FROM products
            WHERE name = ?1 COLLATE NOCASE
            "#,
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Returns every product, ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, price_cents, stock_quantity, created_at, updated_at
            FROM products
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The inserted product
    /// * `Err(DbError::InvalidRecord)` - Empty name or category, negative
    ///   price or stock; nothing is written
    /// * `Err(DbError::UniqueViolation)` - Name already exists (ASCII case ignored)
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        validate_product(product)?;

        debug!(name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, price_cents, stock_quantity, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::on_insert(e, "name", &product.name))?;

        Ok(product.clone())
    }

    /// Counts products (used to decide whether to seed).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Adds `delta` to a product's stock.
    ///
    /// No floor is enforced here: a negative delta larger than the stock
    /// drives it below zero. Sales go through [`Self::try_decrement_stock`];
    /// this is the restoration path.
    ///
    /// ## Returns
    /// `true` if a product with that name was updated.
    pub async fn adjust_stock(&self, name: &str, delta: i64) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Self::adjust_stock_in(&mut conn, name, delta).await
    }

    /// [`Self::adjust_stock`] on a caller-supplied connection or transaction.
    pub async fn adjust_stock_in(
        conn: &mut SqliteConnection,
        name: &str,
        delta: i64,
    ) -> DbResult<bool> {
        debug!(name = %name, delta = %delta, "Adjusting stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                stock_quantity = stock_quantity + ?2,
                updated_at = ?3
            WHERE name = ?1 COLLATE NOCASE
            "#,
        )
        .bind(name)
        .bind(delta)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes `quantity` units only if at least that many are in stock.
    ///
    /// ## Returns
    /// * `true` - Stock was decremented
    /// * `false` - Product missing, or stock below `quantity` (nothing changed)
    pub async fn try_decrement_stock(&self, name: &str, quantity: i64) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Self::try_decrement_stock_in(&mut conn, name, quantity).await
    }

    /// [`Self::try_decrement_stock`] on a caller-supplied connection or transaction.
    pub async fn try_decrement_stock_in(
        conn: &mut SqliteConnection,
        name: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(name = %name, quantity = %quantity, "Decrementing stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                stock_quantity = stock_quantity - ?2,
                updated_at = ?3
            WHERE name = ?1 COLLATE NOCASE
              AND stock_quantity >= ?2
            "#,
        )
        .bind(name)
        .bind(quantity)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        let decremented = result.rows_affected() > 0;
        if !decremented {
            warn!(name = %name, quantity = %quantity, "Conditional stock decrement rejected");
        }

        Ok(decremented)
    }
}
