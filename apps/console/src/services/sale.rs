//! # Sale Service
//!
//! Records sales and cancels them, keeping stock in step.
//!
//! ## Transaction Boundaries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create_sale(lines)                                   │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    for line in lines (input order):                                    │
//! │      UPDATE stock - qty WHERE stock >= qty ──► 0 rows? ROLLBACK        │
//! │      snapshot SaleItem                            └─► InsufficientStock │
//! │    INSERT sale + items                                                 │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │                    cancel_sale(id)                                      │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    load sale ──► missing? ROLLBACK, false                               │
//! │    for item: UPDATE stock + qty                                        │
//! │    DELETE sale + items                                                 │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No partial sale ever survives: a failure anywhere between BEGIN and
//! COMMIT leaves stock and sales exactly as they were.

use tracing::{info, warn};

use crate::error::AppResult;
use cornershop_core::validation::validate_sale_lines;
use cornershop_core::{CoreError, Sale, SaleLine};
use cornershop_db::{Database, DbError, ProductRepository, SaleRepository};

#[derive(Debug, Clone)]
pub struct SaleService {
    db: Database,
}

impl SaleService {
    pub fn new(db: Database) -> Self {
        SaleService { db }
    }

    /// Records a sale and decrements stock for each line.
    ///
    /// Lines are expected to be pre-checked by the caller; stock is checked
    /// again, atomically, as each line is decremented.
    ///
    /// ## Returns
    /// The new sale's ID.
    ///
    /// ## Errors
    /// * `ValidationError` - No lines, or a non-positive quantity
    /// * `InsufficientStock` - Stock changed since the lines were checked
    pub async fn create_sale(&self, lines: &[SaleLine]) -> AppResult<String> {
        validate_sale_lines(lines)?;

        let mut tx = self.db.begin().await?;
        let mut items = Vec::with_capacity(lines.len());

        for line in lines {
            let name = &line.product.name;
            let decremented =
                ProductRepository::try_decrement_stock_in(&mut tx, name, line.quantity).await?;

            if !decremented {
                tx.rollback().await.map_err(DbError::transaction)?;

                let available = self
                    .db
                    .products()
                    .get_by_name(name)
                    .await?
                    .map(|p| p.stock_quantity)
                    .unwrap_or(0);

                warn!(product = %name, available, requested = line.quantity, "Sale rolled back");
                return Err(CoreError::InsufficientStock {
                    product: name.clone(),
                    available,
                    requested: line.quantity,
                }
                .into());
            }

            items.push(line.to_item());
        }

        let sale = Sale::from_items(items);
        SaleRepository::insert_in(&mut tx, &sale).await?;
        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            id = %sale.id,
            items = sale.items.len(),
            total = %sale.total(),
            "Sale created"
        );

        Ok(sale.id)
    }

    /// Up to `limit` sales, newest first.
    pub async fn get_recent_sales(&self, limit: u32) -> AppResult<Vec<Sale>> {
        Ok(self.db.sales().recent(limit).await?)
    }

    pub async fn get_sale(&self, id: &str) -> AppResult<Option<Sale>> {
        Ok(self.db.sales().get_by_id(id).await?)
    }

    /// Cancels a sale: restores stock for every item, then deletes it.
    ///
    /// ## Returns
    /// * `true` - Sale existed and was removed, stock restored
    /// * `false` - No sale with that ID (nothing changed)
    pub async fn cancel_sale(&self, id: &str) -> AppResult<bool> {
        let mut tx = self.db.begin().await?;

        let Some(sale) = SaleRepository::get_by_id_in(&mut tx, id).await? else {
            tx.rollback().await.map_err(DbError::transaction)?;
            return Ok(false);
        };

        for item in &sale.items {
            let restored =
                ProductRepository::adjust_stock_in(&mut tx, &item.product_name, item.quantity)
                    .await?;
            if !restored {
                warn!(
                    sale = %sale.id,
                    product = %item.product_name,
                    "Product no longer exists, stock not restored"
                );
            }
        }

        let deleted = SaleRepository::delete_in(&mut tx, &sale.id).await?;
        tx.commit().await.map_err(DbError::transaction)?;

        info!(id = %sale.id, total = %sale.total(), "Sale cancelled");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::ProductService;
    use cornershop_core::DEFAULT_RECENT_SALES_LIMIT;
    use cornershop_db::{seed, DbConfig};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed::seed_if_empty(&db).await.unwrap();
        db
    }

    async fn services() -> (ProductService, SaleService) {
        let db = seeded().await;
        (ProductService::new(db.clone()), SaleService::new(db))
    }

    async fn stock(products: &ProductService, name: &str) -> i64 {
        products.get_by_name(name).await.unwrap().unwrap().stock_quantity
    }

    #[tokio::test]
    async fn test_create_sale_totals_and_decrements() {
        let (products, sales) = services().await;

        let lines = vec![
            products.check_sale_line("Laptop", 2).await.unwrap(),
            products.check_sale_line("Apple", 3).await.unwrap(),
        ];
        let id = sales.create_sale(&lines).await.unwrap();

        let sale = sales.get_sale(&id).await.unwrap().unwrap();
        assert_eq!(sale.total().to_string(), "$2005.95");
        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.items[0].product_name, "Laptop");
        assert_eq!(sale.items[1].unit_price_cents, 199);

        assert_eq!(stock(&products, "Laptop").await, 8);
        assert_eq!(stock(&products, "Apple").await, 97);
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_and_removes_sale() {
        let (products, sales) = services().await;

        let lines = vec![
            products.check_sale_line("Laptop", 2).await.unwrap(),
            products.check_sale_line("Apple", 3).await.unwrap(),
        ];
        let id = sales.create_sale(&lines).await.unwrap();

        assert!(sales.cancel_sale(&id).await.unwrap());
        assert!(sales.get_sale(&id).await.unwrap().is_none());
        assert_eq!(stock(&products, "Laptop").await, 10);
        assert_eq!(stock(&products, "Apple").await, 100);

        assert!(!sales.cancel_sale(&id).await.unwrap());
        assert_eq!(stock(&products, "Laptop").await, 10);
    }

    #[tokio::test]
    async fn test_recent_sales_newest_first() {
        let (products, sales) = services().await;

        let mut ids = Vec::new();
        for name in ["Apple", "Banana", "Orange"] {
            let line = products.check_sale_line(name, 1).await.unwrap();
            ids.push(sales.create_sale(&[line]).await.unwrap());
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let recent: Vec<String> = sales
            .get_recent_sales(2)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(recent, vec![ids[2].clone(), ids[1].clone()]);

        let all = sales.get_recent_sales(DEFAULT_RECENT_SALES_LIMIT).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_line_rolls_back_whole_sale() {
        let (products, sales) = services().await;

        let apple = products.check_sale_line("Apple", 5).await.unwrap();
        let chair = products.check_sale_line("Desk Chair", 8).await.unwrap();

        // Someone else sells a chair after the lines were checked
        assert!(products.adjust_stock("Desk Chair", -1).await.unwrap());

        let err = sales.create_sale(&[apple, chair]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("available 7"));

        assert_eq!(stock(&products, "Apple").await, 100);
        assert_eq!(stock(&products, "Desk Chair").await, 7);
        assert!(sales.get_recent_sales(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_over_stock_rejected_before_any_mutation() {
        let (products, sales) = services().await;

        let laptop = products.get_by_name("Laptop").await.unwrap().unwrap();
        let err = sales
            .create_sale(&[SaleLine::new(laptop, 11)])
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(stock(&products, "Laptop").await, 10);
    }

    #[tokio::test]
    async fn test_empty_sale_rejected() {
        let (_, sales) = services().await;

        let err = sales.create_sale(&[]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_sale_above_a_thousand_units_when_stock_allows() {
        let (products, sales) = services().await;
        assert!(products.adjust_stock("Apple", 1100).await.unwrap());

        assert!(products.validate_stock_availability("Apple", 1000).await.unwrap());
        let line = products.check_sale_line("Apple", 1000).await.unwrap();

        let id = sales.create_sale(&[line]).await.unwrap();
        let sale = sales.get_sale(&id).await.unwrap().unwrap();
        assert_eq!(sale.items[0].quantity, 1000);
        assert_eq!(sale.total().to_string(), "$1990.00");
        assert_eq!(stock(&products, "Apple").await, 200);
    }

    #[tokio::test]
    async fn test_cancel_skips_products_that_were_removed() {
        let db = seeded().await;
        let products = ProductService::new(db.clone());
        let sales = SaleService::new(db.clone());

        let lines = vec![
            products.check_sale_line("Laptop", 2).await.unwrap(),
            products.check_sale_line("Apple", 3).await.unwrap(),
        ];
        let id = sales.create_sale(&lines).await.unwrap();

        sqlx::query("DELETE FROM products WHERE name = 'Apple'")
            .execute(db.pool())
            .await
            .unwrap();

        assert!(sales.cancel_sale(&id).await.unwrap());
        assert!(sales.get_sale(&id).await.unwrap().is_none());
        assert_eq!(stock(&products, "Laptop").await, 10);
        assert!(products.get_by_name("Apple").await.unwrap().is_none());
    }
}
