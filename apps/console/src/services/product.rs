//! # Product Service
//!
//! Lookup and stock checks over the product store.
//!
//! The shell asks this service two questions before accepting a sale line:
//! does the product exist, and is there enough stock. Both are plain reads;
//! nothing here decrements stock.

use tracing::debug;

use crate::error::{AppError, AppResult};
use cornershop_core::validation::validate_quantity;
use cornershop_core::{CoreError, Product, SaleLine};
use cornershop_db::Database;

#[derive(Debug, Clone)]
pub struct ProductService {
    db: Database,
}

impl ProductService {
    pub fn new(db: Database) -> Self {
        ProductService { db }
    }

    /// Case-insensitive substring search; an empty term lists everything and
    /// a term that matches nothing gives an empty list.
    pub async fn search(&self, term: &str) -> AppResult<Vec<Product>> {
        Ok(self.db.products().search(term).await?)
    }

    /// Case-insensitive exact-name lookup.
    pub async fn get_by_name(&self, name: &str) -> AppResult<Option<Product>> {
        Ok(self.db.products().get_by_name(name).await?)
    }

    pub async fn list_all(&self) -> AppResult<Vec<Product>> {
        Ok(self.db.products().list_all().await?)
    }

    /// Adds `delta` to a product's stock. Returns whether the product existed.
    pub async fn adjust_stock(&self, name: &str, delta: i64) -> AppResult<bool> {
        Ok(self.db.products().adjust_stock(name, delta).await?)
    }

    pub async fn validate_exists(&self, name: &str) -> AppResult<bool> {
        Ok(self.get_by_name(name).await?.is_some())
    }

    /// True iff the product exists and has at least `quantity` in stock.
    pub async fn validate_stock_availability(&self, name: &str, quantity: i64) -> AppResult<bool> {
        Ok(self
            .get_by_name(name)
            .await?
            .map(|product| product.stock_quantity >= quantity)
            .unwrap_or(false))
    }

    /// Resolves `name` and checks `quantity` against current stock.
    ///
    /// ## Returns
    /// * `Ok(SaleLine)` - Ready to hand to sale creation
    /// * `Err(NotFound)` - No such product
    /// * `Err(ValidationError)` - Quantity not positive
    /// * `Err(InsufficientStock)` - Stock below `quantity`
    pub async fn check_sale_line(&self, name: &str, quantity: i64) -> AppResult<SaleLine> {
        let product = self
            .get_by_name(name)
            .await?
            .ok_or_else(|| AppError::from(CoreError::ProductNotFound(name.trim().to_string())))?;

        validate_quantity(quantity)?;

        if !product.can_sell(quantity) {
            debug!(
                name = %product.name,
                available = product.stock_quantity,
                requested = quantity,
                "Sale line rejected"
            );
            return Err(CoreError::InsufficientStock {
                product: product.name,
                available: product.stock_quantity,
                requested: quantity,
            }
            .into());
        }

        Ok(SaleLine::new(product, quantity))
    }
}
