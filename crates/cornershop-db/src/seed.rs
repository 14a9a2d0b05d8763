//! # First-Run Catalog
//!
//! A fresh database starts with a small demonstration catalog so the shell
//! has something to sell. Seeding only happens when the product table is
//! empty; an existing catalog is never touched.

use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use cornershop_core::{Money, Product};

/// `(name, category, price in cents, initial stock)`
pub const DEFAULT_CATALOG: &[(&str, &str, i64, i64)] = &[
    ("Laptop", "Electronics", 99_999, 10),
    ("Smartphone", "Electronics", 49_999, 20),
    ("Headphones", "Electronics", 7_999, 50),
    ("Coffee Maker", "Appliances", 4_999, 15),
    ("Desk Chair", "Furniture", 12_999, 8),
    ("Apple", "Fruits", 199, 100),
    ("Banana", "Fruits", 99, 100),
    ("Orange", "Fruits", 99, 100),
    ("Pineapple", "Fruits", 199, 100),
];

/// Builds the default catalog as products with fresh ids.
pub fn default_products() -> Vec<Product> {
    DEFAULT_CATALOG
        .iter()
        .map(|&(name, category, cents, stock)| {
            Product::new(name, category, Money::from_cents(cents), stock)
        })
        .collect()
}

/// Inserts the default catalog if there are no products yet.
///
/// ## Returns
/// Number of products inserted (0 when the catalog already existed).
pub async fn seed_if_empty(db: &Database) -> DbResult<usize> {
    let repo = db.products();

    if repo.count().await? > 0 {
        return Ok(0);
    }

    let products = default_products();
    for product in &products {
        repo.insert(product).await?;
    }

    info!(count = products.len(), "Seeded default catalog");
    Ok(products.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;

    #[tokio::test]
    async fn test_seed_populates_empty_database_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert_eq!(seed_if_empty(&db).await.unwrap(), DEFAULT_CATALOG.len());
        assert_eq!(seed_if_empty(&db).await.unwrap(), 0);
        assert_eq!(db.products().count().await.unwrap(), 9);

        let chair = db.products().get_by_name("desk chair").await.unwrap().unwrap();
        assert_eq!(chair.price_cents, 12_999);
        assert_eq!(chair.stock_quantity, 8);
    }

    #[tokio::test]
    async fn test_seed_skips_existing_catalog() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .insert(&Product::new("Kiwi", "Fruits", Money::from_cents(50), 3))
            .await
            .unwrap();

        assert_eq!(seed_if_empty(&db).await.unwrap(), 0);
        assert_eq!(db.products().count().await.unwrap(), 1);
    }
}
