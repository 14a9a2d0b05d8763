//! # Domain Types
//!
//! Core domain types used throughout Corner Shop.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  product_name   │       │
//! │  │  name (unique)  │   │  created_at     │──►│  quantity       │       │
//! │  │  category       │   │  items          │   │  unit_price     │       │
//! │  │  price_cents    │   │  total_cents    │   │  (snapshots)    │       │
//! │  │  stock_quantity │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │           │               ┌─────────────────┐                           │
//! │           └──────────────►│    SaleLine     │ validated request         │
//! │                           │ product + qty   │ before it is sold         │
//! │                           └─────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `SaleItem` copies the product name and unit price at the moment of
//! sale. It never references the product row, so later price changes do not
//! rewrite history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name. Unique, compared case-insensitively.
    pub name: String,

    /// Free-text category (e.g., "Fruits").
    pub category: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units currently available for sale.
    pub stock_quantity: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product with a fresh id.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        price: Money,
        stock_quantity: i64,
    ) -> Self {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            category: category.into(),
            price_cents: price.cents(),
            stock_quantity,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if `quantity` units can be sold from current stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock_quantity >= quantity
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// Quantity sold.
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
}

impl SaleItem {
    /// Snapshots a product into a line item.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        SaleItem {
            product_name: product.name.clone(),
            quantity,
            unit_price_cents: product.price_cents,
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line subtotal (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale transaction.
///
/// ## Invariant
/// `total_cents` equals the sum of `line_total()` over `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<SaleItem>,
    pub total_cents: i64,
}

impl Sale {
    /// Builds a sale from its items with a fresh id and the current time.
    /// The total is derived from the items.
    pub fn from_items(items: Vec<SaleItem>) -> Self {
        Sale::from_items_at(items, Utc::now())
    }

    /// Same as [`Sale::from_items`] with an explicit timestamp.
    pub fn from_items_at(items: Vec<SaleItem>, created_at: DateTime<Utc>) -> Self {
        let total = items.iter().map(SaleItem::line_total).sum::<Money>();
        Sale {
            id: Uuid::new_v4().to_string(),
            created_at,
            items,
            total_cents: total.cents(),
        }
    }

    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Checks the stored total against the line items.
    pub fn total_matches_items(&self) -> bool {
        self.items.iter().map(SaleItem::line_total).sum::<Money>() == self.total()
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// A validated (product, quantity) pair waiting to be sold.
///
/// The shell builds these after checking existence and stock; the sale
/// service turns each into a [`SaleItem`] while decrementing stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLine {
    pub product: Product,
    pub quantity: i64,
}

impl SaleLine {
    pub fn new(product: Product, quantity: i64) -> Self {
        SaleLine { product, quantity }
    }

    /// Line subtotal at the product's current price.
    pub fn subtotal(&self) -> Money {
        self.product.price().multiply_quantity(self.quantity)
    }

    /// Freezes this line into a sale item.
    pub fn to_item(&self) -> SaleItem {
        SaleItem::from_product(&self.product, self.quantity)
    }
}
