//! # cornershop-core: Pure Business Logic for Corner Shop
//!
//! Domain types, money arithmetic and validation rules for the Corner Shop
//! point-of-sale tool. Nothing in this crate touches the database or the
//! console.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Corner Shop Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Interactive Shell (console)                     │   │
//! │  │    Search ──► Register Sale ──► Cancel Sale ──► Check Stock     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ProductService / SaleService                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ cornershop-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │   money   │  │ validation│                  │   │
//! │  │   │  Product  │  │   Money   │  │   rules   │                  │   │
//! │  │   │   Sale    │  │           │  │  checks   │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               cornershop-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleItem, SaleLine)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use cornershop_core::money::Money;
//!
//! let laptop = Money::from_cents(99_999);
//! let apple = Money::from_cents(199);
//!
//! let total = laptop.multiply_quantity(2) + apple.multiply_quantity(3);
//! assert_eq!(total.to_string(), "$2005.95");
//! ```

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of sales shown by the recent-sales listing when no limit is given.
pub const DEFAULT_RECENT_SALES_LIMIT: u32 = 10;
