//! # cornershop-db: Database Layer for Corner Shop
//!
//! SQLite storage for products and sales, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Corner Shop Data Flow                              │
//! │                                                                         │
//! │  Shell menu option ("Register Sale")                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleService::create_sale                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   cornershop-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ ProductRepo   │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ SaleRepo      │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  cornershop.db (platform data directory, or --db)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product and sale stores
//! - [`seed`] - Default catalog for a fresh database
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cornershop_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("cornershop.db")).await?;
//! cornershop_db::seed::seed_if_empty(&db).await?;
//!
//! let fruit = db.products().search("app").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
