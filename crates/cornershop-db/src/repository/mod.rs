//! # Repository Module
//!
//! The two stores behind Corner Shop.
//!
//! ## Store Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stores and Their Callers                             │
//! │                                                                         │
//! │  ProductService                 SaleService                            │
//! │       │                            │                                    │
//! │       │  db.products()             │  db.begin() ... tx.commit()        │
//! │       ▼                            ▼                                    │
//! │  ProductRepository  ◄───────  try_decrement_stock_in(&mut tx, ..)      │
//! │  ├── search / get_by_name          adjust_stock_in(&mut tx, ..)        │
//! │  ├── list_all / count                                                  │
//! │  └── adjust_stock / try_decrement_stock                                │
//! │                                                                         │
//! │  SaleRepository                                                        │
//! │  ├── insert / insert_in                                                │
//! │  ├── get_by_id / recent                                                │
//! │  └── delete / delete_in                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Product lookup, search and stock changes
//! - [`SaleRepository`] - Sale and sale item persistence

pub mod product;
pub mod sale;

pub use product::ProductRepository;
pub use sale::SaleRepository;
