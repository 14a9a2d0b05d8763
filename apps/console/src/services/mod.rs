//! # Services
//!
//! Business operations the shell calls. Each service owns a clone of the
//! same [`Database`](cornershop_db::Database) handle, injected at startup.
//!
//! - [`ProductService`] - Search, lookup and stock checks
//! - [`SaleService`] - Sale creation, listing and cancellation

pub mod product;
pub mod sale;

pub use product::ProductService;
pub use sale::SaleService;
