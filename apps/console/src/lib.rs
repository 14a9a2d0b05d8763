//! # Corner Shop Console
//!
//! Services, configuration and the interactive shell for the `cornershop`
//! binary.
//!
//! ## Module Organization
//! ```text
//! cornershop_console/
//! ├── lib.rs          ◄─── You are here (startup & wiring)
//! ├── config.rs       ◄─── ShopConfig: flags, env, TOML, defaults
//! ├── error.rs        ◄─── AppError for service calls
//! ├── services/
//! │   ├── product.rs  ◄─── Search, lookup, stock checks
//! │   └── sale.rs     ◄─── Create / list / cancel sales
//! └── shell.rs        ◄─── Numbered menu loop
//! ```

pub mod config;
pub mod error;
pub mod services;
pub mod shell;

use std::io;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::ShopConfig;
use cornershop_db::{seed, Database, DbConfig};
use services::{ProductService, SaleService};
use shell::Shell;

/// Runs the console application.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Determine Database Path ──────────────────────────────────────────► │
/// │     • --db / CORNERSHOP_DB_PATH / config file / platform data dir       │
/// │                                                                         │
/// │  2. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode, pending migrations applied                  │
/// │     • Failure here aborts before the menu                               │
/// │                                                                         │
/// │  3. Seed ─────────────────────────────────────────────────────────────► │
/// │     • Default catalog if the product table is empty                     │
/// │                                                                         │
/// │  4. Wire Services & Run Shell ────────────────────────────────────────► │
/// │     • One Database handle shared by both services                       │
/// │     • stdin / stdout                                                    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(config: ShopConfig) -> anyhow::Result<()> {
    let db_path = config.resolve_database_path()?;
    info!(path = %db_path.display(), "Database path determined");

    let db = Database::new(DbConfig::new(db_path.clone()))
        .await
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    if config.seed_on_first_run {
        seed::seed_if_empty(&db)
            .await
            .context("Failed to seed the default catalog")?;
    }

    let products = ProductService::new(db.clone());
    let sales = SaleService::new(db.clone());

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut shell = Shell::new(products, sales, &config, stdin.lock(), stdout.lock());
    shell.run().await.context("Terminal I/O failed")?;

    db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so they never interleave with the menu on stdout.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show queries and rejected sale lines
/// - `RUST_LOG=cornershop_db=debug` - Database layer only
/// - Default: warnings only
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,sqlx=warn"));

    // A subscriber may already be installed (tests); keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
