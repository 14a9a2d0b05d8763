//! Corner Shop - point-of-sale console.
//!
//! ```bash
//! # Default database in the platform data directory
//! cornershop
//!
//! # Explicit database file, no demo catalog
//! cornershop --db ./shop.db --no-seed
//!
//! # Settings from a TOML file
//! cornershop --config ./cornershop.toml
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cornershop_console::config::{CliOverrides, ShopConfig, CONFIG_PATH_ENV};

/// Corner Shop - track products, register and cancel sales
#[derive(Parser)]
#[command(name = "cornershop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database file (overrides CORNERSHOP_DB_PATH and the config file)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, value_name = "PATH", env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// Do not insert the demo catalog into an empty database
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    cornershop_console::init_tracing();

    let cli = Cli::parse();

    let overrides = CliOverrides {
        database_path: cli.db,
        no_seed: cli.no_seed,
    };
    let config = ShopConfig::load(cli.config.as_deref(), &overrides)
        .context("Invalid configuration")?;

    cornershop_console::run(config).await
}
