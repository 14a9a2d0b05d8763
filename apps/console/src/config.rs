//! # Shop Configuration
//!
//! Settings loaded once at startup and read-only afterwards.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line flags (`--db`, `--no-seed`)
//! 2. Environment variables (`CORNERSHOP_*`)
//! 3. Config file (`--config` / `CORNERSHOP_CONFIG`, TOML)
//! 4. Defaults (this file)
//!
//! ## Example File
//! ```toml
//! store_name = "Main Street Corner Shop"
//! database_path = "/var/lib/cornershop/shop.db"
//! recent_sales_limit = 20
//! seed_on_first_run = false
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Overrides the database path.
pub const DB_PATH_ENV: &str = "CORNERSHOP_DB_PATH";

/// Points at a TOML config file (read by the command-line parser).
pub const CONFIG_PATH_ENV: &str = "CORNERSHOP_CONFIG";

/// Overrides the store name shown in the menu header.
pub const STORE_NAME_ENV: &str = "CORNERSHOP_STORE_NAME";

/// Overrides how many sales the cancel screen lists.
pub const RECENT_SALES_ENV: &str = "CORNERSHOP_RECENT_SALES";

const DATABASE_FILE_NAME: &str = "cornershop.db";

/// Upper bound for the recent-sales listing.
const MAX_RECENT_SALES: u32 = 100;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShopConfig {
    /// SQLite database file.
    /// Default: `cornershop.db` in the platform data directory
    pub database_path: Option<PathBuf>,

    /// Shown in the menu header.
    /// Default: "Corner Shop"
    pub store_name: String,

    /// Number of sales listed by "Cancel Sale".
    /// Default: 10
    pub recent_sales_limit: u32,

    /// Insert the demonstration catalog into an empty database.
    /// Default: true
    pub seed_on_first_run: bool,
}

impl Default for ShopConfig {
    fn default() -> Self {
        ShopConfig {
            database_path: None,
            store_name: "Corner Shop".to_string(),
            recent_sales_limit: cornershop_core::DEFAULT_RECENT_SALES_LIMIT,
            seed_on_first_run: true,
        }
    }
}

/// Values taken from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database_path: Option<PathBuf>,
    pub no_seed: bool,
}

impl ShopConfig {
    /// Resolves the configuration from every source.
    ///
    /// ## Arguments
    /// * `config_file` - Optional TOML file
    /// * `cli` - Flags given on the command line
    pub fn load(config_file: Option<&Path>, cli: &CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match config_file {
            Some(path) => ShopConfig::from_file(path)?,
            None => ShopConfig::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_cli(cli);
        config.validate()?;

        debug!(?config, "Configuration resolved");
        Ok(config)
    }

    /// Reads a TOML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        ShopConfig::from_toml_str(&content)
    }

    /// Parses TOML config text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Applies environment overrides.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a closure over a
    /// fixed map instead of mutating the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DB_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(name) = lookup(STORE_NAME_ENV) {
            self.store_name = name;
        }

        if let Some(limit) = lookup(RECENT_SALES_ENV) {
            self.recent_sales_limit = limit
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(RECENT_SALES_ENV.to_string()))?;
        }

        Ok(())
    }

    /// Applies command-line flags (highest priority).
    pub fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(path) = &cli.database_path {
            self.database_path = Some(path.clone());
        }
        if cli.no_seed {
            self.seed_on_first_run = false;
        }
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue("store_name".to_string()));
        }

        if self.recent_sales_limit == 0 || self.recent_sales_limit > MAX_RECENT_SALES {
            return Err(ConfigError::InvalidValue("recent_sales_limit".to_string()));
        }

        Ok(())
    }

    /// Returns the database file to open.
    ///
    /// ## Platform-Specific Defaults
    /// - **macOS**: `~/Library/Application Support/com.cornershop.pos/cornershop.db`
    /// - **Windows**: `%APPDATA%\cornershop\pos\data\cornershop.db`
    /// - **Linux**: `~/.local/share/pos/cornershop.db`
    ///
    /// The default directory is created if it doesn't exist.
    pub fn resolve_database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let dirs = ProjectDirs::from("com", "cornershop", "pos").ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();

        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::CreateDir {
            path: data_dir.to_path_buf(),
            source,
        })?;

        Ok(data_dir.join(DATABASE_FILE_NAME))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Could not determine a data directory for the database")]
    NoDataDir,

    #[error("Failed to create data directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ShopConfig::default();
        assert_eq!(config.store_name, "Corner Shop");
        assert_eq!(config.recent_sales_limit, 10);
        assert!(config.seed_on_first_run);
        assert!(config.database_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ShopConfig::from_toml_str("store_name = \"Main Street\"").unwrap();
        assert_eq!(config.store_name, "Main Street");
        assert_eq!(config.recent_sales_limit, 10);
    }

    #[test]
    fn test_unknown_toml_key_rejected() {
        let err = ShopConfig::from_toml_str("tax_rate = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let mut config = ShopConfig::from_toml_str(
            r#"
            database_path = "/from/file.db"
            store_name = "File Shop"
            recent_sales_limit = 5
            "#,
        )
        .unwrap();

        config
            .apply_env(env_of(&[
                (DB_PATH_ENV, "/from/env.db"),
                (RECENT_SALES_ENV, "7"),
            ]))
            .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("/from/env.db")));
        assert_eq!(config.store_name, "File Shop");
        assert_eq!(config.recent_sales_limit, 7);

        config.apply_cli(&CliOverrides {
            database_path: Some(PathBuf::from("/from/flag.db")),
            no_seed: true,
        });

        assert_eq!(config.database_path, Some(PathBuf::from("/from/flag.db")));
        assert!(!config.seed_on_first_run);
        assert_eq!(
            config.resolve_database_path().unwrap(),
            PathBuf::from("/from/flag.db")
        );
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = ShopConfig::default();
        let err = config
            .apply_env(env_of(&[(RECENT_SALES_ENV, "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == RECENT_SALES_ENV));
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = ShopConfig::default();
        config.recent_sales_limit = 0;
        assert!(config.validate().is_err());

        let mut config = ShopConfig::default();
        config.store_name = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
