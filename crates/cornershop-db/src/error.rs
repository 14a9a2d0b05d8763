//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Product / Sale about to be written ──► ValidationError ──┐            │
//! │                                                            │            │
//! │  SQLite failure (sqlx::Error)                              │            │
//! │       │  classified by ErrorKind / pool state              │            │
//! │       ▼                                                    ▼            │
//! │  DbError (this module) ◄────────────────────────── InvalidRecord       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppError (console app) ← Operator-facing message                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookups use `fetch_optional`, so a missing row is `Ok(None)` rather than
//! an error.

use cornershop_core::ValidationError;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// The record was rejected before it reached SQLite.
    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] ValidationError),

    /// A unique index rejected an insert.
    ///
    /// ## When This Occurs
    /// - Inserting a product whose name already exists (ASCII case ignored)
    /// - Re-inserting a sale with an id that is already stored
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A `sale_items` row pointed at a sale that does not exist.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created (missing directory, permissions)
    /// - The pool was closed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite refused a statement (constraint, syntax, locked file).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed to begin, commit or roll back.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Anything sqlx reports that fits none of the above (decode, I/O).
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Wraps a failure from `begin()` / `commit()` / `rollback()`.
    pub fn transaction(err: sqlx::Error) -> Self {
        DbError::TransactionFailed(err.to_string())
    }

    /// Maps a failed INSERT keyed by `field`.
    ///
    /// The caller knows which value it was writing, so a unique violation
    /// names it directly: `Duplicate name: 'Apple' already exists`.
    pub fn on_insert(err: sqlx::Error, field: &str, value: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::duplicate(field, value)
            }
            _ => DbError::from(err),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// Database, ErrorKind::ForeignKeyViolation → DbError::ForeignKeyViolation
/// Database, any other kind                 → DbError::QueryFailed
/// PoolTimedOut                             → DbError::PoolExhausted
/// PoolClosed                               → DbError::ConnectionFailed
/// Other                                    → DbError::Internal
/// ```
///
/// Unique violations only carry a useful value at the insert site, see
/// [`DbError::on_insert`].
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::ForeignKeyViolation => {
                    DbError::ForeignKeyViolation(db_err.message().to_string())
                }
                _ => DbError::QueryFailed(db_err.message().to_string()),
            },

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
