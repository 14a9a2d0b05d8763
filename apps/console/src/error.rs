//! # Application Error Type
//!
//! Unified error type for the services and the shell.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Corner Shop                            │
//! │                                                                         │
//! │  Shell action ("Cancel Sale")                                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Service call                                                    │  │
//! │  │  Result<T, AppError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError::QueryFailed("...") ──┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Business Error? ─── CoreError::EmptySale ──────── AppError ───►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Menu loop catches the AppError, prints "Error: <message>",            │
//! │  and shows the menu again.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Database internals are logged, never shown: the operator sees a generic
//! message and the detail goes to the tracing output.

use std::fmt;

use cornershop_core::{CoreError, ValidationError};
use cornershop_db::DbError;

/// Error returned from service calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    /// Machine-readable category, used by the shell to pick a message
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Product or sale does not exist
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Not enough stock for the requested quantity
    InsufficientStock,

    /// Database operation failed
    DatabaseError,

    /// Anything else
    Internal,
}

impl AppError {
    /// Creates a new application error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        AppError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationError, message)
    }
}

/// Converts database errors to application errors.
impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::InvalidRecord(e) => AppError::validation(e.to_string()),
            DbError::UniqueViolation { field, value } => AppError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                AppError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                AppError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                AppError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                AppError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::ForeignKeyViolation(message) => {
                tracing::error!("Foreign key violation: {}", message);
                AppError::new(ErrorCode::DatabaseError, "Invalid reference")
            }
            DbError::PoolExhausted => {
                AppError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                AppError::new(ErrorCode::Internal, "Unexpected database error")
            }
        }
    }
}

/// Converts core errors to application errors.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(name) => AppError::not_found("Product", &name),
            e @ CoreError::InsufficientStock { .. } => {
                AppError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            e @ CoreError::EmptySale => AppError::validation(e.to_string()),
            CoreError::Validation(e) => AppError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AppError {}

/// Result type for service operations.
pub type AppResult<T> = Result<T, AppError>;
