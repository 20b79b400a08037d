//! Repository error type and its mapping onto API errors.

use localfish_core::inventory::InventoryError;
use localfish_core::sales::SalesError;
use localfish_shared::AppError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Result alias for repository operations.
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Errors returned by the repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The row does not exist for this business.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The write collides with existing data (duplicate name, row in use).
    #[error("{0}")]
    Conflict(String),

    /// The input references data that is not acceptable.
    #[error("{0}")]
    Validation(String),

    /// Stock rule violation.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Sale or payment rule violation.
    #[error(transparent)]
    Sales(#[from] SalesError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    /// Shorthand for a conflict error.
    #[must_use]
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Shorthand for a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn corrupt(column: &str, value: &str) -> Self {
        Self::Database(DbErr::Type(format!(
            "unexpected value '{value}' in column {column}"
        )))
    }
}

/// Returns true for errors that mean the database could not be reached.
#[must_use]
pub fn is_connection_error(err: &DbErr) -> bool {
    matches!(err, DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
}

/// Maps a raw database error onto an API error.
#[must_use]
pub fn db_error(err: DbErr) -> AppError {
    if is_connection_error(&err) {
        return AppError::Unavailable(err.to_string());
    }

    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(detail = %detail, "Unique constraint violation");
            AppError::Conflict("A record with the same value already exists".to_string())
        }
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            tracing::debug!(detail = %detail, "Foreign key violation");
            AppError::Conflict("The record is referenced by other records".to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(resource) => Self::not_found(resource),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::Validation(msg)
            | RepositoryError::Inventory(InventoryError::InvalidQuantity(msg)) => {
                Self::Validation(msg)
            }
            RepositoryError::Inventory(e) => Self::BusinessRule(e.to_string()),
            RepositoryError::Sales(
                e @ (SalesError::InvalidQuantity
                | SalesError::NegativePrice
                | SalesError::InvalidPayment
                | SalesError::Precision { .. }),
            ) => Self::Validation(e.to_string()),
            RepositoryError::Sales(e) => Self::BusinessRule(e.to_string()),
            RepositoryError::Database(e) => db_error(e),
        }
    }
}
