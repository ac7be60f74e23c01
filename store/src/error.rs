//! Observation store error types.

use thiserror::Error;

/// Errors raised by an observation store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or failed a query.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be mapped back to an observation.
    #[error("Corrupt observation row: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
                StoreError::Decode(e.to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
