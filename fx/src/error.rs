//! FX engine error types.

use fxwatch_common::CurrencyCode;
use fxwatch_store::StoreError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by conversion and trend queries.
#[derive(Debug, Error)]
pub enum FxError {
    /// No cached best rate, or no historical observation, for the pair.
    #[error("Exchange rate not found for {from} -> {to}")]
    RateNotFound { from: CurrencyCode, to: CurrencyCode },

    /// Malformed period string or a window below the hourly floor.
    #[error("Invalid period format: {period} ({reason}). Expected formats: 12H, 10D, 3M, 1Y")]
    InvalidPeriod { period: String, reason: String },

    /// Conversion amount must be strictly positive.
    #[error("Invalid amount: {0}. Amount must be positive")]
    InvalidAmount(Decimal),

    /// Arithmetic that has no defined result, e.g. a zero starting rate.
    #[error("Cannot compute {from} -> {to}: {reason}")]
    Computation {
        from: CurrencyCode,
        to: CurrencyCode,
        reason: String,
    },

    /// The observation store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FxError {
    pub(crate) fn rate_not_found(from: &CurrencyCode, to: &CurrencyCode) -> Self {
        FxError::RateNotFound {
            from: from.clone(),
            to: to.clone(),
        }
    }

    pub(crate) fn invalid_period(period: &str, reason: impl Into<String>) -> Self {
        FxError::InvalidPeriod {
            period: period.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable code for boundary layers.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::RateNotFound { .. } => "RATE_NOT_FOUND",
            FxError::InvalidPeriod { .. } => "INVALID_PERIOD",
            FxError::InvalidAmount(_) => "INVALID_AMOUNT",
            FxError::Computation { .. } => "COMPUTATION_ERROR",
            FxError::Store(_) => "STORE_ERROR",
        }
    }

    /// Whether the caller can fix the request (as opposed to a server-side fault).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FxError::RateNotFound { .. } | FxError::InvalidPeriod { .. } | FxError::InvalidAmount(_)
        )
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
