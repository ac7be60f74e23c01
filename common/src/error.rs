//! Error types shared across fxwatch crates.

use thiserror::Error;

/// A currency code that cannot be normalized into a usable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid currency code: {0:?}")]
pub struct InvalidCurrencyCode(pub String);
