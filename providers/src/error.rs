//! Provider error types.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single provider call, tagged with the provider that failed.
#[derive(Debug, Error)]
#[error("Rate provider {provider} failed: {kind}")]
pub struct ProviderError {
    /// Name of the failing provider.
    pub provider: String,
    /// What went wrong.
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, kind: ProviderErrorKind) -> Self {
        Self {
            provider: provider.into(),
            kind,
        }
    }
}

/// Underlying cause of a provider failure.
#[derive(Debug, Error)]
pub enum ProviderErrorKind {
    /// Connection, TLS or other transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The source answered with a non-success HTTP status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The source reported an error in an otherwise valid response.
    #[error("source error: {0}")]
    Source(String),

    /// The call did not complete in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
