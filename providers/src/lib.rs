//! fxwatch Rate Providers
//!
//! Adapters that fetch exchange-rate quotes from external sources and normalize
//! them to one contract: given a base currency and a set of targets, return the
//! subset of positive quotes the source could supply, or a provider-scoped error.
//!
//! # Example
//!
//! ```rust,ignore
//! use fxwatch_providers::{ProviderKind, ProviderSpec};
//!
//! let provider = ProviderSpec::new(ProviderKind::SymbolsQuery, "FRANKFURTER", "https://api.frankfurter.dev/v1")
//!     .build(std::time::Duration::from_secs(10))?;
//! let rates = provider.fetch_rates(&"USD".into(), &targets).await?;
//! ```

pub mod error;
pub mod http;
pub mod provider;
pub mod latest_path;
pub mod symbols_query;
pub mod rates_api;
pub mod registry;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::{ProviderError, ProviderErrorKind, ProviderResult};
pub use latest_path::LatestPathProvider;
pub use provider::{Quotes, RateProvider};
pub use rates_api::RatesApiProvider;
pub use registry::{build_all, ProviderKind, ProviderSpec};
pub use symbols_query::SymbolsQueryProvider;
