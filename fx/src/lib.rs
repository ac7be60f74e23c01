//! fxwatch FX Engine
//!
//! Keeps a continuously refreshed best rate per currency pair and answers
//! conversion and trend queries.
//!
//! # Features
//!
//! - Concurrent fan-out to every configured rate provider with per-call timeouts
//! - Max-merge of conflicting quotes into one best rate per pair
//! - Append-only observation log for historical trend queries
//! - Startup, interval and on-demand refresh triggers with an optional
//!   single-flight guard
//!
//! # Example
//!
//! ```rust,ignore
//! use fxwatch_fx::{ConversionEngine, RateAggregator, RateCache};
//!
//! let cache = Arc::new(RateCache::new());
//! let aggregator = RateAggregator::new(providers, store, cache.clone(), catalog, Default::default());
//! aggregator.refresh().await;
//!
//! let conversion = ConversionEngine::new(cache).convert(dec!(100), "USD", "EUR")?;
//! ```

pub mod aggregator;
pub mod cache;
pub mod catalog;
pub mod conversion;
pub mod error;
pub mod orchestrator;
pub mod period;
pub mod trend;

pub use aggregator::{merge_best, AggregatorConfig, RateAggregator, RefreshSummary};
pub use cache::{RateCache, SharedRateCache};
pub use catalog::{CurrencyCatalog, InMemoryCatalog, StaticCatalog};
pub use conversion::{Conversion, ConversionEngine};
pub use error::{FxError, FxResult};
pub use orchestrator::{CycleObserver, FetchOrchestrator, OverlapPolicy};
pub use period::{Period, PeriodUnit};
pub use trend::{Trend, TrendAnalyzer};
