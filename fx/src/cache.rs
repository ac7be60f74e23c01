//! Current best rate per currency pair.

use dashmap::DashMap;
use fxwatch_common::{CurrencyCode, CurrencyPair};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Concurrent map of pair to the latest merged best rate.
///
/// Entries carry no timestamp and never expire: a missing pair has never been
/// quoted, a present one may be stale. Each key is replaced atomically, but a
/// batch for one base is applied key by key, so readers can observe a
/// partially updated base.
#[derive(Default)]
pub struct RateCache {
    rates: DashMap<CurrencyPair, Decimal>,
}

impl RateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the best rate for a pair.
    pub fn get(
        &self,
        from: impl Into<CurrencyCode>,
        to: impl Into<CurrencyCode>,
    ) -> Option<Decimal> {
        let pair = CurrencyPair::new(from, to);
        let rate = self.rates.get(&pair).map(|r| *r.value());
        if rate.is_none() {
            debug!(pair = %pair, "Cache miss");
        }
        rate
    }

    /// Replace the rate for a single pair.
    pub fn put(&self, from: impl Into<CurrencyCode>, to: impl Into<CurrencyCode>, rate: Decimal) {
        let pair = CurrencyPair::new(from, to);
        debug!(pair = %pair, rate = %rate, "Cache updated");
        self.rates.insert(pair, rate);
    }

    /// Replace the rates of every target in `rates` for `base`.
    pub fn put_batch(
        &self,
        base: impl Into<CurrencyCode>,
        rates: &BTreeMap<CurrencyCode, Decimal>,
    ) {
        let base = base.into();
        for (target, rate) in rates {
            self.put(base.clone(), target.clone(), *rate);
        }
    }

    /// Read-only copy of every entry, keyed `BASE_TARGET`.
    pub fn snapshot(&self) -> BTreeMap<String, Decimal> {
        self.rates
            .iter()
            .map(|entry| (entry.key().key(), *entry.value()))
            .collect()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.rates.clear();
        info!("Exchange rate cache cleared");
    }

    /// Get the number of cached pairs.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;
