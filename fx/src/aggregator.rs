//! Refresh cycle: fan out to every provider, record observations, publish the
//! best quote per pair.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use fxwatch_common::{constants, CurrencyCode, DurationExt, RateObservation};
use fxwatch_providers::{ProviderError, ProviderErrorKind, ProviderResult, Quotes, RateProvider};
use fxwatch_store::SharedObservationStore;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::cache::SharedRateCache;
use crate::catalog::CurrencyCatalog;

/// Configuration for the rate aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Budget for one provider call. A call that overruns counts as a failure.
    pub provider_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            provider_timeout: constants::default_provider_timeout().as_std(),
        }
    }
}

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    /// Bases for which providers were queried.
    pub bases_processed: usize,
    /// Bases with no other active currency to quote against.
    pub bases_skipped: usize,
    /// Quotes returned by providers (and offered to the store).
    pub quotes_observed: usize,
    /// Best rates written to the cache.
    pub rates_published: usize,
    /// Provider calls that failed or timed out.
    pub provider_failures: usize,
    /// Observation batches the store rejected.
    pub store_failures: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RefreshSummary {
    fn started(at: DateTime<Utc>) -> Self {
        Self {
            bases_processed: 0,
            bases_skipped: 0,
            quotes_observed: 0,
            rates_published: 0,
            provider_failures: 0,
            store_failures: 0,
            started_at: at,
            finished_at: at,
        }
    }

    /// Wall-clock time the cycle took.
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Fold one provider's quotes into the running best rates, keeping the higher
/// rate per target.
///
/// The reduction is associative and commutative, so the result does not
/// depend on the order providers are merged in.
pub fn merge_best(best: &mut BTreeMap<CurrencyCode, Decimal>, quotes: &Quotes) {
    for (target, rate) in quotes {
        best.entry(target.clone())
            .and_modify(|current| {
                if *rate > *current {
                    *current = *rate;
                }
            })
            .or_insert(*rate);
    }
}

/// Runs refresh cycles against a fixed, ordered set of providers.
pub struct RateAggregator {
    providers: Vec<Arc<dyn RateProvider>>,
    store: SharedObservationStore,
    cache: SharedRateCache,
    catalog: Arc<dyn CurrencyCatalog>,
    config: AggregatorConfig,
}

impl RateAggregator {
    pub fn new(
        providers: Vec<Arc<dyn RateProvider>>,
        store: SharedObservationStore,
        cache: SharedRateCache,
        catalog: Arc<dyn CurrencyCatalog>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            providers,
            store,
            cache,
            catalog,
            config,
        }
    }

    /// Names of the configured providers, in query order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Run one refresh cycle over every active base currency.
    ///
    /// Never fails: provider and store errors are logged and counted in the
    /// returned summary.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> RefreshSummary {
        let mut summary = RefreshSummary::started(Utc::now());

        let active = self.active_codes();
        if active.is_empty() {
            info!("No active currencies, skipping refresh");
            summary.finished_at = Utc::now();
            return summary;
        }

        for base in &active {
            let targets: BTreeSet<CurrencyCode> =
                active.iter().filter(|c| *c != base).cloned().collect();
            if targets.is_empty() {
                debug!(base = %base, "No targets for base, skipping");
                summary.bases_skipped += 1;
                continue;
            }

            self.refresh_base(base, &targets, &mut summary).await;
            summary.bases_processed += 1;
        }

        summary.finished_at = Utc::now();
        info!(
            bases = summary.bases_processed,
            observed = summary.quotes_observed,
            provider_failures = summary.provider_failures,
            store_failures = summary.store_failures,
            elapsed_ms = summary.elapsed().num_milliseconds(),
            "Cached {} best rates",
            summary.rates_published
        );
        summary
    }

    /// Catalog codes, de-duplicated, in catalog order.
    fn active_codes(&self) -> Vec<CurrencyCode> {
        let mut seen = BTreeSet::new();
        self.catalog
            .active_codes()
            .into_iter()
            .filter(|code| seen.insert(code.clone()))
            .collect()
    }

    async fn refresh_base(
        &self,
        base: &CurrencyCode,
        targets: &BTreeSet<CurrencyCode>,
        summary: &mut RefreshSummary,
    ) {
        let results = join_all(
            self.providers
                .iter()
                .map(|provider| self.fetch_with_timeout(provider.as_ref(), base, targets)),
        )
        .await;

        let mut best = BTreeMap::new();
        for (provider, result) in self.providers.iter().zip(results) {
            let quotes = match result {
                Ok(quotes) => quotes,
                Err(e) => {
                    warn!(
                        provider = %provider.name(),
                        base = %base,
                        error = %e,
                        "Failed to fetch rates, skipping provider"
                    );
                    summary.provider_failures += 1;
                    continue;
                }
            };

            if quotes.is_empty() {
                continue;
            }

            let observations =
                RateObservation::from_quotes(base, &quotes, provider.name(), Utc::now());
            summary.quotes_observed += observations.len();
            if let Err(e) = self.store.append(&observations).await {
                error!(
                    provider = %provider.name(),
                    base = %base,
                    error = %e,
                    "Failed to record observations"
                );
                summary.store_failures += 1;
            }

            merge_best(&mut best, &quotes);
        }

        if !best.is_empty() {
            self.cache.put_batch(base.clone(), &best);
        }
        debug!(base = %base, published = best.len(), "Base refreshed");
        summary.rates_published += best.len();
    }

    async fn fetch_with_timeout(
        &self,
        provider: &dyn RateProvider,
        base: &CurrencyCode,
        targets: &BTreeSet<CurrencyCode>,
    ) -> ProviderResult<Quotes> {
        let timeout = self.config.provider_timeout;
        match tokio::time::timeout(timeout, provider.fetch_rates(base, targets)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::new(
                provider.name(),
                ProviderErrorKind::Timeout(timeout),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RateCache;
    use crate::catalog::StaticCatalog;
    use async_trait::async_trait;
    use fxwatch_providers::testing::StaticRateProvider;
    use fxwatch_store::{MemoryObservationStore, ObservationStore, StoreError, StoreResult};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    struct Harness {
        aggregator: RateAggregator,
        store: Arc<MemoryObservationStore>,
        cache: SharedRateCache,
    }

    fn harness(providers: Vec<Arc<StaticRateProvider>>, codes: &[&str]) -> Harness {
        harness_with(providers, codes, AggregatorConfig::default())
    }

    fn harness_with(
        providers: Vec<Arc<StaticRateProvider>>,
        codes: &[&str],
        config: AggregatorConfig,
    ) -> Harness {
        let store = Arc::new(MemoryObservationStore::new());
        let cache = Arc::new(RateCache::new());
        let providers = providers
            .into_iter()
            .map(|p| p as Arc<dyn RateProvider>)
            .collect();
        let aggregator = RateAggregator::new(
            providers,
            store.clone(),
            cache.clone(),
            Arc::new(StaticCatalog::new(codes.iter().copied())),
            config,
        );
        Harness {
            aggregator,
            store,
            cache,
        }
    }

    fn quotes(entries: &[(&str, Decimal)]) -> Quotes {
        entries
            .iter()
            .map(|(code, rate)| (CurrencyCode::new(code), *rate))
            .collect()
    }

    #[test]
    fn test_merge_best_keeps_maximum() {
        let mut best = BTreeMap::new();
        merge_best(&mut best, &quotes(&[("EUR", dec!(0.91)), ("GBP", dec!(0.80))]));
        merge_best(&mut best, &quotes(&[("EUR", dec!(0.93)), ("GBP", dec!(0.79))]));
        merge_best(&mut best, &quotes(&[("JPY", dec!(151.2))]));

        assert_eq!(best[&CurrencyCode::eur()], dec!(0.93));
        assert_eq!(best[&CurrencyCode::gbp()], dec!(0.80));
        assert_eq!(best[&CurrencyCode::jpy()], dec!(151.2));
    }

    proptest! {
        #[test]
        fn prop_merge_best_is_order_independent(
            maps in prop::collection::vec(
                prop::collection::btree_map(0usize..4, 1u32..2_000_000u32, 0..4),
                1..6,
            ),
            rotation in 0usize..6,
        ) {
            let codes = ["EUR", "GBP", "JPY", "CHF"];
            let provider_quotes: Vec<Quotes> = maps
                .iter()
                .map(|m| {
                    m.iter()
                        .map(|(i, v)| (CurrencyCode::new(codes[*i]), Decimal::new(i64::from(*v), 6)))
                        .collect()
                })
                .collect();

            let mut forward = BTreeMap::new();
            for q in &provider_quotes {
                merge_best(&mut forward, q);
            }

            let mut shuffled = provider_quotes.clone();
            shuffled.reverse();
            let len = shuffled.len();
            shuffled.rotate_left(rotation % len);
            let mut other = BTreeMap::new();
            for q in &shuffled {
                merge_best(&mut other, q);
            }

            prop_assert_eq!(&forward, &other);
            for (target, rate) in &forward {
                let max = provider_quotes
                    .iter()
                    .filter_map(|q| q.get(target))
                    .max()
                    .copied();
                prop_assert_eq!(Some(*rate), max);
            }
        }
    }

    #[tokio::test]
    async fn test_refresh_publishes_best_rate_across_providers() {
        let a = Arc::new(StaticRateProvider::new("A").with_rate("USD", "EUR", dec!(0.91)));
        let b = Arc::new(StaticRateProvider::new("B").with_rate("USD", "EUR", dec!(0.93)));
        let h = harness(vec![a, b], &["USD", "EUR"]);

        let summary = h.aggregator.refresh().await;

        assert_eq!(h.cache.get("USD", "EUR"), Some(dec!(0.93)));
        assert_eq!(summary.bases_processed, 2);
        assert_eq!(summary.quotes_observed, 2);
        assert_eq!(summary.rates_published, 1);
        assert_eq!(summary.provider_failures, 0);

        let sources: Vec<String> = h.store.all().into_iter().map(|o| o.source).collect();
        assert_eq!(sources, vec!["A".to_string(), "B".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_provider_does_not_block_others() {
        let a = Arc::new(StaticRateProvider::new("A").with_rate("USD", "EUR", dec!(0.95)));
        a.set_failing(true);
        let b = Arc::new(StaticRateProvider::new("B").with_rate("USD", "EUR", dec!(0.92)));
        let h = harness(vec![a, b], &["USD", "EUR"]);

        let summary = h.aggregator.refresh().await;

        assert_eq!(h.cache.get("USD", "EUR"), Some(dec!(0.92)));
        // One failure per base.
        assert_eq!(summary.provider_failures, 2);
        assert_eq!(h.store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out_without_blocking_others() {
        let slow = Arc::new(StaticRateProvider::new("SLOW").with_rate("USD", "EUR", dec!(0.99)));
        slow.set_delay(Some(Duration::from_millis(500)));
        let fast = Arc::new(StaticRateProvider::new("FAST").with_rate("USD", "EUR", dec!(0.92)));
        let config = AggregatorConfig {
            provider_timeout: Duration::from_millis(50),
        };
        let h = harness_with(vec![slow, fast], &["USD", "EUR"], config);

        let summary = h.aggregator.refresh().await;

        assert_eq!(h.cache.get("USD", "EUR"), Some(dec!(0.92)));
        assert_eq!(summary.provider_failures, 2);
        assert!(h.store.all().iter().all(|o| o.source == "FAST"));
    }

    #[tokio::test]
    async fn test_unquoted_pair_keeps_stale_value() {
        let a = Arc::new(StaticRateProvider::new("A").with_rate("USD", "EUR", dec!(0.92)));
        let h = harness(vec![a.clone()], &["USD", "EUR"]);

        h.aggregator.refresh().await;
        a.set_failing(true);
        let summary = h.aggregator.refresh().await;

        assert_eq!(summary.rates_published, 0);
        assert_eq!(h.cache.get("USD", "EUR"), Some(dec!(0.92)));
    }

    #[tokio::test]
    async fn test_single_currency_is_skipped() {
        let a = Arc::new(StaticRateProvider::new("A").with_rate("USD", "EUR", dec!(0.92)));
        let h = harness(vec![a.clone()], &["USD", "usd"]);

        let summary = h.aggregator.refresh().await;

        assert_eq!(summary.bases_skipped, 1);
        assert_eq!(summary.bases_processed, 0);
        assert_eq!(a.calls(), 0);
        assert!(h.cache.is_empty());
    }

    #[tokio::test]
    async fn test_no_active_currencies_is_a_no_op() {
        let a = Arc::new(StaticRateProvider::new("A"));
        let h = harness(vec![a.clone()], &[]);

        let summary = h.aggregator.refresh().await;

        assert_eq!(summary.bases_processed + summary.bases_skipped, 0);
        assert_eq!(a.calls(), 0);
    }

    struct RejectingStore;

    #[async_trait]
    impl ObservationStore for RejectingStore {
        async fn append(&self, _: &[RateObservation]) -> StoreResult<()> {
            Err(StoreError::Database("connection refused".to_string()))
        }

        async fn latest(
            &self,
            _: &CurrencyCode,
            _: &CurrencyCode,
        ) -> StoreResult<Option<RateObservation>> {
            Ok(None)
        }

        async fn oldest_since(
            &self,
            _: &CurrencyCode,
            _: &CurrencyCode,
            _: DateTime<Utc>,
        ) -> StoreResult<Option<RateObservation>> {
            Ok(None)
        }

        async fn range_since(
            &self,
            _: &CurrencyCode,
            _: &CurrencyCode,
            _: DateTime<Utc>,
        ) -> StoreResult<Vec<RateObservation>> {
            Ok(Vec::new())
        }

        async fn count(&self) -> StoreResult<usize> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_store_failure_still_publishes() {
        let a: Arc<dyn RateProvider> =
            Arc::new(StaticRateProvider::new("A").with_rate("USD", "EUR", dec!(0.92)));
        let cache = Arc::new(RateCache::new());
        let aggregator = RateAggregator::new(
            vec![a],
            Arc::new(RejectingStore),
            cache.clone(),
            Arc::new(StaticCatalog::new(["USD", "EUR"])),
            AggregatorConfig::default(),
        );

        let summary = aggregator.refresh().await;

        assert_eq!(summary.store_failures, 1);
        assert_eq!(cache.get("USD", "EUR"), Some(dec!(0.92)));
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_only_publish_quoted_values() {
        let a = Arc::new(
            StaticRateProvider::new("A")
                .with_rate("USD", "EUR", dec!(0.91))
                .with_rate("EUR", "USD", dec!(1.10)),
        );
        let b = Arc::new(
            StaticRateProvider::new("B")
                .with_rate("USD", "EUR", dec!(0.92))
                .with_rate("EUR", "USD", dec!(1.08)),
        );
        let h = harness(vec![a, b], &["USD", "EUR"]);

        let cycles = (0..8).map(|_| h.aggregator.refresh());
        let summaries = join_all(cycles).await;

        assert_eq!(summaries.len(), 8);
        assert_eq!(h.cache.get("USD", "EUR"), Some(dec!(0.92)));
        assert_eq!(h.cache.get("EUR", "USD"), Some(dec!(1.10)));
        assert_eq!(h.store.count().await.unwrap(), 8 * 4);
    }
}
