//! The FX service: wires providers, store, cache and triggers together and
//! exposes the queries the HTTP layer serves.

use std::collections::BTreeMap;
use std::sync::Arc;

use fxwatch_common::{CurrencyCode, RateObservation};
use fxwatch_fx::{
    AggregatorConfig, Conversion, ConversionEngine, CurrencyCatalog, FetchOrchestrator,
    FxResult, InMemoryCatalog, RateAggregator, RateCache, RefreshSummary, SharedRateCache, Trend,
    TrendAnalyzer,
};
use fxwatch_providers::{build_all, ProviderError, RateProvider};
use fxwatch_store::{
    MemoryObservationStore, PgObservationStore, SharedObservationStore, StoreError, StoreResult,
};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::config::ServiceConfig;
use crate::metrics::{Metrics, SharedMetrics};
use crate::state::ServiceState;

/// Errors raised while assembling the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Facade over the rate pipeline.
pub struct FxService {
    config: ServiceConfig,
    catalog: Arc<InMemoryCatalog>,
    store: SharedObservationStore,
    cache: SharedRateCache,
    orchestrator: Arc<FetchOrchestrator>,
    conversion: ConversionEngine,
    trend: TrendAnalyzer,
    metrics: SharedMetrics,
    state: RwLock<ServiceState>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl FxService {
    /// Build the service from configuration: HTTP providers, and PostgreSQL
    /// when a database URL is set, memory otherwise.
    pub async fn connect(config: ServiceConfig) -> Result<Self, ServiceError> {
        config.validate().map_err(ServiceError::Config)?;

        let providers = build_all(&config.providers.specs(), config.refresh.provider_timeout)?;

        let store: SharedObservationStore = match &config.store.database_url {
            Some(url) => {
                let store = PgObservationStore::connect(url, config.store.max_connections).await?;
                store.migrate().await?;
                Arc::new(store)
            }
            None => {
                warn!("DATABASE_URL not set, observations are kept in memory only");
                Arc::new(MemoryObservationStore::new())
            }
        };

        Ok(Self::with_parts(config, providers, store))
    }

    /// Build the service around already constructed providers and store.
    pub fn with_parts(
        config: ServiceConfig,
        providers: Vec<Arc<dyn RateProvider>>,
        store: SharedObservationStore,
    ) -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        for code in &config.currencies {
            catalog.activate(code.clone());
        }

        let cache = Arc::new(RateCache::new());
        let aggregator = Arc::new(RateAggregator::new(
            providers,
            store.clone(),
            cache.clone(),
            catalog.clone(),
            AggregatorConfig {
                provider_timeout: config.refresh.provider_timeout,
            },
        ));

        let metrics = Arc::new(Metrics::new());
        let observed = metrics.clone();
        let orchestrator = FetchOrchestrator::new(
            aggregator.clone(),
            config.refresh.interval,
            config.refresh.overlap_policy,
        )
        .with_observer(Arc::new(move |summary: Option<&RefreshSummary>| {
            match summary {
                Some(summary) => observed.record_refresh(summary),
                None => observed.refresh_coalesced(),
            }
        }));

        info!(
            providers = ?aggregator.provider_names(),
            currencies = ?catalog.active_codes(),
            policy = %config.refresh.overlap_policy,
            "FX service assembled"
        );

        Self {
            conversion: ConversionEngine::new(cache.clone()),
            trend: TrendAnalyzer::new(store.clone()),
            orchestrator: Arc::new(orchestrator),
            config,
            catalog,
            store,
            cache,
            metrics,
            state: RwLock::new(ServiceState::Starting),
            scheduler: Mutex::new(None),
        }
    }

    /// Run the startup refresh and start the scheduled one.
    #[instrument(skip(self))]
    pub async fn start(&self) {
        self.orchestrator.on_startup().await;

        let orchestrator = self.orchestrator.clone();
        let handle = tokio::spawn(async move { orchestrator.run_interval_loop().await });
        *self.scheduler.lock() = Some(handle);
        *self.state.write() = ServiceState::Running;

        info!(
            interval_secs = self.config.refresh.interval.as_secs(),
            "FX service running"
        );
    }

    /// Stop the scheduled refresh and wait for it to wind down.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        *self.state.write() = ServiceState::ShuttingDown;
        self.orchestrator.stop();

        let handle = self.scheduler.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Scheduled refresh task failed");
            }
        }

        *self.state.write() = ServiceState::Stopped;
        info!("FX service stopped");
    }

    /// Convert `amount` of `from` into `to` at the cached best rate.
    pub fn convert(
        &self,
        amount: Decimal,
        from: impl Into<CurrencyCode>,
        to: impl Into<CurrencyCode>,
    ) -> FxResult<Conversion> {
        let result = self.conversion.convert(amount, from, to);
        self.count_query(&result, Metrics::conversion);
        result
    }

    /// Rate trend over `period` (e.g. `12H`, `10D`, `3M`, `1Y`).
    pub async fn get_trend(
        &self,
        from: impl Into<CurrencyCode>,
        to: impl Into<CurrencyCode>,
        period: &str,
    ) -> FxResult<Trend> {
        let result = self.trend.get_trend(from, to, period).await;
        self.count_query(&result, Metrics::trend_query);
        result
    }

    /// Observations over `period`, oldest first.
    pub async fn history(
        &self,
        from: impl Into<CurrencyCode>,
        to: impl Into<CurrencyCode>,
        period: &str,
    ) -> FxResult<Vec<RateObservation>> {
        let result = self.trend.history(from, to, period).await;
        self.count_query(&result, Metrics::trend_query);
        result
    }

    /// Run a refresh cycle now. `None` if it was coalesced into a running one.
    pub async fn refresh(&self) -> Option<RefreshSummary> {
        self.orchestrator.refresh().await
    }

    /// Every cached best rate, keyed `BASE_TARGET`.
    pub fn all_rates(&self) -> BTreeMap<String, Decimal> {
        self.cache.snapshot()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Currencies refreshed on each cycle. Activation changes apply from the
    /// next cycle on.
    pub fn catalog(&self) -> &Arc<InMemoryCatalog> {
        &self.catalog
    }

    pub async fn observation_count(&self) -> StoreResult<usize> {
        self.store.count().await
    }

    pub fn state(&self) -> ServiceState {
        *self.state.read()
    }

    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn count_query<T>(&self, result: &FxResult<T>, served: fn(&Metrics)) {
        match result {
            Ok(_) => served(&self.metrics),
            Err(e) if e.is_client_error() => self.metrics.query_failed(),
            Err(e) => {
                error!(error = %e, code = e.error_code(), "Query failed");
                self.metrics.query_failed();
            }
        }
    }
}
