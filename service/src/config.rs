//! Service configuration.

use std::time::Duration;

use fxwatch_common::{constants, CurrencyCode, DurationExt};
use fxwatch_fx::OverlapPolicy;
use fxwatch_providers::latest_path::EXCHANGERATE_API;
use fxwatch_providers::symbols_query::FRANKFURTER;
use fxwatch_providers::{ProviderKind, ProviderSpec};

/// Refresh scheduling configuration.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between scheduled refresh cycles.
    pub interval: Duration,
    /// Budget for a single provider call.
    pub provider_timeout: Duration,
    /// Behavior when a trigger fires during a running cycle.
    pub overlap_policy: OverlapPolicy,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: constants::default_refresh_interval().as_std(),
            provider_timeout: constants::default_provider_timeout().as_std(),
            overlap_policy: OverlapPolicy::Allow,
        }
    }
}

/// Provider endpoints. `None` disables a provider.
#[derive(Debug, Clone)]
pub struct ProvidersConfig {
    pub exchangerate_api_url: Option<String>,
    pub frankfurter_url: Option<String>,
    pub mock_provider_1_url: Option<String>,
    pub mock_provider_2_url: Option<String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            exchangerate_api_url: Some("https://open.er-api.com/v6".to_string()),
            frankfurter_url: Some("https://api.frankfurter.app".to_string()),
            mock_provider_1_url: Some("http://localhost:8081".to_string()),
            mock_provider_2_url: Some("http://localhost:8082".to_string()),
        }
    }
}

impl ProvidersConfig {
    /// Enabled providers, in query order.
    pub fn specs(&self) -> Vec<ProviderSpec> {
        let endpoints = [
            (ProviderKind::LatestPath, EXCHANGERATE_API, &self.exchangerate_api_url),
            (ProviderKind::SymbolsQuery, FRANKFURTER, &self.frankfurter_url),
            (ProviderKind::RatesApi, "MOCK_PROVIDER_1", &self.mock_provider_1_url),
            (ProviderKind::RatesApi, "MOCK_PROVIDER_2", &self.mock_provider_2_url),
        ];
        endpoints
            .into_iter()
            .filter_map(|(kind, name, url)| {
                url.as_ref().map(|url| ProviderSpec::new(kind, name, url.clone()))
            })
            .collect()
    }
}

/// Observation store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// PostgreSQL URL. `None` keeps observations in memory.
    pub database_url: Option<String>,
    /// Connection pool size.
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
        }
    }
}

/// Main service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Active currencies; every one is refreshed as a base against the others.
    pub currencies: Vec<CurrencyCode>,
    pub refresh: RefreshConfig,
    pub providers: ProvidersConfig,
    pub store: StoreConfig,
    /// Log level.
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            currencies: vec![CurrencyCode::usd(), CurrencyCode::eur(), CurrencyCode::gbp()],
            refresh: RefreshConfig::default(),
            providers: ProvidersConfig::default(),
            store: StoreConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(list) = lookup("FXWATCH_CURRENCIES") {
            config.currencies = list
                .split(',')
                .filter(|c| !c.trim().is_empty())
                .map(CurrencyCode::new)
                .collect();
        }

        if let Some(secs) = lookup("FXWATCH_REFRESH_INTERVAL_SECS") {
            if let Ok(secs) = secs.trim().parse() {
                config.refresh.interval = Duration::from_secs(secs);
            }
        }

        if let Some(ms) = lookup("FXWATCH_PROVIDER_TIMEOUT_MS") {
            if let Ok(ms) = ms.trim().parse() {
                config.refresh.provider_timeout = Duration::from_millis(ms);
            }
        }

        if let Some(policy) = lookup("FXWATCH_OVERLAP_POLICY") {
            if let Ok(policy) = policy.parse() {
                config.refresh.overlap_policy = policy;
            }
        }

        let endpoint = |key: &str, current: &mut Option<String>| {
            if let Some(url) = lookup(key) {
                let url = url.trim();
                *current = (!url.is_empty()).then(|| url.to_string());
            }
        };
        endpoint("FXWATCH_EXCHANGERATE_API_URL", &mut config.providers.exchangerate_api_url);
        endpoint("FXWATCH_FRANKFURTER_URL", &mut config.providers.frankfurter_url);
        endpoint("FXWATCH_MOCK_PROVIDER_1_URL", &mut config.providers.mock_provider_1_url);
        endpoint("FXWATCH_MOCK_PROVIDER_2_URL", &mut config.providers.mock_provider_2_url);

        if let Some(url) = lookup("DATABASE_URL") {
            if !url.trim().is_empty() {
                config.store.database_url = Some(url);
            }
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(bad) = self
            .currencies
            .iter()
            .find(|c| CurrencyCode::parse(c.code()).is_err())
        {
            return Err(format!("Invalid currency code: {:?}", bad.code()));
        }

        if self.refresh.interval.is_zero() {
            return Err("Refresh interval cannot be 0".to_string());
        }

        if self.refresh.provider_timeout.is_zero() {
            return Err("Provider timeout cannot be 0".to_string());
        }

        if self.providers.specs().is_empty() {
            return Err("At least one rate provider must be enabled".to_string());
        }

        if self.store.max_connections == 0 {
            return Err("Store max connections cannot be 0".to_string());
        }

        Ok(())
    }
}
