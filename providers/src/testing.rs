//! In-memory provider for tests.

use async_trait::async_trait;
use dashmap::DashMap;
use fxwatch_common::CurrencyCode;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{ProviderError, ProviderErrorKind, ProviderResult};
use crate::provider::{retain_requested, Quotes, RateProvider};

/// Provider serving fixed quotes, with switchable failure and latency.
pub struct StaticRateProvider {
    name: String,
    rates: DashMap<CurrencyCode, Quotes>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl StaticRateProvider {
    /// Create a new static provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rates: DashMap::new(),
            failing: AtomicBool::new(false),
            delay: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Set a quote for a pair.
    pub fn set_rate(&self, base: &str, target: &str, rate: Decimal) {
        self.rates
            .entry(CurrencyCode::new(base))
            .or_default()
            .insert(CurrencyCode::new(target), rate);
    }

    /// Builder form of [`set_rate`](Self::set_rate).
    pub fn with_rate(self, base: &str, target: &str, rate: Decimal) -> Self {
        self.set_rate(base, target, rate);
        self
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every subsequent call.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Number of calls that reached the "source".
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateProvider for StaticRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(
        &self,
        base: &CurrencyCode,
        targets: &BTreeSet<CurrencyCode>,
    ) -> ProviderResult<Quotes> {
        if targets.is_empty() {
            return Ok(Quotes::new());
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::new(
                &self.name,
                ProviderErrorKind::Source("simulated outage".to_string()),
            ));
        }

        let raw = self
            .rates
            .get(base)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        Ok(retain_requested(&self.name, base, targets, raw))
    }
}
