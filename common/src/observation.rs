//! Provider-attributed rate observations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::currency::{CurrencyCode, CurrencyPair};

/// One quote for a pair, as supplied by a single provider at a point in time.
///
/// Observations are append-only: once recorded they are never mutated or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateObservation {
    /// Time-ordered unique ID.
    pub id: Uuid,
    /// Currency converted from.
    pub base: CurrencyCode,
    /// Currency converted to.
    pub target: CurrencyCode,
    /// Units of `target` per one `base`.
    pub rate: Decimal,
    /// Name of the provider that quoted this rate.
    pub source: String,
    /// When the quote was recorded.
    pub observed_at: DateTime<Utc>,
}

impl RateObservation {
    /// Create a new observation.
    pub fn new(
        base: CurrencyCode,
        target: CurrencyCode,
        rate: Decimal,
        source: impl Into<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            base,
            target,
            rate,
            source: source.into(),
            observed_at,
        }
    }

    /// Get the currency pair.
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.base.clone(), self.target.clone())
    }

    /// Build one observation per quote returned by a provider call.
    ///
    /// All observations share `observed_at`.
    pub fn from_quotes(
        base: &CurrencyCode,
        quotes: &BTreeMap<CurrencyCode, Decimal>,
        source: &str,
        observed_at: DateTime<Utc>,
    ) -> Vec<Self> {
        quotes
            .iter()
            .map(|(target, rate)| {
                Self::new(base.clone(), target.clone(), *rate, source, observed_at)
            })
            .collect()
    }
}
