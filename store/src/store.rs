//! Observation store trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fxwatch_common::{CurrencyCode, RateObservation};
use std::sync::Arc;

use crate::error::StoreResult;

/// Append-only log of rate observations.
///
/// Codes passed to queries are expected to be normalized already; `CurrencyCode`
/// guarantees that by construction.
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Append observations. Existing entries are never touched.
    async fn append(&self, observations: &[RateObservation]) -> StoreResult<()>;

    /// Most recent observation for the pair, regardless of age.
    async fn latest(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
    ) -> StoreResult<Option<RateObservation>>;

    /// Oldest observation for the pair recorded at or after `since`.
    async fn oldest_since(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        since: DateTime<Utc>,
    ) -> StoreResult<Option<RateObservation>>;

    /// Every observation for the pair recorded at or after `since`, oldest first.
    async fn range_since(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<RateObservation>>;

    /// Total number of observations held.
    async fn count(&self) -> StoreResult<usize>;
}

/// Shared observation store.
pub type SharedObservationStore = Arc<dyn ObservationStore>;
