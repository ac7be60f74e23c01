//! In-process observation log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fxwatch_common::{CurrencyCode, RateObservation};
use parking_lot::RwLock;
use tracing::debug;

use crate::error::StoreResult;
use crate::store::ObservationStore;

/// Observation log held in memory, in insertion order.
///
/// Ties on `observed_at` resolve by insertion order: `latest` returns the last
/// one inserted, `oldest_since` the first.
#[derive(Default)]
pub struct MemoryObservationStore {
    observations: RwLock<Vec<RateObservation>>,
}

impl MemoryObservationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every observation, in insertion order.
    pub fn all(&self) -> Vec<RateObservation> {
        self.observations.read().clone()
    }

    fn for_pair<'a>(
        observations: &'a [RateObservation],
        base: &'a CurrencyCode,
        target: &'a CurrencyCode,
    ) -> impl Iterator<Item = &'a RateObservation> + 'a {
        observations
            .iter()
            .filter(move |o| &o.base == base && &o.target == target)
    }
}

#[async_trait]
impl ObservationStore for MemoryObservationStore {
    async fn append(&self, observations: &[RateObservation]) -> StoreResult<()> {
        if observations.is_empty() {
            return Ok(());
        }
        self.observations.write().extend_from_slice(observations);
        debug!(count = observations.len(), "Appended observations");
        Ok(())
    }

    async fn latest(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
    ) -> StoreResult<Option<RateObservation>> {
        let observations = self.observations.read();
        Ok(Self::for_pair(&observations, base, target)
            .max_by_key(|o| o.observed_at)
            .cloned())
    }

    async fn oldest_since(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        since: DateTime<Utc>,
    ) -> StoreResult<Option<RateObservation>> {
        let observations = self.observations.read();
        Ok(Self::for_pair(&observations, base, target)
            .filter(|o| o.observed_at >= since)
            .min_by_key(|o| o.observed_at)
            .cloned())
    }

    async fn range_since(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<RateObservation>> {
        let mut range: Vec<RateObservation> = {
            let observations = self.observations.read();
            Self::for_pair(&observations, base, target)
                .filter(|o| o.observed_at >= since)
                .cloned()
                .collect()
        };
        range.sort_by_key(|o| o.observed_at);
        Ok(range)
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.observations.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn obs(base: &str, target: &str, rate: Decimal, at: DateTime<Utc>) -> RateObservation {
        RateObservation::new(base.into(), target.into(), rate, "TEST", at)
    }

    async fn seeded(now: DateTime<Utc>) -> MemoryObservationStore {
        let store = MemoryObservationStore::new();
        store
            .append(&[
                obs("USD", "EUR", dec!(0.90), now - Duration::days(3)),
                obs("USD", "EUR", dec!(0.91), now - Duration::hours(11)),
                obs("USD", "GBP", dec!(0.79), now - Duration::hours(1)),
                obs("USD", "EUR", dec!(0.92), now),
                obs("EUR", "USD", dec!(1.08), now),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_latest_ignores_window() {
        let now = Utc::now();
        let store = seeded(now).await;

        let latest = store
            .latest(&CurrencyCode::usd(), &CurrencyCode::eur())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(latest.rate, dec!(0.92));
    }

    #[tokio::test]
    async fn test_oldest_since_respects_lower_bound() {
        let now = Utc::now();
        let store = seeded(now).await;
        let usd = CurrencyCode::usd();
        let eur = CurrencyCode::eur();

        let oldest = store
            .oldest_since(&usd, &eur, now - Duration::hours(12))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(oldest.rate, dec!(0.91));

        let boundary = store
            .oldest_since(&usd, &eur, now - Duration::hours(11))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(boundary.rate, dec!(0.91));

        let none = store
            .oldest_since(&usd, &eur, now + Duration::seconds(1))
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_range_since_is_ascending() {
        let now = Utc::now();
        let store = seeded(now).await;

        let range = store
            .range_since(&CurrencyCode::usd(), &CurrencyCode::eur(), now - Duration::days(7))
            .await
            .unwrap();

        let rates: Vec<Decimal> = range.iter().map(|o| o.rate).collect();
        assert_eq!(rates, vec![dec!(0.90), dec!(0.91), dec!(0.92)]);
    }

    #[tokio::test]
    async fn test_ties_resolve_by_insertion_order() {
        let now = Utc::now();
        let store = MemoryObservationStore::new();
        store
            .append(&[
                obs("USD", "EUR", dec!(0.91), now),
                obs("USD", "EUR", dec!(0.93), now),
            ])
            .await
            .unwrap();
        let usd = CurrencyCode::usd();
        let eur = CurrencyCode::eur();

        let latest = store.latest(&usd, &eur).await.unwrap().unwrap();
        let oldest = store.oldest_since(&usd, &eur, now).await.unwrap().unwrap();

        assert_eq!(latest.rate, dec!(0.93));
        assert_eq!(oldest.rate, dec!(0.91));
    }

    #[test]
    fn test_empty_append_is_a_no_op() {
        let store = MemoryObservationStore::new();

        tokio_test::block_on(store.append(&[])).unwrap();

        assert_eq!(tokio_test::block_on(store.count()).unwrap(), 0);
        assert!(store.all().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_pair_is_empty() {
        let store = seeded(Utc::now()).await;
        let jpy = CurrencyCode::jpy();

        assert!(store.latest(&jpy, &CurrencyCode::usd()).await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 5);
    }
}
