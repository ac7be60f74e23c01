//! Historical trend over a look-back window.

use chrono::{DateTime, Utc};
use fxwatch_common::{round_half_up, CurrencyCode, RateObservation, PERCENT_SCALE, RATE_SCALE};
use fxwatch_store::SharedObservationStore;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{FxError, FxResult};
use crate::period::Period;

/// Rate movement between the start of a window and the latest observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trend {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// Normalized period, e.g. `12H`.
    pub period: Period,
    /// Oldest observation at or after the window start.
    pub rate_at_start: Decimal,
    /// Most recent observation, regardless of the window.
    pub rate_at_end: Decimal,
    /// Change from start to end in percent, 2 decimal places.
    pub percentage_change: Decimal,
}

/// Answers trend and history queries from the observation log.
#[derive(Clone)]
pub struct TrendAnalyzer {
    store: SharedObservationStore,
}

impl TrendAnalyzer {
    pub fn new(store: SharedObservationStore) -> Self {
        Self { store }
    }

    /// Trend for `from -> to` over `period`, ending now.
    pub async fn get_trend(
        &self,
        from: impl Into<CurrencyCode>,
        to: impl Into<CurrencyCode>,
        period: &str,
    ) -> FxResult<Trend> {
        self.get_trend_at(from, to, period, Utc::now()).await
    }

    /// Trend for `from -> to` over `period`, ending at `now`.
    #[instrument(skip(self, from, to))]
    pub async fn get_trend_at(
        &self,
        from: impl Into<CurrencyCode>,
        to: impl Into<CurrencyCode>,
        period: &str,
        now: DateTime<Utc>,
    ) -> FxResult<Trend> {
        let from = from.into();
        let to = to.into();
        let period: Period = period.parse()?;
        let since = period.since(now)?;

        let start = self
            .store
            .oldest_since(&from, &to, since)
            .await?
            .ok_or_else(|| FxError::rate_not_found(&from, &to))?;
        let end = self
            .store
            .latest(&from, &to)
            .await?
            .ok_or_else(|| FxError::rate_not_found(&from, &to))?;

        let computation = |reason: &str| FxError::Computation {
            from: from.clone(),
            to: to.clone(),
            reason: reason.to_string(),
        };
        if start.rate.is_zero() {
            return Err(computation("rate at start of period is zero"));
        }
        let percentage_change = percentage_change(start.rate, end.rate)
            .ok_or_else(|| computation("percentage change overflows"))?;

        debug!(
            from = %from,
            to = %to,
            period = %period,
            start = %start.rate,
            end = %end.rate,
            change = %percentage_change,
            "Trend computed"
        );

        Ok(Trend {
            from,
            to,
            period,
            rate_at_start: start.rate,
            rate_at_end: end.rate,
            percentage_change,
        })
    }

    /// Every observation for `from -> to` since the start of `period`, oldest first.
    pub async fn history(
        &self,
        from: impl Into<CurrencyCode>,
        to: impl Into<CurrencyCode>,
        period: &str,
    ) -> FxResult<Vec<RateObservation>> {
        self.history_at(from, to, period, Utc::now()).await
    }

    pub async fn history_at(
        &self,
        from: impl Into<CurrencyCode>,
        to: impl Into<CurrencyCode>,
        period: &str,
        now: DateTime<Utc>,
    ) -> FxResult<Vec<RateObservation>> {
        let from = from.into();
        let to = to.into();
        let period: Period = period.parse()?;
        let since = period.since(now)?;

        let observations = self.store.range_since(&from, &to, since).await?;
        if observations.is_empty() {
            return Err(FxError::rate_not_found(&from, &to));
        }
        Ok(observations)
    }
}

/// `(end - start) / start` at 8 places, then scaled to percent at 2 places.
/// `None` when `start` is zero or the result does not fit in a `Decimal`.
fn percentage_change(start: Decimal, end: Decimal) -> Option<Decimal> {
    let ratio = end.checked_sub(start)?.checked_div(start)?;
    let percent = round_half_up(ratio, RATE_SCALE).checked_mul(Decimal::ONE_HUNDRED)?;
    Some(round_half_up(percent, PERCENT_SCALE))
}
