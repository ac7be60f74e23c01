//! Currency conversion from cached best rates.

use chrono::{DateTime, Utc};
use fxwatch_common::{round_half_up_fixed, CurrencyCode, RATE_SCALE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::cache::SharedRateCache;
use crate::error::{FxError, FxResult};

/// Result of converting an amount at the current best rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    /// Currency converted from.
    pub from: CurrencyCode,
    /// Currency converted to.
    pub to: CurrencyCode,
    /// Input amount.
    pub amount: Decimal,
    /// `amount * rate`, 8 decimal places, half-up.
    pub converted_amount: Decimal,
    /// Rate used for the conversion.
    pub rate: Decimal,
    /// When the conversion was computed.
    pub timestamp: DateTime<Utc>,
}

/// Converts amounts using the rate cache only. Never calls a provider.
#[derive(Clone)]
pub struct ConversionEngine {
    cache: SharedRateCache,
}

impl ConversionEngine {
    pub fn new(cache: SharedRateCache) -> Self {
        Self { cache }
    }

    /// Convert `amount` of `from` into `to`.
    #[instrument(skip(self, from, to))]
    pub fn convert(
        &self,
        amount: Decimal,
        from: impl Into<CurrencyCode>,
        to: impl Into<CurrencyCode>,
    ) -> FxResult<Conversion> {
        let from = from.into();
        let to = to.into();

        if amount <= Decimal::ZERO {
            return Err(FxError::InvalidAmount(amount));
        }

        let rate = self
            .cache
            .get(from.clone(), to.clone())
            .ok_or_else(|| FxError::rate_not_found(&from, &to))?;

        let product = amount
            .checked_mul(rate)
            .ok_or_else(|| FxError::Computation {
                from: from.clone(),
                to: to.clone(),
                reason: "converted amount overflows".to_string(),
            })?;
        let converted_amount = round_half_up_fixed(product, RATE_SCALE);

        info!(
            from = %from,
            to = %to,
            rate = %rate,
            converted = %converted_amount,
            "Conversion completed"
        );

        Ok(Conversion {
            from,
            to,
            amount,
            converted_amount,
            rate,
            timestamp: Utc::now(),
        })
    }
}
