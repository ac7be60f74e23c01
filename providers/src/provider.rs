//! Rate provider trait and response normalization.

use async_trait::async_trait;
use fxwatch_common::CurrencyCode;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::error::ProviderResult;

/// Quotes keyed by target currency.
pub type Quotes = BTreeMap<CurrencyCode, Decimal>;

/// Trait for external exchange-rate sources.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch quotes for `base` against `targets`.
    ///
    /// The returned map only holds keys from `targets`, never `base` itself, and
    /// only positive rates. An empty `targets` set returns an empty map without
    /// contacting the source.
    async fn fetch_rates(
        &self,
        base: &CurrencyCode,
        targets: &BTreeSet<CurrencyCode>,
    ) -> ProviderResult<Quotes>;
}

/// Normalize a raw `rates` object into the provider contract.
pub(crate) fn retain_requested<I, K>(
    provider: &str,
    base: &CurrencyCode,
    targets: &BTreeSet<CurrencyCode>,
    raw: I,
) -> Quotes
where
    I: IntoIterator<Item = (K, Decimal)>,
    K: AsRef<str>,
{
    let mut quotes = Quotes::new();
    for (code, rate) in raw {
        let code = CurrencyCode::new(code);
        if code == *base || !targets.contains(&code) {
            continue;
        }
        if rate <= Decimal::ZERO {
            warn!(
                provider,
                base = %base,
                target = %code,
                rate = %rate,
                "Dropping non-positive quote"
            );
            continue;
        }
        quotes.insert(code, rate);
    }
    quotes
}

/// Comma-separated target list, excluding the base.
pub(crate) fn symbols_csv(base: &CurrencyCode, targets: &BTreeSet<CurrencyCode>) -> String {
    targets
        .iter()
        .filter(|code| *code != base)
        .map(CurrencyCode::code)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn targets(codes: &[&str]) -> BTreeSet<CurrencyCode> {
        codes.iter().map(|c| CurrencyCode::new(*c)).collect()
    }

    #[test]
    fn test_retain_requested_filters_and_normalizes() {
        let raw = vec![
            ("eur", dec!(0.92)),
            ("USD", dec!(1)),
            ("GBP", dec!(0.79)),
            ("JPY", dec!(151.2)),
            ("CHF", dec!(0)),
        ];

        let quotes = retain_requested(
            "TEST",
            &CurrencyCode::usd(),
            &targets(&["EUR", "GBP", "USD", "CHF"]),
            raw,
        );

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[&CurrencyCode::eur()], dec!(0.92));
        assert_eq!(quotes[&CurrencyCode::gbp()], dec!(0.79));
    }

    #[test]
    fn test_symbols_csv_excludes_base() {
        let csv = symbols_csv(&CurrencyCode::usd(), &targets(&["GBP", "USD", "EUR"]));
        assert_eq!(csv, "EUR,GBP");
        assert_eq!(symbols_csv(&CurrencyCode::usd(), &targets(&["USD"])), "");
    }
}
