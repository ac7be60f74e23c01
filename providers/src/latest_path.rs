//! Provider for sources that serve every rate for a base at `GET /latest/{BASE}`.

use async_trait::async_trait;
use fxwatch_common::CurrencyCode;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::info;

use crate::error::{ProviderError, ProviderErrorKind, ProviderResult};
use crate::http::{HttpFetcher, LatestRatesBody};
use crate::provider::{retain_requested, Quotes, RateProvider};

/// Default name for the ExchangeRate-API deployment of this shape.
pub const EXCHANGERATE_API: &str = "EXCHANGERATE_API";

/// Fetches the full rate table for a base and filters it client side.
pub struct LatestPathProvider {
    name: String,
    http: HttpFetcher,
}

impl LatestPathProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let name = name.into();
        let http = HttpFetcher::new(&name, base_url, timeout)?;
        Ok(Self { name, http })
    }
}

#[async_trait]
impl RateProvider for LatestPathProvider {
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

        info!(provider = %self.name, base = %base, "Fetching rates");
        let path = format!("/latest/{}", base);
        let body: LatestRatesBody = self.http.get_json(&self.name, &path, &[]).await?;

        if let Some(reason) = body.source_error() {
            return Err(ProviderError::new(&self.name, ProviderErrorKind::Source(reason)));
        }

        Ok(retain_requested(&self.name, base, targets, body.into_rates()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn targets(codes: &[&str]) -> BTreeSet<CurrencyCode> {
        codes.iter().map(|c| CurrencyCode::new(*c)).collect()
    }

    fn provider(server: &MockServer) -> LatestPathProvider {
        LatestPathProvider::new(EXCHANGERATE_API, server.base_url(), Duration::from_secs(2))
            .unwrap()
    }

    #[tokio::test]
    async fn test_filters_to_requested_targets() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/latest/USD");
                then.status(200).json_body(json!({
                    "base": "USD",
                    "date": "2024-05-01",
                    "time_last_update_unix": 1714521601,
                    "rates": {"USD": 1, "EUR": 0.92, "GBP": 0.79, "JPY": 151.3}
                }));
            })
            .await;

        let quotes = provider(&server)
            .fetch_rates(&CurrencyCode::usd(), &targets(&["EUR", "GBP"]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[&CurrencyCode::eur()], dec!(0.92));
        assert_eq!(quotes[&CurrencyCode::gbp()], dec!(0.79));
    }

    #[tokio::test]
    async fn test_base_echo_is_excluded() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/latest/USD");
                then.status(200)
                    .json_body(json!({"base": "USD", "rates": {"USD": 1, "EUR": 0.92}}));
            })
            .await;

        let quotes = provider(&server)
            .fetch_rates(&CurrencyCode::usd(), &targets(&["USD", "EUR"]))
            .await
            .unwrap();

        assert!(!quotes.contains_key(&CurrencyCode::usd()));
        assert_eq!(quotes.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_targets_skip_the_call() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!({"rates": {}}));
            })
            .await;

        let quotes = provider(&server)
            .fetch_rates(&CurrencyCode::usd(), &BTreeSet::new())
            .await
            .unwrap();

        assert!(quotes.is_empty());
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_http_error_is_wrapped_with_provider_name() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/latest/USD");
                then.status(503);
            })
            .await;

        let err = provider(&server)
            .fetch_rates(&CurrencyCode::usd(), &targets(&["EUR"]))
            .await
            .unwrap_err();

        assert_eq!(err.provider, EXCHANGERATE_API);
        assert!(matches!(err.kind, ProviderErrorKind::Status(503)));
    }

    #[tokio::test]
    async fn test_in_band_error_is_a_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/latest/XXX");
                then.status(200)
                    .json_body(json!({"result": "error", "error-type": "unsupported-code"}));
            })
            .await;

        let err = provider(&server)
            .fetch_rates(&CurrencyCode::new("XXX"), &targets(&["EUR"]))
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ProviderErrorKind::Source(ref r) if r == "unsupported-code"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/latest/USD");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let err = provider(&server)
            .fetch_rates(&CurrencyCode::usd(), &targets(&["EUR"]))
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ProviderErrorKind::Decode(_)));
    }
}
