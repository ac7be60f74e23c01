//! Provider for the simple `GET /api/rates?base=..` shape used by mock and
//! in-house rate services.

use async_trait::async_trait;
use fxwatch_common::CurrencyCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::info;

use crate::error::ProviderResult;
use crate::http::HttpFetcher;
use crate::provider::{retain_requested, Quotes, RateProvider};

/// `{base, rates}`; everything but `rates` is ignored.
#[derive(Debug, Deserialize)]
struct RatesApiBody {
    #[serde(default)]
    rates: Option<BTreeMap<String, Decimal>>,
}

/// Fetches the rate table for a base and filters it client side.
///
/// Unlike the public sources this shape has no well-known name, so every
/// instance is named by configuration (e.g. `MOCK_PROVIDER_1`).
pub struct RatesApiProvider {
    name: String,
    http: HttpFetcher,
}

impl RatesApiProvider {
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
impl RateProvider for RatesApiProvider {
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
        let body: RatesApiBody = self
            .http
            .get_json(&self.name, "/api/rates", &[("base", base.code())])
            .await?;

        Ok(retain_requested(
            &self.name,
            base,
            targets,
            body.rates.unwrap_or_default(),
        ))
    }
}
