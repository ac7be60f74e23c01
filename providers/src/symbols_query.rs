//! Provider for sources that filter server side via `GET /latest?base=..&symbols=..`.

use async_trait::async_trait;
use fxwatch_common::CurrencyCode;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::info;

use crate::error::{ProviderError, ProviderErrorKind, ProviderResult};
use crate::http::{HttpFetcher, LatestRatesBody};
use crate::provider::{retain_requested, symbols_csv, Quotes, RateProvider};

/// Default name for the Frankfurter deployment of this shape.
pub const FRANKFURTER: &str = "FRANKFURTER";

/// Asks the source for exactly the requested symbols.
pub struct SymbolsQueryProvider {
    name: String,
    http: HttpFetcher,
}

impl SymbolsQueryProvider {
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
impl RateProvider for SymbolsQueryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(
        &self,
        base: &CurrencyCode,
        targets: &BTreeSet<CurrencyCode>,
    ) -> ProviderResult<Quotes> {
        let symbols = symbols_csv(base, targets);
        if symbols.is_empty() {
            return Ok(Quotes::new());
        }

        info!(provider = %self.name, base = %base, symbols = %symbols, "Fetching rates");
        let body: LatestRatesBody = self
            .http
            .get_json(
                &self.name,
                "/latest",
                &[("base", base.code()), ("symbols", symbols.as_str())],
            )
            .await?;

        if let Some(reason) = body.source_error() {
            return Err(ProviderError::new(&self.name, ProviderErrorKind::Source(reason)));
        }

        // Sources may echo the base or extra symbols.
        Ok(retain_requested(&self.name, base, targets, body.into_rates()))
    }
}
