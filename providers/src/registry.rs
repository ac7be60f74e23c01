//! Building providers from configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ProviderResult;
use crate::latest_path::LatestPathProvider;
use crate::provider::RateProvider;
use crate::rates_api::RatesApiProvider;
use crate::symbols_query::SymbolsQueryProvider;

/// Wire shape spoken by a provider endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// `GET /latest/{BASE}`, filtered client side.
    LatestPath,
    /// `GET /latest?base=..&symbols=..`, filtered server side.
    SymbolsQuery,
    /// `GET /api/rates?base=..`, filtered client side.
    RatesApi,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderKind::LatestPath => "latest-path",
            ProviderKind::SymbolsQuery => "symbols-query",
            ProviderKind::RatesApi => "rates-api",
        };
        f.write_str(s)
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest-path" => Ok(ProviderKind::LatestPath),
            "symbols-query" => Ok(ProviderKind::SymbolsQuery),
            "rates-api" => Ok(ProviderKind::RatesApi),
            other => Err(format!("Unknown provider kind: {other}")),
        }
    }
}

/// One configured provider endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    pub name: String,
    pub base_url: String,
}

impl ProviderSpec {
    pub fn new(kind: ProviderKind, name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            base_url: base_url.into(),
        }
    }

    /// Instantiate the adapter for this endpoint.
    pub fn build(&self, timeout: Duration) -> ProviderResult<Arc<dyn RateProvider>> {
        let provider: Arc<dyn RateProvider> = match self.kind {
            ProviderKind::LatestPath => Arc::new(LatestPathProvider::new(
                self.name.clone(),
                self.base_url.clone(),
                timeout,
            )?),
            ProviderKind::SymbolsQuery => Arc::new(SymbolsQueryProvider::new(
                self.name.clone(),
                self.base_url.clone(),
                timeout,
            )?),
            ProviderKind::RatesApi => Arc::new(RatesApiProvider::new(
                self.name.clone(),
                self.base_url.clone(),
                timeout,
            )?),
        };
        Ok(provider)
    }
}

/// Build every spec, preserving order.
pub fn build_all(
    specs: &[ProviderSpec],
    timeout: Duration,
) -> ProviderResult<Vec<Arc<dyn RateProvider>>> {
    specs.iter().map(|spec| spec.build(timeout)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [
            ProviderKind::LatestPath,
            ProviderKind::SymbolsQuery,
            ProviderKind::RatesApi,
        ] {
            assert_eq!(kind.to_string().parse::<ProviderKind>().unwrap(), kind);
        }
        assert!("soap".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_build_all_preserves_order() {
        let specs = vec![
            ProviderSpec::new(ProviderKind::LatestPath, "EXCHANGERATE_API", "http://localhost:1"),
            ProviderSpec::new(ProviderKind::SymbolsQuery, "FRANKFURTER", "http://localhost:2"),
            ProviderSpec::new(ProviderKind::RatesApi, "MOCK_PROVIDER_1", "http://localhost:3"),
        ];

        let providers = build_all(&specs, Duration::from_secs(1)).unwrap();
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();

        assert_eq!(names, vec!["EXCHANGERATE_API", "FRANKFURTER", "MOCK_PROVIDER_1"]);
    }
}
