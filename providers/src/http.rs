//! Shared HTTP plumbing for REST-backed providers.

use std::collections::BTreeMap;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderErrorKind, ProviderResult};

/// JSON body shared by the `latest` style endpoints. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestRatesBody {
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub rates: Option<BTreeMap<String, Decimal>>,
    /// Set to `"error"` by sources that report failures in-band.
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default, rename = "error-type")]
    pub error_type: Option<String>,
}

impl LatestRatesBody {
    /// Source-reported error, if any.
    pub fn source_error(&self) -> Option<String> {
        match self.result.as_deref() {
            Some("error") => Some(
                self.error_type
                    .clone()
                    .unwrap_or_else(|| "unspecified error".to_string()),
            ),
            _ => None,
        }
    }

    pub fn into_rates(self) -> BTreeMap<String, Decimal> {
        self.rates.unwrap_or_default()
    }
}

/// A base URL plus the client used to call it.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with its own client and per-request timeout.
    pub fn new(
        provider: &str,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::new(provider, ProviderErrorKind::Transport(e.to_string()))
            })?;
        Ok(Self::with_client(client, base_url, timeout))
    }

    /// Create a fetcher on top of an existing client. `timeout` must match the
    /// client's configured request timeout; it is only used for error reporting.
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base_url}{path}` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        provider: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> ProviderResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(provider, url = %url, "Requesting rates");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::new(provider, self.classify(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::new(
                provider,
                ProviderErrorKind::Status(status.as_u16()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::new(provider, self.classify(e)))?;

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::new(provider, ProviderErrorKind::Decode(e.to_string())))
    }

    fn classify(&self, error: reqwest::Error) -> ProviderErrorKind {
        if error.is_timeout() {
            ProviderErrorKind::Timeout(self.timeout)
        } else if error.is_decode() {
            ProviderErrorKind::Decode(error.to_string())
        } else {
            ProviderErrorKind::Transport(error.to_string())
        }
    }
}
