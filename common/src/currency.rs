//! Currency codes and pairs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InvalidCurrencyCode;

/// ISO-style currency code, always stored trimmed and upper-case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a currency code from trusted input, normalizing it.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// Parse untrusted input. Blank or non-alphabetic codes are rejected.
    pub fn parse(code: &str) -> Result<Self, InvalidCurrencyCode> {
        let normalized = Self::new(code);
        if normalized.0.is_empty() || !normalized.0.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(InvalidCurrencyCode(code.to_string()));
        }
        Ok(normalized)
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }

    pub fn jpy() -> Self {
        Self::new("JPY")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CurrencyCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&CurrencyCode> for CurrencyCode {
    fn from(code: &CurrencyCode) -> Self {
        code.clone()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A directed currency pair: rates are quoted as units of `target` per one `base`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Currency being converted from.
    pub base: CurrencyCode,
    /// Currency being converted to.
    pub target: CurrencyCode,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: impl Into<CurrencyCode>, target: impl Into<CurrencyCode>) -> Self {
        Self {
            base: base.into(),
            target: target.into(),
        }
    }

    /// Flat key used by the rate cache, e.g. `USD_EUR`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.base, self.target)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_normalized() {
        assert_eq!(CurrencyCode::new("  usd "), CurrencyCode::usd());
        assert_eq!(CurrencyCode::from("eUr").code(), "EUR");
    }

    #[test]
    fn test_parse_rejects_blank_and_symbols() {
        assert!(CurrencyCode::parse("   ").is_err());
        assert!(CurrencyCode::parse("US$").is_err());
        assert_eq!(CurrencyCode::parse(" gbp").unwrap(), CurrencyCode::gbp());
    }

    #[test]
    fn test_serde_normalizes_on_deserialize() {
        let code: CurrencyCode = serde_json::from_str("\"jpy\"").unwrap();
        assert_eq!(code, CurrencyCode::jpy());
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"JPY\"");
    }

    #[test]
    fn test_pair_key_and_display() {
        let pair = CurrencyPair::new("usd", "eur");
        assert_eq!(pair.key(), "USD_EUR");
        assert_eq!(pair.to_string(), "USD/EUR");
        assert_ne!(pair, CurrencyPair::new("EUR", "USD"));
    }
}
