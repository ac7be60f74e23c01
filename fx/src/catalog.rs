//! Source of the currencies a refresh cycle sweeps over.

use dashmap::DashSet;
use fxwatch_common::CurrencyCode;

/// Supplies the active currency codes. Each active code is used both as a base
/// and as a target of every other active code.
pub trait CurrencyCatalog: Send + Sync {
    fn active_codes(&self) -> Vec<CurrencyCode>;
}

/// Fixed list of active currencies, usually taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    codes: Vec<CurrencyCode>,
}

impl StaticCatalog {
    pub fn new<I, C>(codes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CurrencyCode>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }
}

impl CurrencyCatalog for StaticCatalog {
    fn active_codes(&self) -> Vec<CurrencyCode> {
        self.codes.clone()
    }
}

/// Mutable set of active currencies shared with whatever owns the catalog.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    active: DashSet<CurrencyCode>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a currency active. Returns `false` if it already was.
    pub fn activate(&self, code: impl Into<CurrencyCode>) -> bool {
        self.active.insert(code.into())
    }

    /// Mark a currency inactive. Returns `false` if it was not active.
    pub fn deactivate(&self, code: impl Into<CurrencyCode>) -> bool {
        self.active.remove(&code.into()).is_some()
    }

    pub fn is_active(&self, code: impl Into<CurrencyCode>) -> bool {
        self.active.contains(&code.into())
    }
}

impl CurrencyCatalog for InMemoryCatalog {
    /// Active codes in alphabetical order.
    fn active_codes(&self) -> Vec<CurrencyCode> {
        let mut codes: Vec<CurrencyCode> = self.active.iter().map(|c| c.key().clone()).collect();
        codes.sort();
        codes
    }
}
