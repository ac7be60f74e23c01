//! fxwatch Service
//!
//! Composition root for the rate pipeline: configuration, provider and store
//! selection, refresh lifecycle and the query facade the HTTP layer calls.

pub mod config;
pub mod metrics;
pub mod service;
pub mod state;

pub use config::ServiceConfig;
pub use service::{FxService, ServiceError};
pub use state::ServiceState;
