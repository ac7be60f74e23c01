//! fxwatch Observation Store
//!
//! Append-only log of provider-attributed rate observations. History is never
//! rewritten; the log is queried by currency pair and time for trend analysis.

pub mod error;
pub mod store;
pub mod memory;
pub mod postgres;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryObservationStore;
pub use postgres::PgObservationStore;
pub use store::{ObservationStore, SharedObservationStore};
