//! fxwatch Common Types
//!
//! Value types shared by the rate providers, the observation store and the FX
//! engine: normalized currency codes and pairs, rate observations, decimal
//! rounding rules and time helpers.

pub mod currency;
pub mod observation;
pub mod monetary;
pub mod error;
pub mod time;

pub use currency::*;
pub use observation::*;
pub use monetary::*;
pub use error::*;
pub use time::*;
