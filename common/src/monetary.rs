//! Decimal rounding rules shared by conversion and trend calculations.

use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits kept on converted amounts and intermediate ratios.
pub const RATE_SCALE: u32 = 8;

/// Fractional digits kept on percentage figures.
pub const PERCENT_SCALE: u32 = 2;

/// Round to `dp` fractional digits, ties away from zero.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to `dp` fractional digits and pad the scale so `92` renders as `92.00000000`.
pub fn round_half_up_fixed(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = round_half_up(value, dp);
    if rounded.scale() < dp {
        rounded.rescale(dp);
    }
    rounded
}
