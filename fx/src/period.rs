//! Trend window periods such as `12H`, `10D`, `3M` and `1Y`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use fxwatch_common::constants::MIN_TREND_HOURS;
use serde::{Serialize, Serializer};

use crate::error::FxError;

/// Unit of a [`Period`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodUnit {
    Hours,
    Days,
    Months,
    Years,
}

impl PeriodUnit {
    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'H' => Some(PeriodUnit::Hours),
            'D' => Some(PeriodUnit::Days),
            'M' => Some(PeriodUnit::Months),
            'Y' => Some(PeriodUnit::Years),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            PeriodUnit::Hours => 'H',
            PeriodUnit::Days => 'D',
            PeriodUnit::Months => 'M',
            PeriodUnit::Years => 'Y',
        }
    }
}

/// A look-back window: `<value><unit>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    pub value: u32,
    pub unit: PeriodUnit,
}

impl Period {
    /// Start of the window ending at `now`.
    ///
    /// Hours are wall-clock, days are calendar days, and months and years are
    /// calendar months (a year is twelve). A start that falls outside the
    /// representable range is an error.
    pub fn since(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, FxError> {
        let start = match self.unit {
            PeriodUnit::Hours => Duration::try_hours(i64::from(self.value))
                .and_then(|d| now.checked_sub_signed(d)),
            PeriodUnit::Days => now.checked_sub_days(chrono::Days::new(u64::from(self.value))),
            PeriodUnit::Months => now.checked_sub_months(Months::new(self.value)),
            PeriodUnit::Years => self
                .value
                .checked_mul(12)
                .and_then(|months| now.checked_sub_months(Months::new(months))),
        };
        start.ok_or_else(|| FxError::invalid_period(&self.to_string(), "window start out of range"))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.symbol())
    }
}

impl FromStr for Period {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        let mut chars = trimmed.chars();
        let unit = chars
            .next_back()
            .and_then(PeriodUnit::from_char)
            .ok_or_else(|| FxError::invalid_period(trimmed, "unknown unit"))?;

        let digits = chars.as_str();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(FxError::invalid_period(trimmed, "expected a number followed by a unit"));
        }

        let value: u32 = digits
            .parse()
            .map_err(|_| FxError::invalid_period(trimmed, "number too large"))?;

        if unit == PeriodUnit::Hours && value < MIN_TREND_HOURS {
            return Err(FxError::invalid_period(
                trimmed,
                format!("minimum period is {}H", MIN_TREND_HOURS),
            ));
        }

        Ok(Period { value, unit })
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(s: &str) -> Result<Period, FxError> {
        s.parse()
    }

    #[test]
    fn test_parse_units_case_insensitive() {
        assert_eq!(
            parse("12H").unwrap(),
            Period { value: 12, unit: PeriodUnit::Hours }
        );
        assert_eq!(
            parse(" 10d ").unwrap(),
            Period { value: 10, unit: PeriodUnit::Days }
        );
        assert_eq!(parse("3m").unwrap().unit, PeriodUnit::Months);
        assert_eq!(parse("1Y").unwrap().unit, PeriodUnit::Years);
        assert_eq!(parse("1y").unwrap().to_string(), "1Y");
    }

    #[test]
    fn test_display_is_normalized() {
        assert_eq!(parse("012h").unwrap().to_string(), "12H");
        assert_eq!(parse(" 10d").unwrap().to_string(), "10D");
    }

    #[test]
    fn test_hours_below_minimum_rejected() {
        let err = parse("6H").unwrap_err();

        assert!(matches!(err, FxError::InvalidPeriod { .. }));
        assert!(err.to_string().contains("minimum period is 12H"));
    }

    #[test]
    fn test_malformed_periods_rejected() {
        for input in ["INVALID", "", "H", "12", "12W", "-1D", "1.5D", "1 D", "99999999999D"] {
            let err = parse(input).unwrap_err();
            assert!(
                matches!(err, FxError::InvalidPeriod { .. }),
                "expected InvalidPeriod for {:?}",
                input
            );
            assert!(err.to_string().contains("12H, 10D, 3M, 1Y"));
        }
    }

    #[test]
    fn test_since_uses_calendar_arithmetic() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();

        assert_eq!(
            parse("12H").unwrap().since(now).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse("10D").unwrap().since(now).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 21, 12, 0, 0).unwrap()
        );
        // Clamped to the last day of February.
        assert_eq!(
            parse("1M").unwrap().since(now).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap()
        );
        assert_eq!(
            parse("1Y").unwrap().since(now).unwrap(),
            Utc.with_ymd_and_hms(2023, 3, 31, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_since_out_of_range() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();

        let err = parse("4000000000Y").unwrap().since(now).unwrap_err();

        assert!(matches!(err, FxError::InvalidPeriod { .. }));
    }
}
