//! Time types for apate.
//!
//! Trace timestamps are offsets from the start of a recording. They are kept
//! as whole nanoseconds so they order exactly and can key a `BTreeMap`.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Offset from the start of a trace, in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TraceTime(u64);

impl TraceTime {
    /// Nanoseconds per second
    pub const NANOS_PER_SEC: u64 = 1_000_000_000;

    /// Digits of sub-second precision kept when parsing
    const FRACTION_DIGITS: usize = 9;

    /// The start of the trace
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Create from raw nanoseconds
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Create from whole seconds, saturating on overflow
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(Self::NANOS_PER_SEC))
    }

    /// Create from milliseconds, saturating on overflow
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Get raw nanoseconds
    #[must_use]
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Offset in fractional seconds, for logging
    #[must_use]
    pub fn as_secs_f64(&self) -> f64 {
        self.as_duration().as_secs_f64()
    }

    /// Offset as a duration since trace start
    #[must_use]
    pub const fn as_duration(&self) -> Duration {
        Duration::from_nanos(self.0)
    }

    /// Convert a duration since trace start, saturating at the maximum offset
    #[must_use]
    pub fn from_duration(duration: Duration) -> Self {
        Self(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }

    /// Parse a non-negative decimal number of seconds such as `12` or `3.25`
    ///
    /// Surrounding whitespace is ignored. Signs, exponents and anything past
    /// nanosecond precision are rejected or truncated respectively.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a non-negative decimal or overflows
    pub fn parse_secs(input: &str) -> CoreResult<Self> {
        let text = input.trim();
        let invalid = |reason: &str| CoreError::InvalidTimestamp {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (text, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("expected seconds"));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected a non-negative decimal number"));
        }

        let secs = whole.bytes().try_fold(0u64, |acc, b| {
            acc.checked_mul(10)?.checked_add(u64::from(b - b'0'))
        });
        let nanos = fraction
            .bytes()
            .chain(std::iter::repeat(b'0'))
            .take(Self::FRACTION_DIGITS)
            .fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0'));

        secs.and_then(|s| s.checked_mul(Self::NANOS_PER_SEC))
            .and_then(|n| n.checked_add(nanos))
            .map(Self)
            .ok_or_else(|| invalid("offset too large"))
    }
}

impl Default for TraceTime {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for TraceTime {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_secs(s)
    }
}

impl std::fmt::Display for TraceTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = self.0 / Self::NANOS_PER_SEC;
        let nanos = self.0 % Self::NANOS_PER_SEC;
        if nanos == 0 {
            write!(f, "{}s", secs)
        } else {
            let fraction = format!("{:09}", nanos);
            write!(f, "{}.{}s", secs, fraction.trim_end_matches('0'))
        }
    }
}

impl From<Duration> for TraceTime {
    fn from(duration: Duration) -> Self {
        Self::from_duration(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_integer_seconds() {
        let t = TraceTime::parse_secs("12").unwrap();
        assert_eq!(t, TraceTime::from_secs(12));
        assert_eq!(t.as_duration(), Duration::from_secs(12));
    }

    #[test]
    fn test_parse_decimal_seconds() {
        assert_eq!(TraceTime::parse_secs("3.25").unwrap(), TraceTime::from_millis(3250));
        assert_eq!(TraceTime::parse_secs(".5").unwrap(), TraceTime::from_millis(500));
        assert_eq!(TraceTime::parse_secs("7.").unwrap(), TraceTime::from_secs(7));
        assert_eq!(
            TraceTime::parse_secs("0.0000000019").unwrap(),
            TraceTime::from_nanos(1)
        );
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        assert_eq!(TraceTime::parse_secs(" 4 ").unwrap(), TraceTime::from_secs(4));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", " ", ".", "abc", "+1", "1e3", "1.2.3", "inf", "1,5"] {
            let result = TraceTime::parse_secs(input);
            assert!(
                matches!(result, Err(CoreError::InvalidTimestamp { .. })),
                "{:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_parse_overflow() {
        assert!(TraceTime::parse_secs("99999999999999999999").is_err());
        assert!(TraceTime::parse_secs("18446744074").is_err());
    }

    #[test]
    fn test_ordering_is_numeric() {
        let early: TraceTime = "9".parse().unwrap();
        let late: TraceTime = "10".parse().unwrap();
        assert!(early < late);
        assert_eq!("1.50".parse::<TraceTime>().unwrap(), "1.5".parse().unwrap());
    }

    #[test]
    fn test_display() {
        assert_eq!(TraceTime::zero().to_string(), "0s");
        assert_eq!(TraceTime::from_secs(2).to_string(), "2s");
        assert_eq!(TraceTime::from_millis(1250).to_string(), "1.25s");
    }

    #[test]
    fn test_from_duration_saturates() {
        assert_eq!(
            TraceTime::from(Duration::from_secs(u64::MAX)),
            TraceTime::from_nanos(u64::MAX)
        );
    }

    proptest! {
        #[test]
        fn prop_millis_text_round_trips(millis in 0u64..10_000_000_000) {
            let text = format!("{}.{:03}", millis / 1000, millis % 1000);
            prop_assert_eq!(TraceTime::parse_secs(&text).unwrap(), TraceTime::from_millis(millis));
        }
    }
}
