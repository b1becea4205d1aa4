//! Fixed-point decimal with 18 fractional digits.
//!
//! Ballot thresholds are fractions compared against vote tallies on every
//! replica, so they are held as scaled integers and compared with exact
//! integer arithmetic. Serialized as a decimal string (`"0.66"`).

use crate::error::XchainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits.
pub const PRECISION: u32 = 18;

const ONE_RAW: u128 = 1_000_000_000_000_000_000;

/// A non-negative fixed-point decimal (`raw / 10^18`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(u128);

impl Decimal {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(ONE_RAW);

    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u128 {
        self.0
    }

    /// `numerator / denominator`, rounded down. `None` on a zero denominator.
    pub fn from_ratio(numerator: u64, denominator: u64) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        Some(Self(numerator as u128 * ONE_RAW / denominator as u128))
    }

    /// Whether the value lies in `[0, 1]`.
    pub fn is_fraction(&self) -> bool {
        self.0 <= ONE_RAW
    }

    /// Exact test of `part / whole >= self`.
    ///
    /// Returns `false` when `whole` is zero: an empty population never meets a threshold.
    pub fn is_met_by(&self, part: u64, whole: u64) -> bool {
        if whole == 0 {
            return false;
        }
        match self.0.checked_mul(whole as u128) {
            Some(needed) => part as u128 * ONE_RAW >= needed,
            None => false,
        }
    }
}

impl FromStr for Decimal {
    type Err = XchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || XchainError::InvalidDecimal(s.to_string());
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac_part.len() > PRECISION as usize || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if s.ends_with('.') {
            return Err(invalid());
        }

        let int_value: u128 = int_part.parse().map_err(|_| invalid())?;
        let mut frac_value: u128 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| invalid())?
        };
        for _ in frac_part.len()..PRECISION as usize {
            frac_value *= 10;
        }

        int_value
            .checked_mul(ONE_RAW)
            .and_then(|v| v.checked_add(frac_value))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int_part = self.0 / ONE_RAW;
        let frac_part = self.0 % ONE_RAW;
        if frac_part == 0 {
            return write!(f, "{int_part}");
        }
        let digits = format!("{:018}", frac_part);
        write!(f, "{int_part}.{}", digits.trim_end_matches('0'))
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(dec("0.66").to_string(), "0.66");
        assert_eq!(dec("1").to_string(), "1");
        assert_eq!(dec("1.000").to_string(), "1");
        assert_eq!(dec("0.000000000000000001").raw(), 1);
        assert_eq!(dec("0"), Decimal::ZERO);
        assert_eq!(dec("1.0"), Decimal::ONE);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", ".5", "1.", "-0.5", "0.5.5", "abc", "0.0000000000000000001", "1e3"] {
            assert!(bad.parse::<Decimal>().is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn is_fraction_bounds() {
        assert!(Decimal::ZERO.is_fraction());
        assert!(Decimal::ONE.is_fraction());
        assert!(!dec("1.000000000000000001").is_fraction());
    }

    #[test]
    fn is_met_by_uses_exact_arithmetic() {
        let t = dec("0.66");
        assert!(t.is_met_by(3, 4)); // 0.75
        assert!(!t.is_met_by(2, 4)); // 0.50
        assert!(dec("0.5").is_met_by(1, 2));
        assert!(!Decimal::ONE.is_met_by(2, 4));
        assert!(Decimal::ONE.is_met_by(4, 4));
        // 2/3 = 0.666.. is above 0.66 but below 0.67
        assert!(t.is_met_by(2, 3));
        assert!(!dec("0.67").is_met_by(2, 3));
    }

    #[test]
    fn empty_population_never_meets() {
        assert!(!Decimal::ZERO.is_met_by(0, 0));
    }

    #[test]
    fn zero_threshold_met_by_nothing() {
        assert!(Decimal::ZERO.is_met_by(0, 5));
    }

    #[test]
    fn from_ratio_rounds_down() {
        assert_eq!(Decimal::from_ratio(3, 4), Some(dec("0.75")));
        assert_eq!(Decimal::from_ratio(1, 3).unwrap().to_string(), "0.333333333333333333");
        assert_eq!(Decimal::from_ratio(1, 0), None);
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&dec("0.66")).unwrap();
        assert_eq!(json, "\"0.66\"");
        let back: Decimal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dec("0.66"));
        assert!(serde_json::from_str::<Decimal>("\"-1\"").is_err());
    }
}
