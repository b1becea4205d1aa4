//! Observer account address type with `xc1` prefix.

use crate::error::XchainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Characters allowed after the prefix (bech32 data charset, no `1`, `b`, `i`, `o`).
const CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// An account address of an observer or an admin, always prefixed with `xc1`.
///
/// The data part is 38 characters of the bech32 charset. Addresses are compared
/// and ordered as plain strings so that every replica iterates them identically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// The standard prefix for all xchain addresses.
    pub const PREFIX: &'static str = "xc1";

    /// Length of the data part after the prefix.
    pub const DATA_LEN: usize = 38;

    /// Create a new address from a raw string.
    ///
    /// # Panics
    /// Panics if the string is not a well-formed address. Use [`Address::parse`]
    /// for untrusted input.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(is_well_formed(&s), "malformed xchain address: {s}");
        Self(s)
    }

    /// Parse an untrusted string into an address.
    pub fn parse(raw: &str) -> Result<Self, XchainError> {
        if is_well_formed(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(XchainError::InvalidAddress(raw.to_string()))
        }
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed.
    ///
    /// Deserialized addresses bypass [`Address::parse`], so persisted records
    /// re-check their addresses with this.
    pub fn is_valid(&self) -> bool {
        is_well_formed(&self.0)
    }
}

fn is_well_formed(s: &str) -> bool {
    match s.strip_prefix(Address::PREFIX) {
        Some(data) => data.len() == Address::DATA_LEN && data.chars().all(|c| CHARSET.contains(c)),
        None => false,
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = XchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(c: char) -> String {
        std::iter::repeat(c).take(Address::DATA_LEN).collect()
    }

    #[test]
    fn parse_accepts_well_formed() {
        let raw = format!("xc1{}", data('q'));
        let addr = Address::parse(&raw).unwrap();
        assert_eq!(addr.as_str(), raw);
        assert!(addr.is_valid());
    }

    #[test]
    fn parse_rejects_wrong_prefix() {
        let raw = format!("zz1{}", data('q'));
        assert_eq!(Address::parse(&raw), Err(XchainError::InvalidAddress(raw)));
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(Address::parse("xc1qqqq").is_err());
        assert!(Address::parse("xc1").is_err());
        assert!(Address::parse(&format!("xc1{}q", data('q'))).is_err());
    }

    #[test]
    fn parse_rejects_chars_outside_charset() {
        // `b`, `i`, `o` and `1` are excluded from the charset
        for c in ['b', 'i', 'o', '1', 'Q'] {
            assert!(Address::parse(&format!("xc1{}", data(c))).is_err(), "{c} accepted");
        }
    }

    #[test]
    #[should_panic(expected = "malformed xchain address")]
    fn new_panics_on_garbage() {
        Address::new("invalid_address");
    }

    #[test]
    fn ordering_is_string_ordering() {
        let a = Address::new(format!("xc1{}", data('p')));
        let b = Address::new(format!("xc1{}", data('q')));
        assert!(a < b);
    }
}
