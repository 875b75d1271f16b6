//! Conversion between the node's `0x`-prefixed hex quantities and integers.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error as ThisError;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum HexError {
    #[error("invalid hex format: {0:?}")]
    InvalidHexFormat(String),
    #[error("value does not fit in 256 bits: {0:?}")]
    Overflow(String),
}

/// Parses a `0x`-prefixed hex string. The prefix is case-insensitive and at least one
/// digit is required.
pub fn hex_to_int(s: &str) -> Result<U256, HexError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| HexError::InvalidHexFormat(s.to_owned()))?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(HexError::InvalidHexFormat(s.to_owned()));
    }

    U256::from_str_radix(digits, 16).map_err(|_| HexError::Overflow(s.to_owned()))
}

pub fn int_to_hex(n: U256) -> String {
    format!("0x{n:x}")
}

/// Account dumps carry balances as plain decimal strings, everything else uses hex.
pub fn decimal_or_hex_to_int(s: &str) -> Result<U256, HexError> {
    if s.starts_with("0x") || s.starts_with("0X") {
        return hex_to_int(s);
    }

    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HexError::InvalidHexFormat(s.to_owned()));
    }

    U256::from_str_radix(s, 10).map_err(|_| HexError::Overflow(s.to_owned()))
}

/// Unsigned integer field of a domain record.
///
/// Written to JSON as a plain number regardless of magnitude, so a value like
/// `"0x64"` on the wire ends up as `100` in the output files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(pub U256);

impl Quantity {
    pub fn from_hex(s: &str) -> Result<Self, HexError> {
        hex_to_int(s).map(Self)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<u64> for Quantity {
    fn from(v: u64) -> Self {
        Self(U256::from(v))
    }
}

impl From<U256> for Quantity {
    fn from(v: U256) -> Self {
        Self(v)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match u64::try_from(self.0) {
            Ok(v) => serializer.serialize_u64(v),
            Err(_) => serde_json::Number::from_str(&self.0.to_string())
                .map_err(S::Error::custom)?
                .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let num = serde_json::Number::deserialize(deserializer)?;

        U256::from_str_radix(&num.to_string(), 10)
            .map(Self)
            .map_err(|e| D::Error::custom(format!("invalid quantity {num}: {e}")))
    }
}
