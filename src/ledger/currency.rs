use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A coin amount in base units. All arithmetic is checked; overflow is
/// always surfaced as an error, never wrapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Currency(u128);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("currency arithmetic overflowed")]
    Overflow,
    #[error("currency arithmetic underflowed")]
    Underflow,
    #[error("currency division by zero")]
    DivideByZero,
    #[error("currency value does not fit in 64 bits")]
    TooLarge,
}

impl Currency {
    pub const ZERO: Currency = Currency(0);

    pub const fn new(value: u64) -> Self {
        Currency(value as u128)
    }

    pub const fn from_base_units(value: u128) -> Self {
        Currency(value)
    }

    pub fn as_base_units(self) -> u128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Currency) -> Result<Currency, CurrencyError> {
        self.0
            .checked_add(rhs.0)
            .map(Currency)
            .ok_or(CurrencyError::Overflow)
    }

    pub fn checked_sub(self, rhs: Currency) -> Result<Currency, CurrencyError> {
        self.0
            .checked_sub(rhs.0)
            .map(Currency)
            .ok_or(CurrencyError::Underflow)
    }

    pub fn checked_mul(self, rhs: Currency) -> Result<Currency, CurrencyError> {
        self.0
            .checked_mul(rhs.0)
            .map(Currency)
            .ok_or(CurrencyError::Overflow)
    }

    pub fn checked_div(self, rhs: Currency) -> Result<Currency, CurrencyError> {
        if rhs.0 == 0 {
            return Err(CurrencyError::DivideByZero);
        }
        Ok(Currency(self.0 / rhs.0))
    }

    pub fn to_u64(self) -> Result<u64, CurrencyError> {
        u64::try_from(self.0).map_err(|_| CurrencyError::TooLarge)
    }
}

impl From<u64> for Currency {
    fn from(value: u64) -> Self {
        Currency(value as u128)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Currency {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Currency(s.parse()?))
    }
}

// Serialized as a decimal string so both the CBOR wire encoding and the
// JSON snapshot encoding carry the full 128-bit range losslessly.
impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
