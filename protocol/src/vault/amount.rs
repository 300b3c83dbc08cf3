//! Fixed-point amounts with eight fractional digits.
//!
//! Internally an [`Amount`] is a `u64` count of 1e-8 units, so `1.0` is
//! `100_000_000`. No floating point anywhere near money. At the boundary
//! amounts travel as decimal strings; the formatter always emits exactly
//! eight fractional digits so that `"15.00100000"` parses and prints back
//! unchanged.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{AMOUNT_DECIMALS, UNITS_PER_WHOLE};

/// Errors produced when parsing a decimal amount string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount string")]
    Empty,

    #[error("malformed amount '{0}': expected digits with an optional '.' and up to 8 fractional digits")]
    Malformed(String),

    #[error("amount '{0}' has more than 8 fractional digits")]
    TooPrecise(String),

    #[error("amount '{0}' exceeds the representable range")]
    OutOfRange(String),
}

/// A non-negative fixed-point quantity, scaled by 10^8.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Largest representable amount, `184467440737.09551615`.
    pub const MAX: Amount = Amount(u64::MAX);

    /// Wrap a raw count of scaled units.
    pub const fn from_units(units: u64) -> Self {
        Amount(units)
    }

    /// Whole units, e.g. `Amount::from_whole(10)` is `10.00000000`.
    /// Returns `None` if the result does not fit.
    pub fn from_whole(whole: u64) -> Option<Self> {
        whole.checked_mul(UNITS_PER_WHOLE).map(Amount)
    }

    /// The raw scaled integer, as it appears in the canonical message.
    pub const fn units(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNITS_PER_WHOLE;
        let frac = self.0 % UNITS_PER_WHOLE;
        write!(
            f,
            "{}.{:0>width$}",
            whole,
            frac,
            width = AMOUNT_DECIMALS as usize
        )
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse `"<digits>[.<0..=8 digits>]"`. No sign, no exponent, no
    /// whitespace, no thousands separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AmountError::Empty);
        }

        let (whole_str, frac_str) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole_str.is_empty() || !all_digits(whole_str) || !all_digits(frac_str) {
            return Err(AmountError::Malformed(s.to_string()));
        }
        if frac_str.len() > AMOUNT_DECIMALS as usize {
            return Err(AmountError::TooPrecise(s.to_string()));
        }

        let out_of_range = || AmountError::OutOfRange(s.to_string());

        let whole: u64 = whole_str.parse().map_err(|_| out_of_range())?;
        let mut frac: u64 = if frac_str.is_empty() {
            0
        } else {
            frac_str.parse().map_err(|_| out_of_range())?
        };
        // "0.5" is 50_000_000 units, not 5.
        for _ in frac_str.len()..AMOUNT_DECIMALS as usize {
            frac *= 10;
        }

        whole
            .checked_mul(UNITS_PER_WHOLE)
            .and_then(|w| w.checked_add(frac))
            .map(Amount)
            .ok_or_else(out_of_range)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_u64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            u64::deserialize(deserializer).map(Amount)
        }
    }
}
