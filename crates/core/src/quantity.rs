//! Fixed-point stock quantity.
//!
//! Stock is recorded with two fractional digits, so quantities are stored as an
//! integer number of hundredths. This keeps equality checks ("is the counted
//! value the recorded value?") exact.

use core::fmt;
use core::ops::{Add, Sub};
use core::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DomainError, DomainResult};

const SCALE: i64 = 100;

/// A stock quantity with two decimal places.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    /// Whole units (e.g. `Quantity::from_units(5)` is `5.00`).
    pub const fn from_units(units: i64) -> Self {
        Self(units * SCALE)
    }

    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    pub const fn hundredths(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Convert from a floating point value, rounding to the nearest hundredth.
    pub fn from_f64(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::invalid_quantity(format!("{value} is not finite")));
        }
        let scaled = (value * SCALE as f64).round();
        if scaled > i64::MAX as f64 || scaled < i64::MIN as f64 {
            return Err(DomainError::invalid_quantity(format!("{value} is out of range")));
        }
        Ok(Self(scaled as i64))
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    /// Canonical wire form with exactly two decimals (`"5.00"`, `"-0.25"`).
    pub fn to_decimal_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02}", abs / SCALE as u64, abs % SCALE as u64)
    }

    /// Display form with an explicit sign for positive values (`"+3"`, `"-2.50"`, `"0"`).
    pub fn signed(self) -> String {
        if self.0 > 0 {
            format!("+{self}")
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % SCALE == 0 {
            write!(f, "{}", self.0 / SCALE)
        } else {
            f.write_str(&self.to_decimal_string())
        }
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity(self.0.saturating_sub(rhs.0))
    }
}

impl FromStr for Quantity {
    type Err = DomainError;

    /// Accepts `12`, `12.5`, `12.50`, `+3`, `-0.25` and a decimal comma (`12,5`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || DomainError::invalid_quantity(format!("cannot parse {raw:?}"));

        let (negative, digits) = match raw.as_bytes().first() {
            Some(b'-') => (true, &raw[1..]),
            Some(b'+') => (false, &raw[1..]),
            Some(_) => (false, raw),
            None => return Err(invalid()),
        };

        let (whole, frac) = match digits.split_once(['.', ',']) {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        // Digits beyond the second decimal must be zeros; anything else loses precision.
        let (kept, dropped) = frac.split_at(frac.len().min(2));
        if dropped.bytes().any(|b| b != b'0') {
            return Err(DomainError::invalid_quantity(format!(
                "{raw:?} has more than two decimal places"
            )));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let cents: i64 = match kept.len() {
            0 => 0,
            1 => kept.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => kept.parse().map_err(|_| invalid())?,
        };

        let magnitude = whole
            .checked_mul(SCALE)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(|| DomainError::invalid_quantity(format!("{raw:?} is out of range")))?;

        Ok(Self(if negative { -magnitude } else { magnitude }))
    }
}

/// Serialized as the canonical decimal string so values round-trip exactly.
impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    /// Accepts JSON numbers and decimal strings (REST backends often send decimals as strings).
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuantityVisitor;

        impl Visitor<'_> for QuantityVisitor {
            type Value = Quantity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number or a decimal string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
                v.checked_mul(SCALE)
                    .map(Quantity)
                    .ok_or_else(|| E::custom("quantity out of range"))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
                i64::try_from(v)
                    .map_err(|_| E::custom("quantity out of range"))
                    .and_then(|v| self.visit_i64(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
                Quantity::from_f64(v).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}
