//! Value objects: equality by value, not identity.

use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::DomainError;

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. To
/// "modify" one, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Monetary amount in the smallest currency unit (cents).
///
/// The backend sends decimal strings (`"12.50"`), occasionally bare numbers.
/// Amounts are serialized back as two-decimal strings.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Line amount for `quantity` units at this unit price.
    ///
    /// Saturates instead of wrapping on overflow.
    pub fn times(self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(u64::from(quantity)))
    }

    fn from_f64(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() || value < 0.0 {
            return Err(DomainError::validation(format!("invalid amount: {value}")));
        }
        Ok(Money((value * 100.0).round() as u64))
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || DomainError::validation(format!("invalid amount: '{s}'"));

        let (whole, frac) = match raw.split_once('.') {
            Some((w, f)) => (w, f),
            None => (raw, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > 2 {
            return Err(invalid());
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .map(Money)
            .ok_or_else(invalid)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("a decimal amount as string or number")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        v.checked_mul(100)
            .map(Money)
            .ok_or_else(|| E::custom("amount overflow"))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        let v = u64::try_from(v).map_err(|_| E::custom(format!("negative amount {v}")))?;
        self.visit_u64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_f64(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_decimal_strings() {
        assert_eq!("12.50".parse::<Money>().unwrap(), Money::from_cents(1250));
        assert_eq!("12.5".parse::<Money>().unwrap(), Money::from_cents(1250));
        assert_eq!("3".parse::<Money>().unwrap(), Money::from_cents(300));
        assert_eq!(".75".parse::<Money>().unwrap(), Money::from_cents(75));
    }

    #[test]
    fn rejects_malformed_amounts() {
        for raw in ["", ".", "abc", "-1.00", "1.234", "1.2.3"] {
            assert!(raw.parse::<Money>().is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn serializes_as_two_decimal_string() {
        let json = serde_json::to_string(&Money::from_cents(2505)).unwrap();
        assert_eq!(json, "\"25.05\"");
    }

    #[test]
    fn deserializes_strings_and_numbers() {
        let m: Money = serde_json::from_str("\"4.20\"").unwrap();
        assert_eq!(m.cents(), 420);
        let m: Money = serde_json::from_str("4.2").unwrap();
        assert_eq!(m.cents(), 420);
        let m: Money = serde_json::from_str("4").unwrap();
        assert_eq!(m.cents(), 400);
    }

    #[test]
    fn times_and_sum() {
        let unit = Money::from_cents(150);
        let total: Money = [unit.times(2), unit.times(3)].into_iter().sum();
        assert_eq!(total, Money::from_cents(750));
        assert_eq!(Money::from_cents(u64::MAX).times(2), Money::from_cents(u64::MAX));
    }
}
