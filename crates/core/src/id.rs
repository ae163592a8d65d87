//! Strongly-typed identifiers used across the domain.
//!
//! The backend issues numeric identifiers but serializes them as strings in
//! resource envelopes (`"id": "42"`) and as numbers inside attribute objects
//! (`"product_id": 42`). Every identifier accepts both forms on the way in and
//! is normalized to a `u64` before it enters the data model.

use core::str::FromStr;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Parse a wire identifier (`"42"`, `" 42 "`) into its numeric form.
pub fn parse_remote_id(raw: &str, name: &str) -> Result<u64, DomainError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<u64>()
        .map_err(|e| DomainError::invalid_id(format!("{name}: '{raw}': {e}")))
}

/// Identifier of a signed-in user (actor identity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(u64);

/// Identifier of a product (reference data).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductId(u64);

/// Identifier of a client (customer).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ClientId(u64);

/// Identifier of an inventory adjustment header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AdjustmentId(u64);

/// Identifier of a single inventory adjustment line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AdjustmentItemId(u64);

/// Identifier of a sales order header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OrderId(u64);

/// Identifier of a sales order line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OrderItemId(u64);

struct RemoteIdVisitor(&'static str);

impl<'de> Visitor<'de> for RemoteIdVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "a numeric {} or its string form", self.0)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
        u64::try_from(v).map_err(|_| E::custom(format!("{}: negative id {v}", self.0)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
        parse_remote_id(v, self.0).map_err(E::custom)
    }
}

macro_rules! impl_numeric_id {
    ($t:ident, $name:literal) => {
        impl $t {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<u64> for $t {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for u64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_remote_id(s, $name).map(Self)
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(RemoteIdVisitor($name)).map(Self)
            }
        }
    };
}

impl_numeric_id!(UserId, "UserId");
impl_numeric_id!(ProductId, "ProductId");
impl_numeric_id!(ClientId, "ClientId");
impl_numeric_id!(AdjustmentId, "AdjustmentId");
impl_numeric_id!(AdjustmentItemId, "AdjustmentItemId");
impl_numeric_id!(OrderId, "OrderId");
impl_numeric_id!(OrderItemId, "OrderItemId");
