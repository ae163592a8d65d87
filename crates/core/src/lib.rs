//! `aquaroute-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no IO, no HTTP).

pub mod aggregate;
pub mod error;
pub mod id;
pub mod time;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use error::{DomainError, DomainResult};
pub use id::{
    AdjustmentId, AdjustmentItemId, ClientId, OrderId, OrderItemId, ProductId, UserId,
    parse_remote_id,
};
pub use value_object::{Money, ValueObject};
