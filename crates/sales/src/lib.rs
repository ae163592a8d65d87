//! Sales orders module.
//!
//! Order headers, their lines and the payloads used to create them. Orders are
//! owned by the backend; this crate holds no IO.

pub mod order;

pub use order::{NewOrder, NewOrderItem, Order, OrderChanges, OrderLineItem, OrderStatus};
