//! Parties module: the clients orders are sold to.

pub mod client;

pub use client::{Client, NewClient};
