//! Products module (reference data).
//!
//! Products are read from the backend and snapshotted into drafts; this crate
//! never mutates them outside the explicit create/update payloads.

pub mod product;

pub use product::{NewProduct, Product, ProductChanges};
