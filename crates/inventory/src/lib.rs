//! Inventory adjustments module.
//!
//! Holds the adjustment working copy and its lifecycle rules
//! (`Draft -> Finalized`, terminal), implemented purely as deterministic
//! domain logic (no IO, no HTTP, no storage). Applying the stock effect of a
//! finalized adjustment is the backend's job.

pub mod adjustment;

pub use adjustment::{
    AdjustmentCommand, AdjustmentEvent, AdjustmentHeader, AdjustmentItem, AdjustmentStatus,
    AdjustmentType, InventoryAdjustment, ItemQuantity, NewAdjustment, NewAdjustmentItem,
    stock_effect,
};
