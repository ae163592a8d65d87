//! `aquaroute-client`: transaction assembly and commit core of the
//! distribution app.
//!
//! Lines are collected in a [`draft::DraftBuilder`], reconciled against what
//! the backend already holds, and committed by the
//! [`orchestrator::CommitOrchestrator`] as an ordered series of gateway calls.

pub mod adjustments;
pub mod app;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod draft;
pub mod orchestrator;
pub mod orders;
pub mod reconcile;
pub mod resources;

pub use adjustments::{AdjustmentEditor, AdjustmentWorkflow, SubmitIntent};
pub use app::AppContext;
pub use cache::{Collection, ReadCache};
pub use catalog::{Catalog, CatalogError};
pub use config::{ClientConfig, ConfigError};
pub use draft::{DraftBuilder, DraftLine, LinePolicy, ProductRef};
pub use orchestrator::{
    AdjustmentCommit, CommitError, CommitOrchestrator, CommitPlan, CommitProgress, CommitReceipt,
    CommitStep, HeaderStep, OrderCommit, RemainingWork, TransactionKind,
};
pub use orders::{Cart, OrderWorkflow};
pub use reconcile::pending_lines;
pub use resources::{
    AdjustmentItemResource, AdjustmentResource, Backend, ClientResource, OrderItemResource,
    OrderResource, ProductResource,
};
