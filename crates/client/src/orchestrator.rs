//! Commit orchestrator.
//!
//! Runs one draft against the backend as an ordered sequence of independent
//! calls:
//!
//! 1. header step: create, update, or reuse an already loaded header;
//! 2. item steps: one create per line, strictly sequential, in draft order;
//! 3. finalize step (optional): only after every item step succeeded.
//!
//! The backend has no multi-step transaction, so the first failure stops the
//! sequence and nothing is rolled back. A step that fails before this commit
//! wrote anything (the header step, or a lone finalize on an existing header)
//! is a [`CommitError::Transport`]; any later failure is reported as a
//! [`CommitError::PartialCommit`] that carries the work still left to do.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use aquaroute_core::{AdjustmentId, DomainError, OrderId};
use aquaroute_gateway::{GatewayError, Record, Resource, ResourceGateway};
use aquaroute_inventory::{InventoryAdjustment, NewAdjustmentItem};
use aquaroute_sales::{NewOrderItem, Order};

use crate::cache::{Collection, ReadCache};
use crate::draft::DraftLine;
use crate::resources::{AdjustmentItemResource, AdjustmentResource, OrderItemResource, OrderResource};

type HeaderAttrs<K> = <<K as TransactionKind>::Header as Resource>::Attributes;
type HeaderCreate<K> = <<K as TransactionKind>::Header as Resource>::Create;
type HeaderUpdate<K> = <<K as TransactionKind>::Header as Resource>::Update;
type ItemCreate<K> = <<K as TransactionKind>::Item as Resource>::Create;

/// A header/lines transaction type the orchestrator can commit.
pub trait TransactionKind: Send + Sync + 'static {
    type Header: Resource;
    type Item: Resource;

    /// Name used in logs.
    const NAME: &'static str;

    /// Action invoked by the finalize step; `None` when the kind has none.
    const FINALIZE_ACTION: Option<&'static str>;

    /// Cached collections made stale by a commit of this kind.
    const AFFECTED: &'static [Collection];

    /// Create payload for one line of header `header_id`.
    fn item_payload(header_id: u64, line: &DraftLine) -> ItemCreate<Self>;

    /// Whether the header is in a terminal state (no items, no finalize).
    fn is_locked(header: &HeaderAttrs<Self>) -> bool;
}

/// Inventory adjustment: header, `inventory-adjustment-items`, `finalize`.
#[derive(Debug, Clone, Copy)]
pub struct AdjustmentCommit;

impl TransactionKind for AdjustmentCommit {
    type Header = AdjustmentResource;
    type Item = AdjustmentItemResource;

    const NAME: &'static str = "inventory_adjustment";
    const FINALIZE_ACTION: Option<&'static str> = Some("finalize");
    const AFFECTED: &'static [Collection] = &[Collection::Adjustments, Collection::Products];

    fn item_payload(header_id: u64, line: &DraftLine) -> NewAdjustmentItem {
        NewAdjustmentItem {
            inventory_adjustment_id: AdjustmentId::new(header_id),
            product_id: line.product_id(),
            quantity: line.quantity(),
        }
    }

    fn is_locked(header: &InventoryAdjustment) -> bool {
        header.is_finalized()
    }
}

/// Sales order: header then `order-items`, never finalized.
#[derive(Debug, Clone, Copy)]
pub struct OrderCommit;

impl TransactionKind for OrderCommit {
    type Header = OrderResource;
    type Item = OrderItemResource;

    const NAME: &'static str = "order";
    const FINALIZE_ACTION: Option<&'static str> = None;
    const AFFECTED: &'static [Collection] = &[Collection::Orders, Collection::Products];

    fn item_payload(header_id: u64, line: &DraftLine) -> NewOrderItem {
        NewOrderItem {
            order_id: OrderId::new(header_id),
            product_id: line.product_id(),
            quantity: line.quantity(),
            price_at_time: line.product().unit_price,
        }
    }

    fn is_locked(header: &Order) -> bool {
        !header.is_modifiable()
    }
}

/// How the header step obtains its header.
pub enum HeaderStep<K: TransactionKind> {
    Create(HeaderCreate<K>),
    /// Update of a loaded header; `current` is checked for the lock before
    /// the update is sent.
    Update {
        id: u64,
        current: HeaderAttrs<K>,
        payload: HeaderUpdate<K>,
    },
    /// Header already loaded by the caller; no header call is made.
    Existing(Record<HeaderAttrs<K>>),
}

impl<K: TransactionKind> HeaderStep<K> {
    fn label(&self) -> &'static str {
        match self {
            HeaderStep::Create(_) => "create",
            HeaderStep::Update { .. } => "update",
            HeaderStep::Existing(_) => "existing",
        }
    }
}

/// Everything one commit will do, decided up front.
pub struct CommitPlan<K: TransactionKind> {
    pub header: HeaderStep<K>,
    pub lines: Vec<DraftLine>,
    pub finalize: bool,
}

impl<K: TransactionKind> CommitPlan<K> {
    pub fn new(header: HeaderStep<K>, lines: Vec<DraftLine>) -> Self {
        Self {
            header,
            lines,
            finalize: false,
        }
    }

    pub fn finalize(mut self, finalize: bool) -> Self {
        self.finalize = finalize;
        self
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.finalize && K::FINALIZE_ACTION.is_none() {
            return Err(DomainError::validation(format!(
                "{} has no finalize action",
                K::NAME
            )));
        }
        if matches!(self.header, HeaderStep::Existing(_)) && self.lines.is_empty() && !self.finalize {
            return Err(DomainError::validation("nothing to commit"));
        }
        Ok(())
    }
}

/// A step of the commit sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStep {
    Header,
    /// Zero-based position in the plan's line list.
    Item { index: usize },
    Finalize,
}

impl fmt::Display for CommitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitStep::Header => f.write_str("header step"),
            CommitStep::Item { index } => write!(f, "item step {}", index + 1),
            CommitStep::Finalize => f.write_str("finalize step"),
        }
    }
}

/// How far a commit got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitProgress {
    pub header_id: u64,
    pub completed_item_steps: usize,
    pub total_item_steps: usize,
    /// Server ids of the created items, in creation order.
    pub item_ids: Vec<u64>,
    pub finalized: bool,
}

impl fmt::Display for CommitProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "header {}, {}/{} item steps done",
            self.header_id, self.completed_item_steps, self.total_item_steps
        )
    }
}

/// Work left over by a partial commit, enough to resume it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemainingWork {
    pub header_id: u64,
    pub lines: Vec<DraftLine>,
    pub finalize: bool,
}

/// Outcome of a fully successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt<H> {
    pub commit_id: Uuid,
    pub header_id: u64,
    /// Header as returned by the header step, before any finalize.
    pub header: H,
    pub item_ids: Vec<u64>,
    pub finalized: bool,
}

#[derive(Debug, Error)]
pub enum CommitError {
    /// Rejected locally; no network call was made for it.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The step failed before this commit wrote anything.
    #[error("{step} failed: {source}")]
    Transport {
        step: CommitStep,
        #[source]
        source: GatewayError,
    },

    /// The header (and maybe some items) exist remotely, a later step failed.
    #[error("partial commit ({progress}): {failed_step} failed: {source}")]
    PartialCommit {
        progress: CommitProgress,
        failed_step: CommitStep,
        remaining: RemainingWork,
        #[source]
        source: GatewayError,
    },
}

impl CommitError {
    pub fn is_partial(&self) -> bool {
        matches!(self, CommitError::PartialCommit { .. })
    }

    pub fn progress(&self) -> Option<&CommitProgress> {
        match self {
            CommitError::PartialCommit { progress, .. } => Some(progress),
            _ => None,
        }
    }

    pub fn remaining(&self) -> Option<&RemainingWork> {
        match self {
            CommitError::PartialCommit { remaining, .. } => Some(remaining),
            _ => None,
        }
    }

    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            CommitError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

pub struct CommitOrchestrator<K: TransactionKind> {
    headers: Arc<dyn ResourceGateway<K::Header>>,
    items: Arc<dyn ResourceGateway<K::Item>>,
    cache: ReadCache,
}

impl<K: TransactionKind> Clone for CommitOrchestrator<K> {
    fn clone(&self) -> Self {
        Self {
            headers: Arc::clone(&self.headers),
            items: Arc::clone(&self.items),
            cache: self.cache.clone(),
        }
    }
}

impl<K: TransactionKind> CommitOrchestrator<K> {
    pub fn new(
        headers: Arc<dyn ResourceGateway<K::Header>>,
        items: Arc<dyn ResourceGateway<K::Item>>,
        cache: ReadCache,
    ) -> Self {
        Self {
            headers,
            items,
            cache,
        }
    }

    /// Execute `plan`, stopping at the first failed step.
    pub async fn commit(
        &self,
        plan: CommitPlan<K>,
    ) -> Result<CommitReceipt<HeaderAttrs<K>>, CommitError> {
        plan.validate()?;

        let commit_id = Uuid::now_v7();
        let span = tracing::info_span!(
            "commit",
            kind = K::NAME,
            %commit_id,
            header = plan.header.label(),
            lines = plan.lines.len(),
            finalize = plan.finalize,
        );
        self.run(commit_id, plan).instrument(span).await
    }

    async fn run(
        &self,
        commit_id: Uuid,
        plan: CommitPlan<K>,
    ) -> Result<CommitReceipt<HeaderAttrs<K>>, CommitError> {
        let CommitPlan {
            header,
            lines,
            finalize,
        } = plan;

        tracing::debug!(step = %CommitStep::Header, "starting");
        let (header, wrote_header) = match header {
            HeaderStep::Create(payload) => (self.headers.create(&payload).await, true),
            HeaderStep::Update {
                id,
                current,
                payload,
            } => {
                if K::is_locked(&current) {
                    return Err(locked::<K>(id, finalize).into());
                }
                (self.headers.update(id, &payload).await, true)
            }
            HeaderStep::Existing(record) => (Ok(record), false),
        };
        let header = header.map_err(|source| {
            tracing::warn!(step = %CommitStep::Header, "commit aborted: {source}");
            CommitError::Transport {
                step: CommitStep::Header,
                source,
            }
        })?;
        let header_id = header.id;
        tracing::debug!(header_id, "header step done");

        if K::is_locked(&header.attributes) {
            if wrote_header {
                self.invalidate().await;
            }
            return Err(locked::<K>(header_id, finalize).into());
        }

        let mut progress = CommitProgress {
            header_id,
            completed_item_steps: 0,
            total_item_steps: lines.len(),
            item_ids: Vec::with_capacity(lines.len()),
            finalized: false,
        };

        for (index, line) in lines.iter().enumerate() {
            let step = CommitStep::Item { index };
            let payload = K::item_payload(header_id, line);
            match self.items.create(&payload).await {
                Ok(record) => {
                    progress.completed_item_steps += 1;
                    progress.item_ids.push(record.id);
                    tracing::debug!(header_id, %step, item_id = record.id, "item created");
                }
                Err(source) => {
                    tracing::warn!(
                        header_id,
                        %step,
                        completed_item_steps = progress.completed_item_steps,
                        "partial commit: {source}"
                    );
                    self.invalidate().await;
                    return Err(CommitError::PartialCommit {
                        remaining: RemainingWork {
                            header_id,
                            lines: lines[index..].to_vec(),
                            finalize,
                        },
                        progress,
                        failed_step: step,
                        source,
                    });
                }
            }
        }

        if let (true, Some(action)) = (finalize, K::FINALIZE_ACTION) {
            if let Err(source) = self.headers.action(header_id, action).await {
                if !wrote_header && progress.completed_item_steps == 0 {
                    tracing::warn!(header_id, step = %CommitStep::Finalize, "commit aborted: {source}");
                    return Err(CommitError::Transport {
                        step: CommitStep::Finalize,
                        source,
                    });
                }
                tracing::warn!(
                    header_id,
                    step = %CommitStep::Finalize,
                    completed_item_steps = progress.completed_item_steps,
                    "partial commit: {source}"
                );
                self.invalidate().await;
                return Err(CommitError::PartialCommit {
                    remaining: RemainingWork {
                        header_id,
                        lines: Vec::new(),
                        finalize: true,
                    },
                    progress,
                    failed_step: CommitStep::Finalize,
                    source,
                });
            }
            progress.finalized = true;
        }

        self.invalidate().await;
        tracing::info!(
            header_id,
            completed_item_steps = progress.completed_item_steps,
            finalized = progress.finalized,
            "commit complete"
        );

        Ok(CommitReceipt {
            commit_id,
            header_id,
            header: header.attributes,
            item_ids: progress.item_ids,
            finalized: progress.finalized,
        })
    }

    async fn invalidate(&self) {
        self.cache.invalidate_all(K::AFFECTED).await;
    }
}

fn locked<K: TransactionKind>(header_id: u64, finalize: bool) -> DomainError {
    if finalize {
        DomainError::AlreadyFinalized(header_id)
    } else {
        DomainError::immutable(format!("{} {header_id} no longer accepts items", K::NAME))
    }
}
