//! Inventory adjustment workflow: new drafts, edit-in-place, quick stock
//! registration, finalize and resume.

use chrono::{DateTime, Utc};

use aquaroute_core::{AdjustmentId, Aggregate, AggregateRoot, DomainError, DomainResult, Money};
use aquaroute_gateway::{GatewayError, ListQuery, Record, RemoteItemSnapshot, SessionContext};
use aquaroute_inventory::{
    AdjustmentCommand, AdjustmentEvent, AdjustmentHeader, AdjustmentType, InventoryAdjustment,
    NewAdjustment,
};
use aquaroute_products::Product;

use crate::cache::ReadCache;
use crate::draft::{DraftBuilder, DraftLine, LinePolicy, ProductRef};
use crate::orchestrator::{
    AdjustmentCommit, CommitError, CommitOrchestrator, CommitPlan, CommitReceipt, CommitStep,
    HeaderStep, RemainingWork,
};
use crate::reconcile::pending_lines;
use crate::resources::Backend;

/// What `submit` should do after the lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitIntent {
    SaveDraft,
    Finalize,
}

/// Editing state of one adjustment, new or loaded.
///
/// A loaded adjustment keeps its remote working copy; every mutation is gated
/// through that copy's lifecycle, so a finalized adjustment rejects all edits
/// with `ImmutableState` and the editor stays as it was.
#[derive(Debug, Clone)]
pub struct AdjustmentEditor {
    header: Option<InventoryAdjustment>,
    kind: AdjustmentType,
    description: String,
    draft: DraftBuilder,
    remote_items: Vec<RemoteItemSnapshot>,
}

impl AdjustmentEditor {
    fn new(kind: AdjustmentType) -> Self {
        Self {
            header: None,
            kind,
            description: String::new(),
            draft: DraftBuilder::new(LinePolicy::Append),
            remote_items: Vec::new(),
        }
    }

    fn loaded(record: Record<InventoryAdjustment>) -> DomainResult<Self> {
        let header = record.attributes;
        let mut draft = DraftBuilder::new(LinePolicy::Append);
        for item in &record.related_items {
            draft.add_item(ProductRef::placeholder(item.product_id), i64::from(item.quantity))?;
        }
        Ok(Self {
            kind: header.kind(),
            description: header.description().unwrap_or_default().to_string(),
            header: Some(header),
            draft,
            remote_items: record.related_items,
        })
    }

    fn handle(&self, command: AdjustmentCommand) -> DomainResult<()> {
        match &self.header {
            Some(header) => header.handle(&command).map(|_| ()),
            None => Ok(()),
        }
    }

    fn ensure_mutable(&self) -> DomainResult<()> {
        match &self.header {
            Some(header) => header.ensure_mutable(),
            None => Ok(()),
        }
    }

    pub fn add_item(&mut self, product: impl Into<ProductRef>, quantity: i64) -> DomainResult<()> {
        let product = product.into();
        self.handle(AdjustmentCommand::AddItem {
            product_id: product.id,
            quantity,
        })?;
        self.draft.add_item(product, quantity)
    }

    pub fn update_quantity(&mut self, product: impl Into<ProductRef>, delta: i64) -> DomainResult<()> {
        self.ensure_mutable()?;
        self.draft.update_quantity(product, delta)
    }

    pub fn remove_item(&mut self, index: usize) -> DomainResult<DraftLine> {
        self.ensure_mutable()?;
        self.draft.remove_item(index)
    }

    pub fn set_type(&mut self, kind: AdjustmentType) -> DomainResult<()> {
        self.handle(AdjustmentCommand::UpdateHeader {
            kind,
            description: Some(self.description.clone()),
        })?;
        self.kind = kind;
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> DomainResult<()> {
        let description = description.into();
        self.handle(AdjustmentCommand::UpdateHeader {
            kind: self.kind,
            description: Some(description.clone()),
        })?;
        self.description = description;
        Ok(())
    }

    /// Swap placeholder product data for catalog data (names, prices).
    pub fn resolve_products(&mut self, products: &[Product]) {
        for product in products {
            self.draft.refresh_product(&ProductRef::from(product));
        }
    }

    pub fn id(&self) -> Option<AdjustmentId> {
        self.header.as_ref().map(AggregateRoot::id)
    }

    pub fn header(&self) -> Option<&InventoryAdjustment> {
        self.header.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        self.header.as_ref().is_some_and(InventoryAdjustment::is_finalized)
    }

    pub fn kind(&self) -> AdjustmentType {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn lines(&self) -> &[DraftLine] {
        self.draft.lines()
    }

    pub fn total(&self) -> Money {
        self.draft.total()
    }

    /// Items already committed remotely when the adjustment was opened.
    pub fn remote_items(&self) -> &[RemoteItemSnapshot] {
        &self.remote_items
    }

    /// Adopt the header a commit produced and record what the backend
    /// confirmed on it. The editor then tracks that adjustment: a later save
    /// updates it, and a finalized one rejects every mutation.
    fn committed(
        &mut self,
        receipt: &CommitReceipt<InventoryAdjustment>,
        lines: &[DraftLine],
        at: DateTime<Utc>,
    ) {
        let mut header = receipt.header.clone();
        for line in lines {
            header.apply(&AdjustmentEvent::ItemAdded {
                product_id: line.product_id(),
                quantity: line.quantity(),
            });
        }
        if receipt.finalized && !header.is_finalized() {
            header.apply(&AdjustmentEvent::Finalized { at });
        }

        self.kind = header.kind();
        self.description = header.description().unwrap_or_default().to_string();
        self.header = Some(header);
        self.draft.reset();
        self.remote_items.clear();
    }

    /// Lines a save would still create.
    pub fn pending_lines(&self) -> Vec<DraftLine> {
        pending_lines(&self.remote_items, self.draft.lines())
    }

    fn resolved_description(&self) -> String {
        match self.description.trim() {
            "" => self.kind.default_description().to_string(),
            text => text.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AdjustmentWorkflow {
    backend: Backend,
    session: SessionContext,
    orchestrator: CommitOrchestrator<AdjustmentCommit>,
}

impl AdjustmentWorkflow {
    pub fn new(backend: Backend, session: SessionContext, cache: ReadCache) -> Self {
        let orchestrator = CommitOrchestrator::new(
            backend.adjustments.clone(),
            backend.adjustment_items.clone(),
            cache,
        );
        Self {
            backend,
            session,
            orchestrator,
        }
    }

    pub fn new_draft(&self, kind: AdjustmentType) -> AdjustmentEditor {
        AdjustmentEditor::new(kind)
    }

    /// Load an adjustment (with its committed items) for editing.
    pub async fn open(&self, id: AdjustmentId) -> Result<AdjustmentEditor, CommitError> {
        let record = self.load(id).await?;
        Ok(AdjustmentEditor::loaded(record)?)
    }

    async fn load(&self, id: AdjustmentId) -> Result<Record<InventoryAdjustment>, CommitError> {
        self.backend
            .adjustments
            .get_with(id.get(), &ListQuery::new().related("items"))
            .await
            .map_err(header_read_failed)
    }

    /// Commit the editor: a new adjustment gets a header and every line; a
    /// loaded one gets a header update and only the lines not yet committed.
    pub async fn submit(
        &self,
        editor: &mut AdjustmentEditor,
        intent: SubmitIntent,
    ) -> Result<CommitReceipt<InventoryAdjustment>, CommitError> {
        if editor.draft.is_empty() {
            return Err(DomainError::validation("an adjustment needs at least one item").into());
        }
        let finalize = intent == SubmitIntent::Finalize;
        let description = editor.resolved_description();
        let at = Utc::now();

        let plan = match &editor.header {
            None => {
                let user_id = self.session.user_id().ok_or(DomainError::Unauthorized)?;
                CommitPlan::new(
                    HeaderStep::Create(NewAdjustment {
                        user_id,
                        kind: editor.kind,
                        description,
                    }),
                    editor.draft.lines().to_vec(),
                )
            }
            Some(header) => {
                if finalize {
                    header.handle(&AdjustmentCommand::Finalize { at })?;
                } else {
                    header.ensure_mutable()?;
                }
                CommitPlan::new(
                    HeaderStep::Update {
                        id: header.id().get(),
                        current: header.clone(),
                        payload: AdjustmentHeader {
                            kind: editor.kind,
                            description,
                        },
                    },
                    editor.pending_lines(),
                )
            }
        }
        .finalize(finalize);

        let lines = plan.lines.clone();
        let receipt = self.orchestrator.commit(plan).await?;
        editor.committed(&receipt, &lines, at);
        Ok(receipt)
    }

    /// Quick INPUT adjustment of one product: header, one item, finalize.
    pub async fn register_stock(
        &self,
        product: &Product,
        quantity: i64,
        description: Option<&str>,
    ) -> Result<CommitReceipt<InventoryAdjustment>, CommitError> {
        let mut draft = DraftBuilder::new(LinePolicy::Append);
        draft.add_item(product, quantity)?;
        let user_id = self.session.user_id().ok_or(DomainError::Unauthorized)?;

        let description = match description.map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => format!("Stock input: {}", product.name),
        };
        let plan = CommitPlan::new(
            HeaderStep::Create(NewAdjustment {
                user_id,
                kind: AdjustmentType::Input,
                description,
            }),
            draft.lines().to_vec(),
        )
        .finalize(true);

        self.orchestrator.commit(plan).await
    }

    /// Finalize a saved adjustment without touching its items.
    pub async fn finalize_existing(
        &self,
        id: AdjustmentId,
    ) -> Result<CommitReceipt<InventoryAdjustment>, CommitError> {
        let record = self.load(id).await?;
        record
            .attributes
            .handle(&AdjustmentCommand::Finalize { at: Utc::now() })?;

        let plan = CommitPlan::new(HeaderStep::Existing(record), Vec::new()).finalize(true);
        self.orchestrator.commit(plan).await
    }

    /// Re-issue exactly the steps a partial commit left undone.
    pub async fn resume(
        &self,
        remaining: RemainingWork,
    ) -> Result<CommitReceipt<InventoryAdjustment>, CommitError> {
        let record = self.load(AdjustmentId::new(remaining.header_id)).await?;
        record.attributes.ensure_mutable()?;

        let plan = CommitPlan::new(HeaderStep::Existing(record), remaining.lines).finalize(remaining.finalize);
        self.orchestrator.commit(plan).await
    }
}

fn header_read_failed(source: GatewayError) -> CommitError {
    CommitError::Transport {
        step: CommitStep::Header,
        source,
    }
}
