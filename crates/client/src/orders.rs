//! Sales order workflow: cart assembly and order commit.

use aquaroute_core::{DomainError, DomainResult, Money, OrderId};
use aquaroute_gateway::SessionContext;
use aquaroute_parties::Client;
use aquaroute_products::Product;
use aquaroute_sales::{NewOrder, Order, OrderChanges, OrderStatus};

use crate::cache::{Collection, ReadCache};
use crate::draft::{DraftBuilder, DraftLine, LinePolicy, ProductRef};
use crate::orchestrator::{
    CommitError, CommitOrchestrator, CommitPlan, CommitReceipt, CommitStep, HeaderStep, OrderCommit,
    RemainingWork,
};
use crate::resources::Backend;

/// Cart under assembly: one client and merged product lines.
///
/// Each line keeps the sale price seen when the product was first added.
#[derive(Debug, Clone)]
pub struct Cart {
    client: Option<Client>,
    draft: DraftBuilder,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    pub fn new() -> Self {
        Self {
            client: None,
            draft: DraftBuilder::new(LinePolicy::MergeByProduct),
        }
    }

    pub fn set_client(&mut self, client: Client) {
        self.client = Some(client);
    }

    pub fn clear_client(&mut self) {
        self.client = None;
    }

    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    pub fn add_item(&mut self, product: &Product, quantity: i64) -> DomainResult<()> {
        self.draft.add_item(product, quantity)
    }

    pub fn update_quantity(&mut self, product: &Product, delta: i64) -> DomainResult<()> {
        self.draft.update_quantity(ProductRef::from(product), delta)
    }

    pub fn remove_item(&mut self, index: usize) -> DomainResult<DraftLine> {
        self.draft.remove_item(index)
    }

    pub fn lines(&self) -> &[DraftLine] {
        self.draft.lines()
    }

    pub fn is_empty(&self) -> bool {
        self.draft.is_empty()
    }

    pub fn total(&self) -> Money {
        self.draft.total()
    }

    /// Drop every line and the client.
    pub fn reset(&mut self) {
        self.draft.reset();
        self.client = None;
    }
}

#[derive(Clone)]
pub struct OrderWorkflow {
    backend: Backend,
    session: SessionContext,
    cache: ReadCache,
    orchestrator: CommitOrchestrator<OrderCommit>,
}

impl OrderWorkflow {
    pub fn new(backend: Backend, session: SessionContext, cache: ReadCache) -> Self {
        let orchestrator =
            CommitOrchestrator::new(backend.orders.clone(), backend.order_items.clone(), cache.clone());
        Self {
            backend,
            session,
            cache,
            orchestrator,
        }
    }

    /// Send the cart as a pending order: header with the cart total, then one
    /// `order-items` create per line. The cart is emptied on success.
    pub async fn submit(&self, cart: &mut Cart) -> Result<CommitReceipt<Order>, CommitError> {
        let client = cart
            .client
            .as_ref()
            .ok_or_else(|| DomainError::validation("select a client before placing the order"))?;
        if cart.is_empty() {
            return Err(DomainError::validation("an order needs at least one product").into());
        }
        let user_id = self.session.user_id().ok_or(DomainError::Unauthorized)?;

        let plan = CommitPlan::new(
            HeaderStep::Create(NewOrder {
                client_id: client.id,
                user_id,
                total_amount: cart.total(),
                status: OrderStatus::Pending,
            }),
            cart.lines().to_vec(),
        );

        let receipt = self.orchestrator.commit(plan).await?;
        cart.reset();
        Ok(receipt)
    }

    /// Create the line items a partial order commit left undone.
    pub async fn resume(&self, remaining: RemainingWork) -> Result<CommitReceipt<Order>, CommitError> {
        let record = self
            .backend
            .orders
            .get(remaining.header_id)
            .await
            .map_err(|source| CommitError::Transport {
                step: CommitStep::Header,
                source,
            })?;
        record.attributes.ensure_modifiable()?;

        let plan = CommitPlan::new(HeaderStep::Existing(record), remaining.lines).finalize(remaining.finalize);
        self.orchestrator.commit(plan).await
    }

    /// Move a pending order to `status`. Delivered and cancelled orders are
    /// terminal.
    pub async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, CommitError> {
        let transport = |source| CommitError::Transport {
            step: CommitStep::Header,
            source,
        };
        let current = self.backend.orders.get(id.get()).await.map_err(transport)?;
        current.attributes.ensure_modifiable()?;

        let updated = self
            .backend
            .orders
            .update(id.get(), &OrderChanges { status })
            .await
            .map_err(transport)?;
        self.cache.invalidate(Collection::Orders).await;
        tracing::info!(order_id = updated.id, ?status, "order status changed");
        Ok(updated.into_attributes())
    }
}
