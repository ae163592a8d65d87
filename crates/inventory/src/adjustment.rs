use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aquaroute_core::time::lenient_timestamp;
use aquaroute_core::{
    Aggregate, AggregateRoot, AdjustmentId, AdjustmentItemId, DomainError, ProductId, UserId,
};

/// Direction of an adjustment's stock effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentType {
    Input,
    Output,
}

impl AdjustmentType {
    /// Signed stock delta for `quantity` units (+ for input, - for output).
    pub fn signed(self, quantity: u32) -> i64 {
        match self {
            AdjustmentType::Input => i64::from(quantity),
            AdjustmentType::Output => -i64::from(quantity),
        }
    }

    pub fn default_description(self) -> &'static str {
        match self {
            AdjustmentType::Input => "Stock input adjustment",
            AdjustmentType::Output => "Stock output adjustment",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdjustmentType::Input => "input",
            AdjustmentType::Output => "output",
        }
    }
}

/// Adjustment status lifecycle: `Draft -> Finalized` (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentStatus {
    Draft,
    Finalized,
}

/// Net per-product stock delta of applying `items` in direction `kind`.
pub fn stock_effect(
    kind: AdjustmentType,
    items: impl IntoIterator<Item = (ProductId, u32)>,
) -> BTreeMap<ProductId, i64> {
    let mut effect = BTreeMap::new();
    for (product_id, quantity) in items {
        *effect.entry(product_id).or_insert(0) += kind.signed(quantity);
    }
    effect
}

/// Working copy of a backend-owned inventory adjustment header.
///
/// Decoded straight from the backend attributes; the lifecycle rules live in
/// the [`Aggregate`] implementation below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryAdjustment {
    id: AdjustmentId,
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(rename = "type")]
    kind: AdjustmentType,
    #[serde(default)]
    description: Option<String>,
    status: AdjustmentStatus,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    finalized_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    version: u64,
}

impl InventoryAdjustment {
    /// A draft working copy (as returned right after header creation).
    pub fn draft(id: AdjustmentId, kind: AdjustmentType, description: Option<String>) -> Self {
        Self {
            id,
            user_id: None,
            kind,
            description,
            status: AdjustmentStatus::Draft,
            finalized_at: None,
            created_at: None,
            version: 0,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn kind(&self) -> AdjustmentType {
        self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> AdjustmentStatus {
        self.status
    }

    pub fn finalized_at(&self) -> Option<DateTime<Utc>> {
        self.finalized_at
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn is_finalized(&self) -> bool {
        self.status == AdjustmentStatus::Finalized
    }

    /// Every mutation (item add, header update, finalize) requires `Draft`.
    pub fn ensure_mutable(&self) -> Result<(), DomainError> {
        if self.is_finalized() {
            return Err(DomainError::immutable(format!(
                "adjustment {} is finalized",
                self.id
            )));
        }
        Ok(())
    }
}

impl AggregateRoot for InventoryAdjustment {
    type Id = AdjustmentId;

    fn id(&self) -> AdjustmentId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjustmentCommand {
    UpdateHeader {
        kind: AdjustmentType,
        description: Option<String>,
    },
    AddItem {
        product_id: ProductId,
        quantity: i64,
    },
    Finalize {
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjustmentEvent {
    HeaderUpdated {
        kind: AdjustmentType,
        description: Option<String>,
    },
    ItemAdded {
        product_id: ProductId,
        quantity: u32,
    },
    Finalized {
        at: DateTime<Utc>,
    },
}

impl Aggregate for InventoryAdjustment {
    type Command = AdjustmentCommand;
    type Event = AdjustmentEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AdjustmentEvent::HeaderUpdated { kind, description } => {
                self.kind = *kind;
                self.description = description.clone();
            }
            // lines live in their own resource
            AdjustmentEvent::ItemAdded { .. } => {}
            AdjustmentEvent::Finalized { at } => {
                self.status = AdjustmentStatus::Finalized;
                self.finalized_at = Some(*at);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        self.ensure_mutable()?;

        match command {
            AdjustmentCommand::UpdateHeader { kind, description } => {
                Ok(vec![AdjustmentEvent::HeaderUpdated {
                    kind: *kind,
                    description: description.clone(),
                }])
            }
            AdjustmentCommand::AddItem {
                product_id,
                quantity,
            } => {
                let quantity = u32::try_from(*quantity)
                    .ok()
                    .filter(|q| *q > 0)
                    .ok_or(DomainError::InvalidQuantity(*quantity))?;
                Ok(vec![AdjustmentEvent::ItemAdded {
                    product_id: *product_id,
                    quantity,
                }])
            }
            AdjustmentCommand::Finalize { at } => Ok(vec![AdjustmentEvent::Finalized { at: *at }]),
        }
    }
}

/// One line of an adjustment as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentItem {
    pub id: AdjustmentItemId,
    pub inventory_adjustment_id: AdjustmentId,
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload: create an adjustment header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAdjustment {
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: AdjustmentType,
    pub description: String,
}

/// Payload: update an adjustment header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentHeader {
    #[serde(rename = "type")]
    pub kind: AdjustmentType,
    pub description: String,
}

/// Payload: create one adjustment line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAdjustmentItem {
    pub inventory_adjustment_id: AdjustmentId,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Payload: change the quantity of an existing adjustment line.
///
/// Update payload of the item routes. Committed lines are never edited here;
/// reconciliation only adds lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuantity {
    pub quantity: u32,
}
