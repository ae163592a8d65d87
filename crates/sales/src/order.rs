use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aquaroute_core::time::lenient_timestamp;
use aquaroute_core::{ClientId, DomainError, Money, OrderId, OrderItemId, ProductId, UserId};

/// Sales order status lifecycle.
///
/// `Pending` is the only modifiable state; `Delivered` and `Cancelled` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// Order line: product, quantity and the unit price captured when the line was
/// added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    #[serde(default)]
    pub id: Option<OrderItemId>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price_at_time: Money,
}

impl OrderLineItem {
    pub fn amount(&self) -> Money {
        self.price_at_time.times(self.quantity)
    }
}

/// Backend-owned sales order header (with inline lines when the route embeds them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub client_id: ClientId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub total_amount: Money,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderLineItem>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn is_modifiable(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn ensure_modifiable(&self) -> Result<(), DomainError> {
        if !self.is_modifiable() {
            return Err(DomainError::immutable(format!(
                "order {} is {:?}",
                self.id, self.status
            )));
        }
        Ok(())
    }
}

/// Payload: create an order header.
///
/// `total_amount` is computed client-side and trusted as sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub client_id: ClientId,
    pub user_id: UserId,
    pub total_amount: Money,
    pub status: OrderStatus,
}

/// Payload: change an order's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChanges {
    pub status: OrderStatus,
}

/// Payload: create one order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price_at_time: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_order_with_inline_items() {
        let json = r#"{
            "id": 4,
            "client_id": "2",
            "user_id": 1,
            "total_amount": "7500.00",
            "status": "pending",
            "items": [
                {"id": 10, "order_id": 4, "product_id": 3, "quantity": 3, "price_at_time": "2500.00"}
            ],
            "created_at": "2025-04-02T12:00:00Z"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.client_id, ClientId::new(2));
        assert_eq!(order.items.len(), 1);
        let lines: Money = order.items.iter().map(OrderLineItem::amount).sum();
        assert_eq!(lines, order.total_amount);
        assert!(order.is_modifiable());
    }

    #[test]
    fn missing_items_decode_as_empty() {
        let json = r#"{"id": 1, "client_id": 1, "total_amount": "0.00", "status": "delivered"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert!(order.items.is_empty());
        assert!(matches!(
            order.ensure_modifiable(),
            Err(DomainError::ImmutableState(_))
        ));
    }

    #[test]
    fn terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }
}
