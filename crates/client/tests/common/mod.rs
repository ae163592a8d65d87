//! In-memory backend shared by the scenario tests.

#![allow(dead_code)]

use std::sync::Arc;

use aquaroute_client::{
    AdjustmentItemResource, AdjustmentResource, AppContext, Backend, ClientResource,
    OrderItemResource, OrderResource, ProductResource, ReadCache,
};
use aquaroute_core::{ProductId, UserId};
use aquaroute_gateway::{CallLog, GatewayError, InMemoryGateway, Role, SessionContext, SessionUser};
use aquaroute_inventory::{AdjustmentType, stock_effect};
use serde_json::{Value, json};

pub struct FakeBackend {
    pub log: CallLog,
    pub products: InMemoryGateway<ProductResource>,
    pub clients: InMemoryGateway<ClientResource>,
    pub adjustments: InMemoryGateway<AdjustmentResource>,
    pub adjustment_items: InMemoryGateway<AdjustmentItemResource>,
    pub orders: InMemoryGateway<OrderResource>,
    pub order_items: InMemoryGateway<OrderItemResource>,
}

impl FakeBackend {
    /// Backend whose `finalize` action marks the adjustment finalized and
    /// applies its net stock effect to the products, the way the real backend
    /// does.
    pub fn new() -> Self {
        let log = CallLog::new();
        let products = InMemoryGateway::<ProductResource>::new(log.clone());
        let adjustment_items = InMemoryGateway::<AdjustmentItemResource>::new(log.clone());

        let stock = products.clone();
        let items = adjustment_items.clone();
        let adjustments = InMemoryGateway::<AdjustmentResource>::new(log.clone())
            .with_defaults(json!({ "status": "draft" }))
            .with_related_items(&adjustment_items, "inventory_adjustment_id")
            .with_action_hook(move |id, name, record| {
                if name != "finalize" {
                    return Err(GatewayError::Api {
                        status: 404,
                        body: format!("unknown action {name}"),
                    });
                }
                if record["status"] == "finalized" {
                    return Err(GatewayError::Api {
                        status: 422,
                        body: "already finalized".to_string(),
                    });
                }
                let kind: AdjustmentType = serde_json::from_value(record["type"].clone())?;
                let lines = items
                    .records()?
                    .into_iter()
                    .filter(|(_, v)| v["inventory_adjustment_id"].as_u64() == Some(id))
                    .map(|(_, v)| {
                        let product = ProductId::new(v["product_id"].as_u64().unwrap_or_default());
                        let quantity = v["quantity"].as_u64().unwrap_or_default() as u32;
                        (product, quantity)
                    })
                    .collect::<Vec<_>>();
                for (product_id, delta) in stock_effect(kind, lines) {
                    stock.modify(product_id.get(), |p| {
                        let current = p["stock"].as_i64().unwrap_or_default();
                        p["stock"] = Value::from(current + delta);
                    })?;
                }
                record["status"] = Value::from("finalized");
                record["finalized_at"] = Value::from("2025-05-01 10:00:00");
                Ok(())
            });

        let orders = InMemoryGateway::<OrderResource>::new(log.clone());
        let order_items = InMemoryGateway::<OrderItemResource>::new(log.clone());

        Self {
            clients: InMemoryGateway::new(log.clone()),
            log,
            products,
            adjustments,
            adjustment_items,
            orders,
            order_items,
        }
    }

    pub fn backend(&self) -> Backend {
        Backend {
            products: Arc::new(self.products.clone()),
            clients: Arc::new(self.clients.clone()),
            adjustments: Arc::new(self.adjustments.clone()),
            adjustment_items: Arc::new(self.adjustment_items.clone()),
            orders: Arc::new(self.orders.clone()),
            order_items: Arc::new(self.order_items.clone()),
        }
    }

    pub fn app(&self, session: SessionContext) -> AppContext {
        AppContext::new(self.backend(), session, ReadCache::default())
    }

    pub fn seed_product(&self, name: &str, price: &str, stock: i64) -> u64 {
        self.products
            .seed(json!({
                "name": name,
                "sku": name.to_uppercase().replace(' ', "-"),
                "unit_type": "unit",
                "sale_price": price,
                "stock": stock,
            }))
            .unwrap()
    }

    pub fn seed_client(&self, name: &str) -> u64 {
        self.clients.seed(json!({ "name": name, "phone": "555-0100" })).unwrap()
    }

    pub fn stock_of(&self, product_id: u64) -> i64 {
        self.products.snapshot(product_id).unwrap()["stock"].as_i64().unwrap()
    }
}

pub fn driver_session() -> SessionContext {
    SessionContext::signed_in(
        "test-token",
        SessionUser {
            id: UserId::new(3),
            name: "Rosa".to_string(),
            email: "rosa@example.com".to_string(),
            role: Role::Repartidor,
        },
    )
}
