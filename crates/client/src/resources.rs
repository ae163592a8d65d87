//! Backend resource routes and the gateways serving them.

use std::sync::Arc;

use aquaroute_gateway::{Resource, ResourceGateway, RestGateway, RestTransport};
use aquaroute_inventory::{
    AdjustmentHeader, AdjustmentItem, InventoryAdjustment, ItemQuantity, NewAdjustment,
    NewAdjustmentItem,
};
use aquaroute_parties::{Client, NewClient};
use aquaroute_products::{NewProduct, Product, ProductChanges};
use aquaroute_sales::{NewOrder, NewOrderItem, Order, OrderChanges, OrderLineItem};

#[derive(Debug, Clone, Copy)]
pub struct ProductResource;

impl Resource for ProductResource {
    const PATH: &'static str = "products";
    type Attributes = Product;
    type Create = NewProduct;
    type Update = ProductChanges;
}

#[derive(Debug, Clone, Copy)]
pub struct ClientResource;

impl Resource for ClientResource {
    const PATH: &'static str = "clients";
    type Attributes = Client;
    type Create = NewClient;
    type Update = NewClient;
}

#[derive(Debug, Clone, Copy)]
pub struct AdjustmentResource;

impl Resource for AdjustmentResource {
    const PATH: &'static str = "inventory-adjustments";
    type Attributes = InventoryAdjustment;
    type Create = NewAdjustment;
    type Update = AdjustmentHeader;
}

#[derive(Debug, Clone, Copy)]
pub struct AdjustmentItemResource;

impl Resource for AdjustmentItemResource {
    const PATH: &'static str = "inventory-adjustment-items";
    type Attributes = AdjustmentItem;
    type Create = NewAdjustmentItem;
    type Update = ItemQuantity;
}

#[derive(Debug, Clone, Copy)]
pub struct OrderResource;

impl Resource for OrderResource {
    const PATH: &'static str = "orders";
    type Attributes = Order;
    type Create = NewOrder;
    type Update = OrderChanges;
}

#[derive(Debug, Clone, Copy)]
pub struct OrderItemResource;

impl Resource for OrderItemResource {
    const PATH: &'static str = "order-items";
    type Attributes = OrderLineItem;
    type Create = NewOrderItem;
    type Update = ItemQuantity;
}

/// One gateway per backend resource.
#[derive(Clone)]
pub struct Backend {
    pub products: Arc<dyn ResourceGateway<ProductResource>>,
    pub clients: Arc<dyn ResourceGateway<ClientResource>>,
    pub adjustments: Arc<dyn ResourceGateway<AdjustmentResource>>,
    pub adjustment_items: Arc<dyn ResourceGateway<AdjustmentItemResource>>,
    pub orders: Arc<dyn ResourceGateway<OrderResource>>,
    pub order_items: Arc<dyn ResourceGateway<OrderItemResource>>,
}

impl Backend {
    /// REST gateways sharing one transport (and so one session).
    pub fn rest(transport: RestTransport) -> Self {
        Self {
            products: Arc::new(RestGateway::<ProductResource>::new(transport.clone())),
            clients: Arc::new(RestGateway::<ClientResource>::new(transport.clone())),
            adjustments: Arc::new(RestGateway::<AdjustmentResource>::new(transport.clone())),
            adjustment_items: Arc::new(RestGateway::<AdjustmentItemResource>::new(transport.clone())),
            orders: Arc::new(RestGateway::<OrderResource>::new(transport.clone())),
            order_items: Arc::new(RestGateway::<OrderItemResource>::new(transport)),
        }
    }
}
