mod common;

use aquaroute_client::{Cart, CommitOrchestrator, CommitPlan, HeaderStep, OrderCommit, ReadCache};
use aquaroute_core::{ClientId, DomainError, Money, OrderId, ProductId, UserId};
use aquaroute_gateway::CallOp;
use aquaroute_sales::{NewOrder, OrderStatus};

use common::{FakeBackend, driver_session};

#[tokio::test]
async fn submit_sends_total_then_one_item_per_line() {
    let fake = FakeBackend::new();
    let water = fake.seed_product("Water 20L", "25.00", 100);
    let ice = fake.seed_product("Ice bag", "12.50", 100);
    let client = fake.seed_client("Tienda La Esquina");
    let app = fake.app(driver_session());
    let catalog = app.catalog();

    let mut cart = Cart::new();
    cart.set_client(catalog.clients("esquina").await.unwrap().remove(0));
    let water = catalog.product(ProductId::new(water)).await.unwrap();
    let ice = catalog.product(ProductId::new(ice)).await.unwrap();
    cart.add_item(&water, 2).unwrap();
    cart.update_quantity(&ice, 1).unwrap();
    cart.update_quantity(&ice, 3).unwrap();
    cart.add_item(&water, 1).unwrap();
    assert_eq!(cart.lines().len(), 2);
    assert_eq!(cart.total(), Money::from_cents(3 * 2500 + 4 * 1250));

    let receipt = app.orders().submit(&mut cart).await.unwrap();
    assert!(cart.is_empty());
    assert!(cart.client().is_none());
    assert!(!receipt.finalized);

    let order = fake.orders.snapshot(receipt.header_id).unwrap();
    assert_eq!(order["client_id"], client);
    assert_eq!(order["user_id"], 3);
    assert_eq!(order["total_amount"], "125.00");
    assert_eq!(order["status"], "pending");

    let items: Vec<_> = fake
        .order_items
        .records()
        .unwrap()
        .into_iter()
        .map(|(_, v)| {
            (
                v["product_id"].as_u64().unwrap(),
                v["quantity"].as_u64().unwrap(),
                v["price_at_time"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        items,
        vec![(1, 3, "25.00".to_string()), (2, 4, "12.50".to_string())]
    );
    assert_eq!(fake.log.count("order-items", &CallOp::Create), 2);
}

#[tokio::test]
async fn price_is_captured_when_the_line_is_added() {
    let fake = FakeBackend::new();
    let water = fake.seed_product("Water 20L", "25.00", 100);
    fake.seed_client("Ana");
    let app = fake.app(driver_session());
    let catalog = app.catalog();

    let mut cart = Cart::new();
    cart.set_client(catalog.clients("").await.unwrap().remove(0));
    let before = catalog.product(ProductId::new(water)).await.unwrap();
    cart.add_item(&before, 1).unwrap();

    fake.products
        .modify(water, |p| p["sale_price"] = "30.00".into())
        .unwrap();
    let mut after = before.clone();
    after.sale_price = "30.00".parse().unwrap();
    cart.add_item(&after, 1).unwrap();

    assert_eq!(cart.total(), Money::from_cents(5000));
    let receipt = app.orders().submit(&mut cart).await.unwrap();
    let order = fake.orders.snapshot(receipt.header_id).unwrap();
    assert_eq!(order["total_amount"], "50.00");
}

#[tokio::test]
async fn incomplete_carts_are_rejected_locally() {
    let fake = FakeBackend::new();
    let water = fake.seed_product("Water 20L", "25.00", 100);
    fake.seed_client("Ana");
    let app = fake.app(driver_session());
    let catalog = app.catalog();
    let product = catalog.product(ProductId::new(water)).await.unwrap();
    fake.log.clear();

    let mut cart = Cart::new();
    cart.add_item(&product, 1).unwrap();
    let err = app.orders().submit(&mut cart).await.unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::Validation(_))));

    cart.set_client(catalog.clients("").await.unwrap().remove(0));
    cart.remove_item(0).unwrap();
    let err = app.orders().submit(&mut cart).await.unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::Validation(_))));

    assert!(fake.log.writes().is_empty());
}

#[tokio::test]
async fn partial_order_can_be_resumed() {
    let fake = FakeBackend::new();
    let water = fake.seed_product("Water 20L", "25.00", 100);
    let ice = fake.seed_product("Ice bag", "12.50", 100);
    fake.seed_client("Ana");
    let app = fake.app(driver_session());
    let catalog = app.catalog();

    let mut cart = Cart::new();
    cart.set_client(catalog.clients("").await.unwrap().remove(0));
    cart.add_item(&catalog.product(ProductId::new(water)).await.unwrap(), 1).unwrap();
    cart.add_item(&catalog.product(ProductId::new(ice)).await.unwrap(), 2).unwrap();
    fake.order_items.fail_create_call(2);

    let err = app.orders().submit(&mut cart).await.unwrap_err();
    let progress = err.progress().unwrap();
    assert_eq!(progress.completed_item_steps, 1);
    let remaining = err.remaining().unwrap().clone();
    assert_eq!(remaining.lines.len(), 1);
    assert!(!remaining.finalize);
    assert_eq!(cart.lines().len(), 2);

    let receipt = app.orders().resume(remaining).await.unwrap();
    assert_eq!(receipt.header_id, progress.header_id);
    assert_eq!(fake.order_items.records().unwrap().len(), 2);
}

#[tokio::test]
async fn orders_have_no_finalize_step() {
    let fake = FakeBackend::new();
    let backend = fake.backend();
    let orchestrator = CommitOrchestrator::<OrderCommit>::new(
        backend.orders.clone(),
        backend.order_items.clone(),
        ReadCache::default(),
    );

    let plan = CommitPlan::new(
        HeaderStep::Create(NewOrder {
            client_id: ClientId::new(1),
            user_id: UserId::new(1),
            total_amount: Money::ZERO,
            status: OrderStatus::Pending,
        }),
        Vec::new(),
    )
    .finalize(true);
    let err = orchestrator.commit(plan).await.unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::Validation(_))));
    assert!(fake.log.calls().is_empty());
}

#[tokio::test]
async fn only_pending_orders_change_status() {
    let fake = FakeBackend::new();
    let id = fake
        .orders
        .seed(serde_json::json!({ "client_id": 1, "total_amount": "10.00", "status": "pending" }))
        .unwrap();
    let orders = fake.app(driver_session()).orders();

    let delivered = orders.set_status(OrderId::new(id), OrderStatus::Delivered).await.unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);

    let err = orders
        .set_status(OrderId::new(id), OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::ImmutableState(_))));
    assert_eq!(fake.orders.snapshot(id).unwrap()["status"], "delivered");
}
