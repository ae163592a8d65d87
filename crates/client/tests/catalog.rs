mod common;

use aquaroute_client::CatalogError;
use aquaroute_core::{DomainError, Money, ProductId};
use aquaroute_gateway::{CallOp, GatewayError};
use aquaroute_parties::NewClient;
use aquaroute_products::{NewProduct, ProductChanges};

use common::{FakeBackend, driver_session};

#[tokio::test]
async fn reads_are_cached_until_a_write_invalidates_them() {
    let fake = FakeBackend::new();
    fake.seed_product("Water 20L", "25.00", 10);
    let catalog = fake.app(driver_session()).catalog();

    assert_eq!(catalog.products().await.unwrap().len(), 1);
    assert_eq!(catalog.products().await.unwrap().len(), 1);
    assert_eq!(fake.log.count("products", &CallOp::List), 1);

    let created = catalog
        .create_product(NewProduct {
            name: "Ice bag".to_string(),
            sku: "ICE-5KG".to_string(),
            unit_type: "bag".to_string(),
            sale_price: Money::from_cents(1250),
        })
        .await
        .unwrap();
    assert_eq!(created.id, ProductId::new(2));

    assert_eq!(catalog.products().await.unwrap().len(), 2);
    assert_eq!(fake.log.count("products", &CallOp::List), 2);

    let updated = catalog
        .update_product(
            created.id,
            ProductChanges {
                sale_price: Some(Money::from_cents(1500)),
                ..ProductChanges::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.sale_price, Money::from_cents(1500));
    assert_eq!(updated.name, "Ice bag");
}

#[tokio::test]
async fn client_search_and_creation() {
    let fake = FakeBackend::new();
    fake.seed_client("Tienda La Esquina");
    fake.seed_client("Hotel Mirador");
    let catalog = fake.app(driver_session()).catalog();

    assert_eq!(catalog.clients("").await.unwrap().len(), 2);
    let found = catalog.clients("  mirador ").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Hotel Mirador");

    let err = catalog
        .create_client(NewClient {
            name: "  ".to_string(),
            phone: None,
            address: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Domain(DomainError::Validation(_))));
    assert_eq!(fake.log.count("clients", &CallOp::Create), 0);

    catalog
        .create_client(NewClient {
            name: "Panadería Sol".to_string(),
            phone: Some("555-0199".to_string()),
            address: None,
        })
        .await
        .unwrap();
    assert_eq!(catalog.clients("").await.unwrap().len(), 3);
}

#[tokio::test]
async fn adjustments_embed_their_items() {
    let fake = FakeBackend::new();
    let a = fake.seed_product("Water 20L", "25.00", 10);
    let adj = fake
        .adjustments
        .seed(serde_json::json!({ "type": "output", "status": "draft", "description": "spill" }))
        .unwrap();
    for qty in [1, 2] {
        fake.adjustment_items
            .seed(serde_json::json!({ "inventory_adjustment_id": adj, "product_id": a, "quantity": qty }))
            .unwrap();
    }
    let catalog = fake.app(driver_session()).catalog();

    let list = catalog.adjustments().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].related_items.len(), 2);

    let one = catalog.adjustment(adj.into()).await.unwrap();
    assert_eq!(one.attributes.description(), Some("spill"));
    assert_eq!(one.related_items.iter().map(|i| i.quantity).sum::<u32>(), 3);
}

#[tokio::test]
async fn missing_product_is_a_gateway_error() {
    let fake = FakeBackend::new();
    let catalog = fake.app(driver_session()).catalog();
    let err = catalog.product(ProductId::new(42)).await.unwrap_err();
    assert!(matches!(err, CatalogError::Gateway(GatewayError::NotFound(_))));
}
