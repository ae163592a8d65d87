//! Cached catalog reads and reference-data writes.

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use aquaroute_core::{AdjustmentId, DomainError, ProductId};
use aquaroute_gateway::{GatewayError, GatewayResult, ListQuery, Record};
use aquaroute_inventory::InventoryAdjustment;
use aquaroute_parties::{Client, NewClient};
use aquaroute_products::{NewProduct, Product, ProductChanges};
use aquaroute_sales::Order;

use crate::cache::{Collection, ReadCache};
use crate::resources::Backend;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Clone)]
pub struct Catalog {
    backend: Backend,
    cache: ReadCache,
}

impl Catalog {
    pub fn new(backend: Backend, cache: ReadCache) -> Self {
        Self { backend, cache }
    }

    async fn cached<T, F, Fut>(&self, collection: Collection, key: &str, fetch: F) -> Result<T, CatalogError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = GatewayResult<T>>,
    {
        if let Some(hit) = self.cache.get::<T>(collection, key).await {
            return Ok(hit);
        }
        tracing::debug!(collection = collection.as_str(), key, "cache miss");
        let value = fetch().await?;
        self.cache.put(collection, key, &value).await;
        Ok(value)
    }

    pub async fn products(&self) -> Result<Vec<Product>, CatalogError> {
        self.cached(Collection::Products, "all", || async {
            Ok::<_, GatewayError>(self.backend.products.list(&ListQuery::new()).await?.into_attributes())
        })
        .await
    }

    pub async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.cached(Collection::Products, &format!("id={id}"), || async {
            Ok::<_, GatewayError>(self.backend.products.get(id.get()).await?.into_attributes())
        })
        .await
    }

    /// Clients matching `search` (blank lists everyone).
    pub async fn clients(&self, search: &str) -> Result<Vec<Client>, CatalogError> {
        let query = ListQuery::new().search(search);
        let key = format!("list?{}", query.cache_key());
        self.cached(Collection::Clients, &key, || async {
            Ok::<_, GatewayError>(self.backend.clients.list(&query).await?.into_attributes())
        })
        .await
    }

    /// Adjustments with their committed items embedded.
    pub async fn adjustments(&self) -> Result<Vec<Record<InventoryAdjustment>>, CatalogError> {
        let query = ListQuery::new().related("items");
        let key = format!("list?{}", query.cache_key());
        self.cached(Collection::Adjustments, &key, || async {
            Ok::<_, GatewayError>(self.backend.adjustments.list(&query).await?.records)
        })
        .await
    }

    pub async fn adjustment(&self, id: AdjustmentId) -> Result<Record<InventoryAdjustment>, CatalogError> {
        let query = ListQuery::new().related("items");
        self.cached(Collection::Adjustments, &format!("id={id}"), || async {
            self.backend.adjustments.get_with(id.get(), &query).await
        })
        .await
    }

    pub async fn orders(&self) -> Result<Vec<Order>, CatalogError> {
        self.cached(Collection::Orders, "all", || async {
            Ok::<_, GatewayError>(self.backend.orders.list(&ListQuery::new()).await?.into_attributes())
        })
        .await
    }

    pub async fn create_client(&self, client: NewClient) -> Result<Client, CatalogError> {
        client.validate()?;
        let created = self.backend.clients.create(&client).await?;
        self.cache.invalidate(Collection::Clients).await;
        tracing::info!(client_id = created.id, "client created");
        Ok(created.into_attributes())
    }

    pub async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        product.validate()?;
        let created = self.backend.products.create(&product).await?;
        self.cache.invalidate(Collection::Products).await;
        tracing::info!(product_id = created.id, "product created");
        Ok(created.into_attributes())
    }

    pub async fn update_product(&self, id: ProductId, changes: ProductChanges) -> Result<Product, CatalogError> {
        changes.validate()?;
        let updated = self.backend.products.update(id.get(), &changes).await?;
        self.cache.invalidate(Collection::Products).await;
        tracing::info!(product_id = updated.id, "product updated");
        Ok(updated.into_attributes())
    }
}
