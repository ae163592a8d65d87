//! Resource descriptions and the generic gateway contract.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::envelope::RemoteItemSnapshot;
use crate::error::GatewayResult;

/// A backend resource type: where it lives and what goes over the wire.
pub trait Resource: Send + Sync + 'static {
    /// Route segment under the API prefix (e.g. `"inventory-adjustments"`).
    const PATH: &'static str;

    /// Decoded attributes (the record's numeric id is injected before decoding).
    type Attributes: DeserializeOwned + Serialize + Clone + Send + Sync + 'static;
    /// Create payload.
    type Create: Serialize + Send + Sync + 'static;
    /// Update payload.
    type Update: Serialize + Send + Sync + 'static;
}

/// One decoded resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<A> {
    /// Normalized numeric id.
    pub id: u64,
    pub attributes: A,
    /// Inline `relationships.items`, empty when the backend did not embed them.
    #[serde(default)]
    pub related_items: Vec<RemoteItemSnapshot>,
}

impl<A> Record<A> {
    pub fn into_attributes(self) -> A {
        self.attributes
    }
}

/// Pagination metadata of a list response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub last_page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<A> {
    pub records: Vec<Record<A>>,
    #[serde(default)]
    pub meta: PageMeta,
}

impl<A> Page<A> {
    pub fn into_attributes(self) -> Vec<A> {
        self.records.into_iter().map(Record::into_attributes).collect()
    }
}

/// Ordered query-string parameters for list/get calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    params: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Ask the backend to embed a relationship (`related=items`).
    pub fn related(self, relation: &str) -> Self {
        self.with("related", relation)
    }

    /// Free-text search; blank terms are dropped.
    pub fn search(self, term: &str) -> Self {
        let term = term.trim();
        if term.is_empty() {
            return self;
        }
        self.with("search", term)
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn includes_related(&self, relation: &str) -> bool {
        self.get("related")
            .map(|v| v.split(',').any(|r| r.trim() == relation))
            .unwrap_or(false)
    }

    /// Stable textual form, used as a cache key.
    pub fn cache_key(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Request/response mapping for a single resource type.
///
/// Implementations must map every failure to a [`crate::GatewayError`]; they
/// never retry.
#[async_trait]
pub trait ResourceGateway<R: Resource>: Send + Sync {
    async fn list(&self, query: &ListQuery) -> GatewayResult<Page<R::Attributes>>;

    async fn get_with(&self, id: u64, query: &ListQuery) -> GatewayResult<Record<R::Attributes>>;

    async fn get(&self, id: u64) -> GatewayResult<Record<R::Attributes>> {
        self.get_with(id, &ListQuery::default()).await
    }

    /// Create a record; the returned record carries the server-assigned id.
    async fn create(&self, payload: &R::Create) -> GatewayResult<Record<R::Attributes>>;

    async fn update(&self, id: u64, payload: &R::Update) -> GatewayResult<Record<R::Attributes>>;

    /// Invoke a named action on a record (e.g. `finalize`).
    async fn action(&self, id: u64, name: &str) -> GatewayResult<()>;
}
