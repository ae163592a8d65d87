//! In-memory read cache for catalog views.
//!
//! Entries are stored as JSON and keyed by `(Collection, key)`. Writers never
//! update entries in place; they invalidate whole collections and readers
//! re-fetch.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

/// Backend collections with cached read views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Products,
    Clients,
    Adjustments,
    Orders,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Clients => "clients",
            Collection::Adjustments => "adjustments",
            Collection::Orders => "orders",
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    data: Value,
    cached_at: DateTime<Utc>,
}

/// Shared cache handle. Cheap to clone; clones share entries.
#[derive(Debug, Clone)]
pub struct ReadCache {
    entries: Arc<Mutex<HashMap<(Collection, String), Entry>>>,
    max_age: Option<Duration>,
}

impl Default for ReadCache {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ReadCache {
    /// `max_age = None` keeps entries until invalidated.
    pub fn new(max_age: Option<Duration>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            max_age,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, collection: Collection, key: &str) -> Option<T> {
        self.get_at(collection, key, Utc::now()).await
    }

    async fn get_at<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<T> {
        let data = {
            let entries = self.entries.lock().await;
            let entry = entries.get(&(collection, key.to_string()))?;
            if let Some(max) = self.max_age {
                if now.signed_duration_since(entry.cached_at) > max {
                    return None;
                }
            }
            entry.data.clone()
        };

        match serde_json::from_value(data) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(collection = collection.as_str(), key, "discarding unreadable cache entry: {err}");
                None
            }
        }
    }

    pub async fn put<T: Serialize>(&self, collection: Collection, key: &str, value: &T) {
        self.put_at(collection, key, value, Utc::now()).await;
    }

    async fn put_at<T: Serialize>(
        &self,
        collection: Collection,
        key: &str,
        value: &T,
        cached_at: DateTime<Utc>,
    ) {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(collection = collection.as_str(), key, "not caching value: {err}");
                return;
            }
        };
        self.entries
            .lock()
            .await
            .insert((collection, key.to_string()), Entry { data, cached_at });
    }

    /// Whether an entry exists, stale or not.
    pub async fn contains(&self, collection: Collection, key: &str) -> bool {
        self.entries
            .lock()
            .await
            .contains_key(&(collection, key.to_string()))
    }

    pub async fn invalidate(&self, collection: Collection) {
        self.invalidate_all(&[collection]).await;
    }

    pub async fn invalidate_all(&self, collections: &[Collection]) {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|(c, _), _| !collections.contains(c));
        tracing::debug!(
            collections = ?collections,
            dropped = before - entries.len(),
            "cache invalidated"
        );
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}
