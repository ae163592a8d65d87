//! In-memory gateway.
//!
//! Intended for tests/dev: it behaves like the backend's resource routes,
//! records every call in a shared [`CallLog`] and can be told to fail chosen
//! calls. Not optimized for performance.

use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::envelope::{RemoteItemSnapshot, decode_resource};
use crate::error::{GatewayError, GatewayResult};
use crate::resource::{ListQuery, Page, PageMeta, Record, Resource, ResourceGateway};

/// Kind of recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOp {
    List,
    Get,
    Create,
    Update,
    Action(String),
}

/// One call observed by an in-memory gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub resource: &'static str,
    pub op: CallOp,
    pub id: Option<u64>,
}

/// Call log shared across gateways so cross-resource ordering is observable.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, resource: &'static str, op: CallOp, id: Option<u64>) {
        let mut calls = match self.calls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        calls.push(RecordedCall { resource, op, id });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        match self.calls.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Calls that wrote something (everything but list/get).
    pub fn writes(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c.op, CallOp::List | CallOp::Get))
            .collect()
    }

    pub fn count(&self, resource: &str, op: &CallOp) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.resource == resource && &c.op == op)
            .count()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}

type ActionHook = Arc<dyn Fn(u64, &str, &mut Value) -> GatewayResult<()> + Send + Sync>;
type RelatedItems = Arc<dyn Fn(u64) -> GatewayResult<Vec<RemoteItemSnapshot>> + Send + Sync>;

#[derive(Default)]
struct State {
    records: BTreeMap<u64, Value>,
    next_id: u64,
    defaults: Map<String, Value>,
    create_calls: usize,
    update_calls: usize,
    failing_creates: BTreeSet<usize>,
    failing_updates: BTreeSet<usize>,
    failing_actions: BTreeSet<String>,
    action_hook: Option<ActionHook>,
    related: Option<RelatedItems>,
}

/// In-memory stand-in for one backend resource route.
pub struct InMemoryGateway<R> {
    state: Arc<Mutex<State>>,
    log: CallLog,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for InMemoryGateway<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            log: self.log.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> InMemoryGateway<R> {
    pub fn new(log: CallLog) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                next_id: 1,
                ..State::default()
            })),
            log,
            _resource: PhantomData,
        }
    }

    fn lock(&self) -> GatewayResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| GatewayError::invalid(format!("{}: in-memory state poisoned", R::PATH)))
    }

    fn configure(self, f: impl FnOnce(&mut State)) -> Self {
        {
            let mut state = match self.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            f(&mut state);
        }
        self
    }

    /// Attribute values merged under every created record (server-side defaults).
    pub fn with_defaults(self, defaults: Value) -> Self {
        self.configure(|s| {
            if let Value::Object(map) = defaults {
                s.defaults = map;
            }
        })
    }

    /// Backend behaviour for named actions. The hook may mutate the record.
    pub fn with_action_hook<F>(self, hook: F) -> Self
    where
        F: Fn(u64, &str, &mut Value) -> GatewayResult<()> + Send + Sync + 'static,
    {
        self.configure(|s| s.action_hook = Some(Arc::new(hook)))
    }

    /// Embed `relationships.items` from another in-memory route, joined on
    /// `foreign_key`, whenever a call asks for `related=items`.
    pub fn with_related_items<I: Resource>(self, items: &InMemoryGateway<I>, foreign_key: &'static str) -> Self {
        let items = items.clone();
        let related: RelatedItems = Arc::new(move |id: u64| -> GatewayResult<Vec<RemoteItemSnapshot>> {
            items
                .records()?
                .into_iter()
                .filter(|(_, v)| v.get(foreign_key).and_then(Value::as_u64) == Some(id))
                .map(|(_, v)| RemoteItemSnapshot::from_value(&v))
                .collect()
        });
        self.configure(|s| s.related = Some(related))
    }

    /// Fail the `n`-th create call (1-based) on this route.
    pub fn fail_create_call(&self, n: usize) {
        if let Ok(mut s) = self.lock() {
            s.failing_creates.insert(n);
        }
    }

    /// Fail the `n`-th update call (1-based) on this route.
    pub fn fail_update_call(&self, n: usize) {
        if let Ok(mut s) = self.lock() {
            s.failing_updates.insert(n);
        }
    }

    /// Fail every invocation of the named action.
    pub fn fail_action(&self, name: &str) {
        if let Ok(mut s) = self.lock() {
            s.failing_actions.insert(name.to_string());
        }
    }

    /// Insert a record directly (not logged). Returns its id.
    pub fn seed(&self, attributes: Value) -> GatewayResult<u64> {
        let mut s = self.lock()?;
        let Value::Object(mut attrs) = attributes else {
            return Err(GatewayError::invalid("seeded attributes must be an object"));
        };
        let id = match attrs.get("id").and_then(Value::as_u64) {
            Some(id) => id,
            None => s.next_id,
        };
        s.next_id = s.next_id.max(id + 1);
        attrs.insert("id".to_string(), Value::from(id));
        s.records.insert(id, Value::Object(attrs));
        Ok(id)
    }

    /// Raw stored attributes of one record.
    pub fn snapshot(&self, id: u64) -> Option<Value> {
        self.lock().ok().and_then(|s| s.records.get(&id).cloned())
    }

    /// Raw stored attributes of every record, by id.
    pub fn records(&self) -> GatewayResult<Vec<(u64, Value)>> {
        Ok(self
            .lock()?
            .records
            .iter()
            .map(|(id, v)| (*id, v.clone()))
            .collect())
    }

    /// Mutate a stored record in place (e.g. a backend-side stock change).
    pub fn modify(&self, id: u64, f: impl FnOnce(&mut Value)) -> GatewayResult<()> {
        let mut s = self.lock()?;
        let record = s
            .records
            .get_mut(&id)
            .ok_or_else(|| GatewayError::NotFound(format!("{}/{}", R::PATH, id)))?;
        f(record);
        Ok(())
    }

    fn decode(&self, value: Value, with_related: bool) -> GatewayResult<Record<R::Attributes>> {
        let related = if with_related {
            self.lock()?.related.clone()
        } else {
            None
        };
        let mut record = decode_resource::<R::Attributes>(value)?;
        if let Some(related) = related {
            record.related_items = related(record.id)?;
        }
        Ok(record)
    }

    fn matches(value: &Value, query: &ListQuery) -> bool {
        query.params().iter().all(|(key, expected)| match key.as_str() {
            "related" | "page" | "perPage" => true,
            "search" => {
                let needle = expected.to_lowercase();
                value
                    .as_object()
                    .map(|obj| {
                        obj.values()
                            .filter_map(Value::as_str)
                            .any(|s| s.to_lowercase().contains(&needle))
                    })
                    .unwrap_or(false)
            }
            field => match value.get(field) {
                Some(Value::String(s)) => s == expected,
                Some(other) => other.to_string() == *expected,
                None => false,
            },
        })
    }
}

fn merge(target: &mut Map<String, Value>, source: Value) {
    if let Value::Object(source) = source {
        for (k, v) in source {
            target.insert(k, v);
        }
    }
}

#[async_trait]
impl<R: Resource> ResourceGateway<R> for InMemoryGateway<R> {
    async fn list(&self, query: &ListQuery) -> GatewayResult<Page<R::Attributes>> {
        self.log.record(R::PATH, CallOp::List, None);
        let values: Vec<Value> = self
            .lock()?
            .records
            .values()
            .filter(|v| Self::matches(v, query))
            .cloned()
            .collect();

        let with_related = query.includes_related("items");
        let records = values
            .into_iter()
            .map(|v| self.decode(v, with_related))
            .collect::<GatewayResult<Vec<_>>>()?;
        let meta = PageMeta {
            current_page: 1,
            total: records.len() as u64,
            last_page: Some(1),
            per_page: None,
        };
        Ok(Page { records, meta })
    }

    async fn get_with(&self, id: u64, query: &ListQuery) -> GatewayResult<Record<R::Attributes>> {
        self.log.record(R::PATH, CallOp::Get, Some(id));
        let value = self
            .lock()?
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("{}/{}", R::PATH, id)))?;
        self.decode(value, query.includes_related("items"))
    }

    async fn create(&self, payload: &R::Create) -> GatewayResult<Record<R::Attributes>> {
        self.log.record(R::PATH, CallOp::Create, None);
        let payload = serde_json::to_value(payload)?;

        let mut s = self.lock()?;
        s.create_calls += 1;
        let call = s.create_calls;
        if s.failing_creates.contains(&call) {
            return Err(GatewayError::Network(format!(
                "injected failure on {} create #{call}",
                R::PATH
            )));
        }

        let id = s.next_id;
        let mut attrs = s.defaults.clone();
        merge(&mut attrs, payload);
        attrs.insert("id".to_string(), Value::from(id));
        let value = Value::Object(attrs);

        let record = decode_resource::<R::Attributes>(value.clone())?;
        s.next_id += 1;
        s.records.insert(id, value);
        Ok(record)
    }

    async fn update(&self, id: u64, payload: &R::Update) -> GatewayResult<Record<R::Attributes>> {
        self.log.record(R::PATH, CallOp::Update, Some(id));
        let payload = serde_json::to_value(payload)?;

        let value = {
            let mut s = self.lock()?;
            s.update_calls += 1;
            let call = s.update_calls;
            if s.failing_updates.contains(&call) {
                return Err(GatewayError::Network(format!(
                    "injected failure on {} update #{call}",
                    R::PATH
                )));
            }

            let record = s
                .records
                .get_mut(&id)
                .ok_or_else(|| GatewayError::NotFound(format!("{}/{}", R::PATH, id)))?;
            if let Value::Object(attrs) = record {
                merge(attrs, payload);
            }
            record.clone()
        };
        self.decode(value, false)
    }

    async fn action(&self, id: u64, name: &str) -> GatewayResult<()> {
        self.log.record(R::PATH, CallOp::Action(name.to_string()), Some(id));

        let mut s = self.lock()?;
        if s.failing_actions.contains(name) {
            return Err(GatewayError::Network(format!(
                "injected failure on {} action '{name}'",
                R::PATH
            )));
        }
        let hook = s.action_hook.clone();
        let record = s
            .records
            .get_mut(&id)
            .ok_or_else(|| GatewayError::NotFound(format!("{}/{}", R::PATH, id)))?;
        match hook {
            Some(hook) => hook(id, name, record),
            None => Ok(()),
        }
    }
}
