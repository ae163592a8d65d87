//! Wire envelope decoding.
//!
//! Single resources arrive as `{ data: { id, type, attributes, relationships? } }`,
//! lists as `{ data: [...], meta: {...} }`. Create responses are sometimes the
//! bare attributes object instead. Ids arrive as strings and are normalized to
//! numbers here, before anything reaches the data model.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use aquaroute_core::{ProductId, parse_remote_id};

use crate::error::{GatewayError, GatewayResult};
use crate::resource::{Page, PageMeta, Record};

/// A previously committed line item as reported by the backend.
///
/// Validated at the gateway boundary: numeric product id and a positive
/// quantity. The item id is kept when present but is not used for
/// reconciliation identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteItemSnapshot {
    #[serde(default)]
    pub id: Option<u64>,
    pub product_id: ProductId,
    pub quantity: u32,
}

impl RemoteItemSnapshot {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            id: None,
            product_id,
            quantity,
        }
    }

    /// Decode one relationship entry: either a flat item object or an
    /// `{ id, attributes }` wrapped resource.
    pub fn from_value(value: &Value) -> GatewayResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| GatewayError::invalid("related item is not an object"))?;

        let (outer_id, attrs) = match obj.get("attributes").and_then(Value::as_object) {
            Some(attrs) => (obj.get("id"), attrs),
            None => (None, obj),
        };

        let id = match outer_id.or_else(|| attrs.get("id")) {
            Some(Value::Null) | None => None,
            Some(v) => Some(wire_id(v, "item id")?),
        };
        let product_id = attrs
            .get("product_id")
            .ok_or_else(|| GatewayError::invalid("related item without product_id"))
            .and_then(|v| wire_id(v, "product_id"))
            .map(ProductId::new)?;
        let quantity = attrs
            .get("quantity")
            .ok_or_else(|| GatewayError::invalid("related item without quantity"))
            .and_then(wire_quantity)?;

        Ok(Self {
            id,
            product_id,
            quantity,
        })
    }
}

/// Normalize a wire id (`"12"` or `12`) to a number.
pub fn wire_id(value: &Value, what: &str) -> GatewayResult<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| GatewayError::invalid(format!("{what}: not a non-negative integer: {n}"))),
        Value::String(s) => parse_remote_id(s, what).map_err(|e| GatewayError::invalid(e.to_string())),
        other => Err(GatewayError::invalid(format!("{what}: unexpected {other}"))),
    }
}

fn wire_quantity(value: &Value) -> GatewayResult<u32> {
    let raw = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    raw.filter(|q| *q > 0)
        .and_then(|q| u32::try_from(q).ok())
        .ok_or_else(|| GatewayError::invalid(format!("invalid item quantity: {value}")))
}

fn related_items(resource: &Map<String, Value>) -> GatewayResult<Vec<RemoteItemSnapshot>> {
    let items = match resource.get("relationships") {
        Some(Value::Object(rel)) => rel.get("items"),
        _ => None,
    };
    let entries = match items {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(Value::Object(wrapper)) => match wrapper.get("data") {
            Some(Value::Array(entries)) => entries,
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(other) => {
                return Err(GatewayError::invalid(format!(
                    "relationships.items.data is not a list: {other}"
                )));
            }
        },
        Some(other) => {
            return Err(GatewayError::invalid(format!(
                "relationships.items is not a list: {other}"
            )));
        }
    };
    entries.iter().map(RemoteItemSnapshot::from_value).collect()
}

/// Decode a single resource object (wrapped or flat) into a typed record.
pub fn decode_resource<A: DeserializeOwned>(resource: Value) -> GatewayResult<Record<A>> {
    let Value::Object(resource) = resource else {
        return Err(GatewayError::invalid("resource is not an object"));
    };

    let id = resource
        .get("id")
        .ok_or_else(|| GatewayError::invalid("resource without id"))
        .and_then(|v| wire_id(v, "id"))?;
    let related_items = related_items(&resource)?;

    let mut attributes = match resource.get("attributes") {
        Some(Value::Object(attrs)) => attrs.clone(),
        Some(other) => {
            return Err(GatewayError::invalid(format!(
                "attributes is not an object: {other}"
            )));
        }
        None => {
            let mut flat = resource;
            flat.remove("relationships");
            flat
        }
    };
    attributes.insert("id".to_string(), Value::from(id));

    let attributes = serde_json::from_value(Value::Object(attributes))
        .map_err(|e| GatewayError::invalid(format!("resource {id}: {e}")))?;

    Ok(Record {
        id,
        attributes,
        related_items,
    })
}

/// Decode a detail response.
///
/// Accepts `{ data: resource }` or, as some create routes answer, the bare
/// resource/attributes object.
pub fn decode_detail<A: DeserializeOwned>(body: Value) -> GatewayResult<Record<A>> {
    match body {
        Value::Object(mut obj) => match obj.remove("data") {
            Some(data @ Value::Object(_)) => decode_resource(data),
            Some(Value::Null) | None => decode_resource(Value::Object(obj)),
            Some(other) => Err(GatewayError::invalid(format!(
                "detail data is not an object: {other}"
            ))),
        },
        other => Err(GatewayError::invalid(format!(
            "detail body is not an object: {other}"
        ))),
    }
}

#[derive(Deserialize)]
struct ListEnvelope {
    data: Vec<Value>,
    #[serde(default)]
    meta: Option<PageMeta>,
}

/// Decode a list response.
pub fn decode_list<A: DeserializeOwned>(body: Value) -> GatewayResult<Page<A>> {
    let envelope: ListEnvelope = serde_json::from_value(body)
        .map_err(|e| GatewayError::invalid(format!("list envelope: {e}")))?;
    let records = envelope
        .data
        .into_iter()
        .map(decode_resource)
        .collect::<GatewayResult<Vec<_>>>()?;
    Ok(Page {
        records,
        meta: envelope.meta.unwrap_or_default(),
    })
}
