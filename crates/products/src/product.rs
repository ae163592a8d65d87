use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aquaroute_core::time::lenient_timestamp;
use aquaroute_core::{DomainError, Money, ProductId};

/// Product reference data (water jugs, ice bags, ...).
///
/// Fetched from the backend and never mutated by the transaction core. Stock is
/// maintained by the backend when adjustments are finalized; it is absent on
/// routes that do not expose it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub unit_type: String,
    pub sale_price: Money,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload: create a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub unit_type: String,
    pub sale_price: Money,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if self.unit_type.trim().is_empty() {
            return Err(DomainError::validation("unit_type cannot be empty"));
        }
        Ok(())
    }
}

/// Payload: partial product update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Money>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sku.is_none()
            && self.unit_type.is_none()
            && self.sale_price.is_none()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.is_empty() {
            return Err(DomainError::validation("no product fields to update"));
        }
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if matches!(&self.sku, Some(s) if s.trim().is_empty()) {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_attributes() {
        let json = r#"{
            "id": 3,
            "name": "Bidón 20L",
            "sku": "BID-20",
            "unit_type": "UN",
            "sale_price": "2500.00",
            "created_at": "2025-01-10 08:00:00",
            "updated_at": null
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(3));
        assert_eq!(product.sale_price, Money::from_cents(250_000));
        assert!(product.stock.is_none());
        assert!(product.created_at.is_some());
        assert!(product.updated_at.is_none());
    }

    #[test]
    fn new_product_requires_name_and_sku() {
        let mut p = NewProduct {
            name: "Hielo 2kg".to_string(),
            sku: "HIE-2".to_string(),
            unit_type: "BOLSA".to_string(),
            sale_price: Money::from_cents(1200),
        };
        assert!(p.validate().is_ok());

        p.name = "  ".to_string();
        assert!(matches!(p.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn changes_serialize_only_present_fields() {
        let changes = ProductChanges {
            sale_price: Some(Money::from_cents(990)),
            ..ProductChanges::default()
        };
        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json, serde_json::json!({ "sale_price": "9.90" }));
        assert!(ProductChanges::default().validate().is_err());
    }
}
