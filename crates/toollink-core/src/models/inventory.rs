//! Inventory item domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StockLocation {
    pub warehouse: Option<String>,
    pub zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SupplierContact {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    /// Globally unique stock-keeping unit. Immutable after creation.
    pub sku: String,
    pub description: Option<String>,
    pub quantity: u32,
    pub unit: String,
    pub reorder_threshold: u32,
    pub cost_price: f64,
    pub selling_price: f64,
    pub currency: String,
    pub location: StockLocation,
    pub supplier: SupplierContact,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Derived, never stored: stock has fallen to or below the reorder
    /// threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_threshold
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInventoryItem {
    pub name: String,
    pub category: String,
    pub sku: String,
    pub description: Option<String>,
    pub quantity: u32,
    pub unit: String,
    pub reorder_threshold: u32,
    pub cost_price: f64,
    pub selling_price: f64,
    pub currency: String,
    pub location: StockLocation,
    pub supplier: SupplierContact,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateInventoryItem {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<Option<String>>,
    pub unit: Option<String>,
    pub reorder_threshold: Option<u32>,
    pub cost_price: Option<f64>,
    pub selling_price: Option<f64>,
    pub currency: Option<String>,
    pub location: Option<StockLocation>,
    pub supplier: Option<SupplierContact>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32, reorder_threshold: u32) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            name: "Claw Hammer".into(),
            category: "hand-tools".into(),
            sku: "HAM-001".into(),
            description: None,
            quantity,
            unit: "pcs".into(),
            reorder_threshold,
            cost_price: 4.0,
            selling_price: 9.5,
            currency: "USD".into(),
            location: StockLocation::default(),
            supplier: SupplierContact::default(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn low_stock_is_derived_from_threshold() {
        assert!(item(5, 5).is_low_stock());
        assert!(item(0, 5).is_low_stock());
        assert!(!item(6, 5).is_low_stock());
    }
}
