//! Runtime settings — the admin-mutable singleton document backing
//! `PUT /api/admin/config`. Consumed by order pricing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Fractional tax rate applied to order subtotals (e.g. `0.08`).
    pub tax_rate: f64,
    /// Default delivery charge when the order does not override it.
    pub delivery_charge: f64,
    pub currency: String,
    /// Emit notifications when stock falls below reorder thresholds.
    pub low_stock_alerts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tax_rate: 0.0,
            delivery_charge: 0.0,
            currency: "USD".into(),
            low_stock_alerts: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSettings {
    pub tax_rate: Option<f64>,
    pub delivery_charge: Option<f64>,
    pub currency: Option<String>,
    pub low_stock_alerts: Option<bool>,
}
