//! SurrealDB implementation of [`SettingsRepository`].
//!
//! Settings live in a single well-known record so reads and writes
//! never need a query over the table.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use toollink_core::error::ToolLinkResult;
use toollink_core::models::settings::{Settings, UpdateSettings};
use toollink_core::repository::SettingsRepository;

use crate::error::DbError;

const SETTINGS_ID: &str = "global";

#[derive(Debug, SurrealValue)]
struct SettingsRow {
    tax_rate: f64,
    delivery_charge: f64,
    currency: String,
    low_stock_alerts: bool,
}

impl SettingsRow {
    fn into_settings(self) -> Settings {
        Settings {
            tax_rate: self.tax_rate,
            delivery_charge: self.delivery_charge,
            currency: self.currency,
            low_stock_alerts: self.low_stock_alerts,
        }
    }
}

/// SurrealDB implementation of the Settings repository.
#[derive(Clone)]
pub struct SurrealSettingsRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSettingsRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SettingsRepository for SurrealSettingsRepository<C> {
    async fn get(&self) -> ToolLinkResult<Settings> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('settings', $id)")
            .bind(("id", SETTINGS_ID))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SettingsRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(SettingsRow::into_settings)
            .unwrap_or_default())
    }

    async fn update(&self, input: UpdateSettings) -> ToolLinkResult<Settings> {
        // Read-merge-upsert keeps unspecified fields at their current
        // (or default) values.
        let current = self.get().await?;
        let merged = Settings {
            tax_rate: input.tax_rate.unwrap_or(current.tax_rate),
            delivery_charge: input.delivery_charge.unwrap_or(current.delivery_charge),
            currency: input.currency.unwrap_or(current.currency),
            low_stock_alerts: input.low_stock_alerts.unwrap_or(current.low_stock_alerts),
        };

        let mut result = self
            .db
            .query(
                "UPSERT type::record('settings', $id) SET \
                 tax_rate = $tax_rate, \
                 delivery_charge = $delivery_charge, \
                 currency = $currency, \
                 low_stock_alerts = $low_stock_alerts",
            )
            .bind(("id", SETTINGS_ID))
            .bind(("tax_rate", merged.tax_rate))
            .bind(("delivery_charge", merged.delivery_charge))
            .bind(("currency", merged.currency))
            .bind(("low_stock_alerts", merged.low_stock_alerts))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SettingsRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "settings".into(),
            id: SETTINGS_ID.into(),
        })?;

        Ok(row.into_settings())
    }
}
