//! SurrealDB implementation of [`InventoryRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use toollink_core::error::{ToolLinkError, ToolLinkResult};
use toollink_core::models::inventory::{
    CreateInventoryItem, InventoryItem, StockLocation, SupplierContact, UpdateInventoryItem,
};
use toollink_core::repository::{
    InventoryFilter, InventoryRepository, PaginatedResult, Pagination,
};
use uuid::Uuid;

use crate::error::{DbError, map_unique_violation};

const UNIQUE_INDEXES: &[(&str, &str)] = &[("idx_inventory_sku", "sku")];

#[derive(Debug, SurrealValue)]
struct LocationRow {
    warehouse: Option<String>,
    zone: Option<String>,
}

#[derive(Debug, SurrealValue)]
struct SupplierRow {
    name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
}

#[derive(Debug, SurrealValue)]
struct ItemRow {
    name: String,
    category: String,
    sku: String,
    description: Option<String>,
    quantity: u32,
    unit: String,
    reorder_threshold: u32,
    cost_price: f64,
    selling_price: f64,
    currency: String,
    location: LocationRow,
    supplier: SupplierRow,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ItemRowWithId {
    record_id: String,
    name: String,
    category: String,
    sku: String,
    description: Option<String>,
    quantity: u32,
    unit: String,
    reorder_threshold: u32,
    cost_price: f64,
    selling_price: f64,
    currency: String,
    location: LocationRow,
    supplier: SupplierRow,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self, id: Uuid) -> InventoryItem {
        InventoryItem {
            id,
            name: self.name,
            category: self.category,
            sku: self.sku,
            description: self.description,
            quantity: self.quantity,
            unit: self.unit,
            reorder_threshold: self.reorder_threshold,
            cost_price: self.cost_price,
            selling_price: self.selling_price,
            currency: self.currency,
            location: StockLocation {
                warehouse: self.location.warehouse,
                zone: self.location.zone,
            },
            supplier: SupplierContact {
                name: self.supplier.name,
                phone: self.supplier.phone,
                email: self.supplier.email,
            },
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl ItemRowWithId {
    fn try_into_item(self) -> Result<InventoryItem, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(InventoryItem {
            id,
            name: self.name,
            category: self.category,
            sku: self.sku,
            description: self.description,
            quantity: self.quantity,
            unit: self.unit,
            reorder_threshold: self.reorder_threshold,
            cost_price: self.cost_price,
            selling_price: self.selling_price,
            currency: self.currency,
            location: StockLocation {
                warehouse: self.location.warehouse,
                zone: self.location.zone,
            },
            supplier: SupplierContact {
                name: self.supplier.name,
                phone: self.supplier.phone,
                email: self.supplier.email,
            },
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn location_to_row(location: &StockLocation) -> LocationRow {
    LocationRow {
        warehouse: location.warehouse.clone(),
        zone: location.zone.clone(),
    }
}

fn supplier_to_row(supplier: &SupplierContact) -> SupplierRow {
    SupplierRow {
        name: supplier.name.clone(),
        phone: supplier.phone.clone(),
        email: supplier.email.clone(),
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Inventory repository.
#[derive(Clone)]
pub struct SurrealInventoryRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealInventoryRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> InventoryRepository for SurrealInventoryRepository<C> {
    async fn create(&self, input: CreateInventoryItem) -> ToolLinkResult<InventoryItem> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('inventory_item', $id) SET \
                 name = $name, category = $category, sku = $sku, \
                 description = $description, quantity = $quantity, \
                 unit = $unit, reorder_threshold = $reorder_threshold, \
                 cost_price = $cost_price, \
                 selling_price = $selling_price, currency = $currency, \
                 location = $location, supplier = $supplier, \
                 is_active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("category", input.category))
            .bind(("sku", input.sku))
            .bind(("description", input.description))
            .bind(("quantity", input.quantity))
            .bind(("unit", input.unit))
            .bind(("reorder_threshold", input.reorder_threshold))
            .bind(("cost_price", input.cost_price))
            .bind(("selling_price", input.selling_price))
            .bind(("currency", input.currency))
            .bind(("location", location_to_row(&input.location)))
            .bind(("supplier", supplier_to_row(&input.supplier)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| map_unique_violation(e, UNIQUE_INDEXES))?;

        let rows: Vec<ItemRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "inventory_item".into(),
            id: id_str,
        })?;

        Ok(row.into_item(id))
    }

    async fn get_by_id(&self, id: Uuid) -> ToolLinkResult<InventoryItem> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('inventory_item', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ItemRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "inventory_item".into(),
            id: id_str,
        })?;

        Ok(row.into_item(id))
    }

    async fn get_by_sku(&self, sku: &str) -> ToolLinkResult<InventoryItem> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM inventory_item \
                 WHERE sku = $sku",
            )
            .bind(("sku", sku.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ItemRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "inventory_item".into(),
            id: format!("sku={sku}"),
        })?;

        Ok(row.try_into_item()?)
    }

    async fn update(&self, id: Uuid, input: UpdateInventoryItem) -> ToolLinkResult<InventoryItem> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.category.is_some() {
            sets.push("category = $category");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.unit.is_some() {
            sets.push("unit = $unit");
        }
        if input.reorder_threshold.is_some() {
            sets.push("reorder_threshold = $reorder_threshold");
        }
        if input.cost_price.is_some() {
            sets.push("cost_price = $cost_price");
        }
        if input.selling_price.is_some() {
            sets.push("selling_price = $selling_price");
        }
        if input.currency.is_some() {
            sets.push("currency = $currency");
        }
        if input.location.is_some() {
            sets.push("location = $location");
        }
        if input.supplier.is_some() {
            sets.push("supplier = $supplier");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('inventory_item', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(category) = input.category {
            builder = builder.bind(("category", category));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(unit) = input.unit {
            builder = builder.bind(("unit", unit));
        }
        if let Some(reorder_threshold) = input.reorder_threshold {
            builder = builder.bind(("reorder_threshold", reorder_threshold));
        }
        if let Some(cost_price) = input.cost_price {
            builder = builder.bind(("cost_price", cost_price));
        }
        if let Some(selling_price) = input.selling_price {
            builder = builder.bind(("selling_price", selling_price));
        }
        if let Some(currency) = input.currency {
            builder = builder.bind(("currency", currency));
        }
        if let Some(ref location) = input.location {
            builder = builder.bind(("location", location_to_row(location)));
        }
        if let Some(ref supplier) = input.supplier {
            builder = builder.bind(("supplier", supplier_to_row(supplier)));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<ItemRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "inventory_item".into(),
            id: id_str,
        })?;

        Ok(row.into_item(id))
    }

    async fn adjust_quantity(&self, id: Uuid, delta: i64) -> ToolLinkResult<InventoryItem> {
        let id_str = id.to_string();

        // The WHERE guard makes the floor atomic: a decrement past
        // zero matches no rows instead of writing a negative quantity.
        let mut result = self
            .db
            .query(
                "UPDATE type::record('inventory_item', $id) SET \
                 quantity = quantity + $delta, \
                 updated_at = time::now() \
                 WHERE quantity + $delta >= 0",
            )
            .bind(("id", id_str.clone()))
            .bind(("delta", delta))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ItemRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_item(id)),
            None => {
                // Distinguish a missing record from an insufficient
                // stock rejection.
                let item = self.get_by_id(id).await?;
                Err(ToolLinkError::Validation {
                    message: format!(
                        "insufficient stock for {}: have {}, requested change {}",
                        item.sku, item.quantity, delta
                    ),
                })
            }
        }
    }

    async fn soft_delete(&self, id: Uuid) -> ToolLinkResult<()> {
        self.db
            .query(
                "UPDATE type::record('inventory_item', $id) SET \
                 is_active = false, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        filter: InventoryFilter,
        pagination: Pagination,
    ) -> ToolLinkResult<PaginatedResult<InventoryItem>> {
        let mut conditions = Vec::new();
        if filter.category.is_some() {
            conditions.push("category = $category");
        }
        if filter.active_only {
            conditions.push("is_active = true");
        }
        if filter.low_stock_only {
            conditions.push("quantity <= reorder_threshold");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_query =
            format!("SELECT count() AS total FROM inventory_item{where_clause} GROUP ALL");
        let mut builder = self.db.query(&count_query);
        if let Some(category) = filter.category.clone() {
            builder = builder.bind(("category", category));
        }
        let mut count_result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM inventory_item{where_clause} \
             ORDER BY name ASC LIMIT $limit START $offset"
        );
        let mut builder = self.db.query(&list_query);
        if let Some(category) = filter.category {
            builder = builder.bind(("category", category));
        }
        let mut result = builder
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ItemRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_item())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }

    async fn count_low_stock(&self) -> ToolLinkResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM inventory_item \
                 WHERE is_active = true \
                 AND quantity <= reorder_threshold GROUP ALL",
            )
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
