//! SurrealDB implementation of [`OrderRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use toollink_core::error::ToolLinkResult;
use toollink_core::models::order::{
    CreateOrder, DeliveryPreferences, Order, OrderItem, OrderPricing, OrderStats, OrderStatus,
    UpdateOrder,
};
use toollink_core::repository::{OrderFilter, OrderRepository, PaginatedResult, Pagination};
use uuid::Uuid;

use crate::error::{DbError, map_unique_violation};

const UNIQUE_INDEXES: &[(&str, &str)] = &[("idx_order_number", "order_number")];

#[derive(Debug, SurrealValue)]
struct OrderItemRow {
    item_id: String,
    name: String,
    quantity: u32,
    unit_price: f64,
    subtotal: f64,
}

impl OrderItemRow {
    fn try_into_item(self) -> Result<OrderItem, DbError> {
        Ok(OrderItem {
            item_id: Uuid::parse_str(&self.item_id)
                .map_err(|e| DbError::Decode(format!("invalid item UUID: {e}")))?,
            name: self.name,
            quantity: self.quantity,
            unit_price: self.unit_price,
            subtotal: self.subtotal,
        })
    }
}

fn item_to_row(item: &OrderItem) -> OrderItemRow {
    OrderItemRow {
        item_id: item.item_id.to_string(),
        name: item.name.clone(),
        quantity: item.quantity,
        unit_price: item.unit_price,
        subtotal: item.subtotal,
    }
}

#[derive(Debug, SurrealValue)]
struct PricingRow {
    subtotal: f64,
    tax: f64,
    delivery_charge: f64,
    discount: f64,
    total: f64,
}

impl From<PricingRow> for OrderPricing {
    fn from(row: PricingRow) -> Self {
        Self {
            subtotal: row.subtotal,
            tax: row.tax,
            delivery_charge: row.delivery_charge,
            discount: row.discount,
            total: row.total,
        }
    }
}

fn pricing_to_row(pricing: &OrderPricing) -> PricingRow {
    PricingRow {
        subtotal: pricing.subtotal,
        tax: pricing.tax,
        delivery_charge: pricing.delivery_charge,
        discount: pricing.discount,
        total: pricing.total,
    }
}

#[derive(Debug, SurrealValue)]
struct DeliveryRow {
    address: Option<String>,
    instructions: Option<String>,
    preferred_date: Option<DateTime<Utc>>,
}

impl From<DeliveryRow> for DeliveryPreferences {
    fn from(row: DeliveryRow) -> Self {
        Self {
            address: row.address,
            instructions: row.instructions,
            preferred_date: row.preferred_date,
        }
    }
}

fn delivery_to_row(delivery: &DeliveryPreferences) -> DeliveryRow {
    DeliveryRow {
        address: delivery.address.clone(),
        instructions: delivery.instructions.clone(),
        preferred_date: delivery.preferred_date,
    }
}

#[derive(Debug, SurrealValue)]
struct OrderRow {
    order_number: String,
    customer_id: String,
    items: Vec<OrderItemRow>,
    pricing: PricingRow,
    status: String,
    delivery: DeliveryRow,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct OrderRowWithId {
    record_id: String,
    order_number: String,
    customer_id: String,
    items: Vec<OrderItemRow>,
    pricing: PricingRow,
    status: String,
    delivery: DeliveryRow,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<OrderStatus, DbError> {
    match s {
        "Pending" => Ok(OrderStatus::Pending),
        "Processing" => Ok(OrderStatus::Processing),
        "Completed" => Ok(OrderStatus::Completed),
        "Cancelled" => Ok(OrderStatus::Cancelled),
        other => Err(DbError::Decode(format!("unknown order status: {other}"))),
    }
}

fn status_to_string(s: OrderStatus) -> &'static str {
    match s {
        OrderStatus::Pending => "Pending",
        OrderStatus::Processing => "Processing",
        OrderStatus::Completed => "Completed",
        OrderStatus::Cancelled => "Cancelled",
    }
}

fn assemble(
    id: Uuid,
    order_number: String,
    customer_id: String,
    items: Vec<OrderItemRow>,
    pricing: PricingRow,
    status: String,
    delivery: DeliveryRow,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Result<Order, DbError> {
    Ok(Order {
        id,
        order_number,
        customer_id: Uuid::parse_str(&customer_id)
            .map_err(|e| DbError::Decode(format!("invalid customer UUID: {e}")))?,
        items: items
            .into_iter()
            .map(OrderItemRow::try_into_item)
            .collect::<Result<Vec<_>, _>>()?,
        pricing: pricing.into(),
        status: parse_status(&status)?,
        delivery: delivery.into(),
        deleted_at,
        created_at,
        updated_at,
    })
}

impl OrderRow {
    fn into_order(self, id: Uuid) -> Result<Order, DbError> {
        assemble(
            id,
            self.order_number,
            self.customer_id,
            self.items,
            self.pricing,
            self.status,
            self.delivery,
            self.deleted_at,
            self.created_at,
            self.updated_at,
        )
    }
}

impl OrderRowWithId {
    fn try_into_order(self) -> Result<Order, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        assemble(
            id,
            self.order_number,
            self.customer_id,
            self.items,
            self.pricing,
            self.status,
            self.delivery,
            self.deleted_at,
            self.created_at,
            self.updated_at,
        )
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

#[derive(Debug, SurrealValue)]
struct StatusCountRow {
    status: String,
    total: u64,
}

#[derive(Debug, SurrealValue)]
struct RevenueRow {
    revenue: f64,
}

/// SurrealDB implementation of the Order repository.
#[derive(Clone)]
pub struct SurrealOrderRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrderRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OrderRepository for SurrealOrderRepository<C> {
    async fn create(&self, input: CreateOrder) -> ToolLinkResult<Order> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let items: Vec<OrderItemRow> = input.items.iter().map(item_to_row).collect();

        let result = self
            .db
            .query(
                "CREATE type::record('customer_order', $id) SET \
                 order_number = $order_number, \
                 customer_id = $customer_id, \
                 items = $items, pricing = $pricing, \
                 status = 'Pending', delivery = $delivery, \
                 deleted_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("order_number", input.order_number))
            .bind(("customer_id", input.customer_id.to_string()))
            .bind(("items", items))
            .bind(("pricing", pricing_to_row(&input.pricing)))
            .bind(("delivery", delivery_to_row(&input.delivery)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| map_unique_violation(e, UNIQUE_INDEXES))?;

        let rows: Vec<OrderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "order".into(),
            id: id_str,
        })?;

        Ok(row.into_order(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ToolLinkResult<Order> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('customer_order', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "order".into(),
            id: id_str,
        })?;

        Ok(row.into_order(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateOrder) -> ToolLinkResult<Order> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.delivery.is_some() {
            sets.push("delivery = $delivery");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('customer_order', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(status).to_string()));
        }
        if let Some(ref delivery) = input.delivery {
            builder = builder.bind(("delivery", delivery_to_row(delivery)));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<OrderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "order".into(),
            id: id_str,
        })?;

        Ok(row.into_order(id)?)
    }

    async fn soft_delete(&self, id: Uuid) -> ToolLinkResult<()> {
        self.db
            .query(
                "UPDATE type::record('customer_order', $id) SET \
                 deleted_at = time::now(), updated_at = time::now() \
                 WHERE deleted_at IS NONE",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        filter: OrderFilter,
        pagination: Pagination,
    ) -> ToolLinkResult<PaginatedResult<Order>> {
        let mut conditions = vec!["deleted_at IS NONE"];
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if filter.customer_id.is_some() {
            conditions.push("customer_id = $customer_id");
        }
        let where_clause = format!(" WHERE {}", conditions.join(" AND "));

        let status_bind = filter.status.map(|s| status_to_string(s).to_string());
        let customer_bind = filter.customer_id.map(|c| c.to_string());

        let count_query =
            format!("SELECT count() AS total FROM customer_order{where_clause} GROUP ALL");
        let mut builder = self.db.query(&count_query);
        if let Some(status) = status_bind.clone() {
            builder = builder.bind(("status", status));
        }
        if let Some(customer_id) = customer_bind.clone() {
            builder = builder.bind(("customer_id", customer_id));
        }
        let mut count_result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM customer_order{where_clause} \
             ORDER BY created_at DESC LIMIT $limit START $offset"
        );
        let mut builder = self.db.query(&list_query);
        if let Some(status) = status_bind {
            builder = builder.bind(("status", status));
        }
        if let Some(customer_id) = customer_bind {
            builder = builder.bind(("customer_id", customer_id));
        }
        let mut result = builder
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrderRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_order())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }

    async fn stats(&self) -> ToolLinkResult<OrderStats> {
        let mut result = self
            .db
            .query(
                "SELECT status, count() AS total FROM customer_order \
                 WHERE deleted_at IS NONE GROUP BY status",
            )
            .await
            .map_err(DbError::from)?;
        let rows: Vec<StatusCountRow> = result.take(0).map_err(DbError::from)?;

        let mut stats = OrderStats::default();
        for row in rows {
            stats.total_orders += row.total;
            match parse_status(&row.status)? {
                OrderStatus::Pending => stats.pending = row.total,
                OrderStatus::Processing => stats.processing = row.total,
                OrderStatus::Completed => stats.completed = row.total,
                OrderStatus::Cancelled => stats.cancelled = row.total,
            }
        }

        let mut result = self
            .db
            .query(
                "SELECT math::sum(pricing.total) AS revenue FROM customer_order \
                 WHERE deleted_at IS NONE AND status != 'Cancelled' GROUP ALL",
            )
            .await
            .map_err(DbError::from)?;
        let revenue_rows: Vec<RevenueRow> = result.take(0).map_err(DbError::from)?;
        stats.revenue = revenue_rows.first().map(|r| r.revenue).unwrap_or(0.0);

        Ok(stats)
    }

    async fn list_since(&self, since: DateTime<Utc>) -> ToolLinkResult<Vec<Order>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM customer_order \
                 WHERE deleted_at IS NONE AND status != 'Cancelled' \
                 AND created_at >= $since",
            )
            .bind(("since", since))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrderRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_order())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
