//! SurrealDB implementation of [`PredictionRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use toollink_core::error::ToolLinkResult;
use toollink_core::models::prediction::{CreatePrediction, Prediction};
use toollink_core::repository::{PaginatedResult, Pagination, PredictionRepository};
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PredictionRow {
    item_id: String,
    window_days: u32,
    predicted_quantity: u32,
    confidence: f64,
    created_by: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct PredictionRowWithId {
    record_id: String,
    item_id: String,
    window_days: u32,
    predicted_quantity: u32,
    confidence: f64,
    created_by: String,
    created_at: DateTime<Utc>,
}

fn parse_uuid(s: &str, field: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

impl PredictionRow {
    fn into_prediction(self, id: Uuid) -> Result<Prediction, DbError> {
        Ok(Prediction {
            id,
            item_id: parse_uuid(&self.item_id, "item")?,
            window_days: self.window_days,
            predicted_quantity: self.predicted_quantity,
            confidence: self.confidence,
            created_by: parse_uuid(&self.created_by, "creator")?,
            created_at: self.created_at,
        })
    }
}

impl PredictionRowWithId {
    fn try_into_prediction(self) -> Result<Prediction, DbError> {
        let id = parse_uuid(&self.record_id, "record")?;
        Ok(Prediction {
            id,
            item_id: parse_uuid(&self.item_id, "item")?,
            window_days: self.window_days,
            predicted_quantity: self.predicted_quantity,
            confidence: self.confidence,
            created_by: parse_uuid(&self.created_by, "creator")?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Prediction repository.
#[derive(Clone)]
pub struct SurrealPredictionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPredictionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PredictionRepository for SurrealPredictionRepository<C> {
    async fn create(&self, input: CreatePrediction) -> ToolLinkResult<Prediction> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('prediction', $id) SET \
                 item_id = $item_id, window_days = $window_days, \
                 predicted_quantity = $predicted_quantity, \
                 confidence = $confidence, created_by = $created_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("item_id", input.item_id.to_string()))
            .bind(("window_days", input.window_days))
            .bind(("predicted_quantity", input.predicted_quantity))
            .bind(("confidence", input.confidence))
            .bind(("created_by", input.created_by.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PredictionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "prediction".into(),
            id: id_str,
        })?;

        Ok(row.into_prediction(id)?)
    }

    async fn list(
        &self,
        item_id: Option<Uuid>,
        pagination: Pagination,
    ) -> ToolLinkResult<PaginatedResult<Prediction>> {
        let where_clause = if item_id.is_some() {
            " WHERE item_id = $item_id"
        } else {
            ""
        };
        let item_bind = item_id.map(|u| u.to_string());

        let count_query =
            format!("SELECT count() AS total FROM prediction{where_clause} GROUP ALL");
        let mut builder = self.db.query(&count_query);
        if let Some(item) = item_bind.clone() {
            builder = builder.bind(("item_id", item));
        }
        let mut count_result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM prediction{where_clause} \
             ORDER BY created_at DESC LIMIT $limit START $offset"
        );
        let mut builder = self.db.query(&list_query);
        if let Some(item) = item_bind {
            builder = builder.bind(("item_id", item));
        }
        let mut result = builder
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PredictionRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_prediction())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }
}
