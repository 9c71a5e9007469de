//! SurrealDB implementation of [`ActivityLogRepository`].
//!
//! The activity table is append-only; there is deliberately no update
//! or delete path here.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use toollink_core::error::ToolLinkResult;
use toollink_core::models::activity::{
    Activity, ActivityAction, ActivityOutcome, CreateActivity,
};
use toollink_core::repository::{
    ActivityFilter, ActivityLogRepository, PaginatedResult, Pagination,
};
use uuid::Uuid;

use crate::error::DbError;

fn action_to_string(action: ActivityAction) -> &'static str {
    match action {
        ActivityAction::UserRegistered => "UserRegistered",
        ActivityAction::UserLoggedIn => "UserLoggedIn",
        ActivityAction::LoginFailed => "LoginFailed",
        ActivityAction::UserApproved => "UserApproved",
        ActivityAction::UserRejected => "UserRejected",
        ActivityAction::UserUpdated => "UserUpdated",
        ActivityAction::UserDeleted => "UserDeleted",
        ActivityAction::UsersBulkCreated => "UsersBulkCreated",
        ActivityAction::PasswordChanged => "PasswordChanged",
        ActivityAction::OrderCreated => "OrderCreated",
        ActivityAction::OrderStatusChanged => "OrderStatusChanged",
        ActivityAction::OrderDeleted => "OrderDeleted",
        ActivityAction::InventoryCreated => "InventoryCreated",
        ActivityAction::InventoryUpdated => "InventoryUpdated",
        ActivityAction::InventoryAdjusted => "InventoryAdjusted",
        ActivityAction::InventoryDeleted => "InventoryDeleted",
        ActivityAction::NotificationCreated => "NotificationCreated",
        ActivityAction::FeedbackSubmitted => "FeedbackSubmitted",
        ActivityAction::FeedbackResolved => "FeedbackResolved",
        ActivityAction::ReportGenerated => "ReportGenerated",
        ActivityAction::PredictionCreated => "PredictionCreated",
        ActivityAction::ConfigUpdated => "ConfigUpdated",
    }
}

fn parse_action(s: &str) -> Result<ActivityAction, DbError> {
    let action = match s {
        "UserRegistered" => ActivityAction::UserRegistered,
        "UserLoggedIn" => ActivityAction::UserLoggedIn,
        "LoginFailed" => ActivityAction::LoginFailed,
        "UserApproved" => ActivityAction::UserApproved,
        "UserRejected" => ActivityAction::UserRejected,
        "UserUpdated" => ActivityAction::UserUpdated,
        "UserDeleted" => ActivityAction::UserDeleted,
        "UsersBulkCreated" => ActivityAction::UsersBulkCreated,
        "PasswordChanged" => ActivityAction::PasswordChanged,
        "OrderCreated" => ActivityAction::OrderCreated,
        "OrderStatusChanged" => ActivityAction::OrderStatusChanged,
        "OrderDeleted" => ActivityAction::OrderDeleted,
        "InventoryCreated" => ActivityAction::InventoryCreated,
        "InventoryUpdated" => ActivityAction::InventoryUpdated,
        "InventoryAdjusted" => ActivityAction::InventoryAdjusted,
        "InventoryDeleted" => ActivityAction::InventoryDeleted,
        "NotificationCreated" => ActivityAction::NotificationCreated,
        "FeedbackSubmitted" => ActivityAction::FeedbackSubmitted,
        "FeedbackResolved" => ActivityAction::FeedbackResolved,
        "ReportGenerated" => ActivityAction::ReportGenerated,
        "PredictionCreated" => ActivityAction::PredictionCreated,
        "ConfigUpdated" => ActivityAction::ConfigUpdated,
        other => return Err(DbError::Decode(format!("unknown activity action: {other}"))),
    };
    Ok(action)
}

fn outcome_to_string(outcome: ActivityOutcome) -> &'static str {
    match outcome {
        ActivityOutcome::Success => "Success",
        ActivityOutcome::Failure => "Failure",
        ActivityOutcome::Partial => "Partial",
    }
}

fn parse_outcome(s: &str) -> Result<ActivityOutcome, DbError> {
    match s {
        "Success" => Ok(ActivityOutcome::Success),
        "Failure" => Ok(ActivityOutcome::Failure),
        "Partial" => Ok(ActivityOutcome::Partial),
        other => Err(DbError::Decode(format!("unknown activity outcome: {other}"))),
    }
}

fn parse_opt_uuid(s: &Option<String>, field: &str) -> Result<Option<Uuid>, DbError> {
    match s {
        Some(v) => Uuid::parse_str(v)
            .map(Some)
            .map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}"))),
        None => Ok(None),
    }
}

fn json_to_row(value: &Option<serde_json::Value>) -> Result<Option<String>, DbError> {
    match value {
        Some(v) => serde_json::to_string(v)
            .map(Some)
            .map_err(|e| DbError::Decode(format!("unencodable payload: {e}"))),
        None => Ok(None),
    }
}

fn row_to_json(value: &Option<String>) -> Result<Option<serde_json::Value>, DbError> {
    match value {
        Some(v) => serde_json::from_str(v)
            .map(Some)
            .map_err(|e| DbError::Decode(format!("malformed payload: {e}"))),
        None => Ok(None),
    }
}

#[derive(Debug, SurrealValue)]
struct ActivityRow {
    actor_id: Option<String>,
    action: String,
    entity_type: String,
    entity_id: Option<String>,
    before: Option<String>,
    after: Option<String>,
    ip_address: Option<String>,
    outcome: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ActivityRowWithId {
    record_id: String,
    actor_id: Option<String>,
    action: String,
    entity_type: String,
    entity_id: Option<String>,
    before: Option<String>,
    after: Option<String>,
    ip_address: Option<String>,
    outcome: String,
    timestamp: DateTime<Utc>,
}

impl ActivityRow {
    fn into_activity(self, id: Uuid) -> Result<Activity, DbError> {
        Ok(Activity {
            id,
            actor_id: parse_opt_uuid(&self.actor_id, "actor")?,
            action: parse_action(&self.action)?,
            entity_type: self.entity_type,
            entity_id: parse_opt_uuid(&self.entity_id, "entity")?,
            before: row_to_json(&self.before)?,
            after: row_to_json(&self.after)?,
            ip_address: self.ip_address,
            outcome: parse_outcome(&self.outcome)?,
            timestamp: self.timestamp,
        })
    }
}

impl ActivityRowWithId {
    fn try_into_activity(self) -> Result<Activity, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(Activity {
            id,
            actor_id: parse_opt_uuid(&self.actor_id, "actor")?,
            action: parse_action(&self.action)?,
            entity_type: self.entity_type,
            entity_id: parse_opt_uuid(&self.entity_id, "entity")?,
            before: row_to_json(&self.before)?,
            after: row_to_json(&self.after)?,
            ip_address: self.ip_address,
            outcome: parse_outcome(&self.outcome)?,
            timestamp: self.timestamp,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the append-only activity log.
#[derive(Clone)]
pub struct SurrealActivityLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealActivityLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ActivityLogRepository for SurrealActivityLogRepository<C> {
    async fn append(&self, input: CreateActivity) -> ToolLinkResult<Activity> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('activity', $id) SET \
                 actor_id = $actor_id, action = $action, \
                 entity_type = $entity_type, entity_id = $entity_id, \
                 before = $before, after = $after, \
                 ip_address = $ip_address, outcome = $outcome",
            )
            .bind(("id", id_str.clone()))
            .bind(("actor_id", input.actor_id.map(|u| u.to_string())))
            .bind(("action", action_to_string(input.action)))
            .bind(("entity_type", input.entity_type))
            .bind(("entity_id", input.entity_id.map(|u| u.to_string())))
            .bind(("before", json_to_row(&input.before)?))
            .bind(("after", json_to_row(&input.after)?))
            .bind(("ip_address", input.ip_address))
            .bind(("outcome", outcome_to_string(input.outcome)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ActivityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "activity".into(),
            id: id_str,
        })?;

        Ok(row.into_activity(id)?)
    }

    async fn list(
        &self,
        filter: ActivityFilter,
        pagination: Pagination,
    ) -> ToolLinkResult<PaginatedResult<Activity>> {
        let mut conditions = Vec::new();
        if filter.actor_id.is_some() {
            conditions.push("actor_id = $actor_id");
        }
        if filter.entity_type.is_some() {
            conditions.push("entity_type = $entity_type");
        }
        if filter.from.is_some() {
            conditions.push("timestamp >= $from");
        }
        if filter.to.is_some() {
            conditions.push("timestamp <= $to");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let actor_bind = filter.actor_id.map(|u| u.to_string());

        let count_query = format!("SELECT count() AS total FROM activity{where_clause} GROUP ALL");
        let mut builder = self.db.query(&count_query);
        if let Some(actor) = actor_bind.clone() {
            builder = builder.bind(("actor_id", actor));
        }
        if let Some(entity_type) = filter.entity_type.clone() {
            builder = builder.bind(("entity_type", entity_type));
        }
        if let Some(from) = filter.from {
            builder = builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", to));
        }
        let mut count_result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM activity{where_clause} \
             ORDER BY timestamp DESC LIMIT $limit START $offset"
        );
        let mut builder = self.db.query(&list_query);
        if let Some(actor) = actor_bind {
            builder = builder.bind(("actor_id", actor));
        }
        if let Some(entity_type) = filter.entity_type {
            builder = builder.bind(("entity_type", entity_type));
        }
        if let Some(from) = filter.from {
            builder = builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", to));
        }
        let mut result = builder
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ActivityRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_activity())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }
}
