//! SurrealDB implementation of [`FeedbackRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use toollink_core::error::{ToolLinkError, ToolLinkResult};
use toollink_core::models::feedback::{CreateFeedback, Feedback, FeedbackStatus};
use toollink_core::repository::{
    FeedbackFilter, FeedbackRepository, PaginatedResult, Pagination,
};
use uuid::Uuid;

use crate::error::DbError;

fn parse_status(s: &str) -> Result<FeedbackStatus, DbError> {
    match s {
        "Pending" => Ok(FeedbackStatus::Pending),
        "Resolved" => Ok(FeedbackStatus::Resolved),
        other => Err(DbError::Decode(format!("unknown feedback status: {other}"))),
    }
}

fn status_to_string(status: FeedbackStatus) -> &'static str {
    match status {
        FeedbackStatus::Pending => "Pending",
        FeedbackStatus::Resolved => "Resolved",
    }
}

#[derive(Debug, SurrealValue)]
struct FeedbackRow {
    user_id: String,
    subject: String,
    message: String,
    rating: Option<i64>,
    status: String,
    resolved_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct FeedbackRowWithId {
    record_id: String,
    user_id: String,
    subject: String,
    message: String,
    rating: Option<i64>,
    status: String,
    resolved_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_uuid(s: &str, field: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

fn parse_rating(rating: Option<i64>) -> Result<Option<u8>, DbError> {
    rating
        .map(|r| u8::try_from(r).map_err(|_| DbError::Decode(format!("rating out of range: {r}"))))
        .transpose()
}

impl FeedbackRow {
    fn into_feedback(self, id: Uuid) -> Result<Feedback, DbError> {
        Ok(Feedback {
            id,
            user_id: parse_uuid(&self.user_id, "user")?,
            subject: self.subject,
            message: self.message,
            rating: parse_rating(self.rating)?,
            status: parse_status(&self.status)?,
            resolved_by: self
                .resolved_by
                .as_deref()
                .map(|s| parse_uuid(s, "resolver"))
                .transpose()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl FeedbackRowWithId {
    fn try_into_feedback(self) -> Result<Feedback, DbError> {
        let id = parse_uuid(&self.record_id, "record")?;
        Ok(Feedback {
            id,
            user_id: parse_uuid(&self.user_id, "user")?,
            subject: self.subject,
            message: self.message,
            rating: parse_rating(self.rating)?,
            status: parse_status(&self.status)?,
            resolved_by: self
                .resolved_by
                .as_deref()
                .map(|s| parse_uuid(s, "resolver"))
                .transpose()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Feedback repository.
#[derive(Clone)]
pub struct SurrealFeedbackRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealFeedbackRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> FeedbackRepository for SurrealFeedbackRepository<C> {
    async fn create(&self, input: CreateFeedback) -> ToolLinkResult<Feedback> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('feedback', $id) SET \
                 user_id = $user_id, subject = $subject, \
                 message = $message, rating = $rating, \
                 status = 'Pending'",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("subject", input.subject))
            .bind(("message", input.message))
            .bind(("rating", input.rating.map(i64::from)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FeedbackRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "feedback".into(),
            id: id_str,
        })?;

        Ok(row.into_feedback(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ToolLinkResult<Feedback> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('feedback', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FeedbackRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "feedback".into(),
            id: id_str,
        })?;

        Ok(row.into_feedback(id)?)
    }

    async fn resolve(&self, id: Uuid, resolver: Uuid) -> ToolLinkResult<Feedback> {
        let current = self.get_by_id(id).await?;
        if current.status == FeedbackStatus::Resolved {
            return Err(ToolLinkError::Conflict {
                message: format!("feedback {id} is already resolved"),
            });
        }

        let id_str = id.to_string();
        let mut result = self
            .db
            .query(
                "UPDATE type::record('feedback', $id) SET \
                 status = 'Resolved', resolved_by = $resolver, \
                 updated_at = time::now() \
                 WHERE status = 'Pending'",
            )
            .bind(("id", id_str.clone()))
            .bind(("resolver", resolver.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FeedbackRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| ToolLinkError::Conflict {
            message: format!("feedback {id} is already resolved"),
        })?;

        Ok(row.into_feedback(id)?)
    }

    async fn list(
        &self,
        filter: FeedbackFilter,
        pagination: Pagination,
    ) -> ToolLinkResult<PaginatedResult<Feedback>> {
        let mut conditions = Vec::new();
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if filter.user_id.is_some() {
            conditions.push("user_id = $user_id");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let status_bind = filter.status.map(status_to_string);
        let user_bind = filter.user_id.map(|u| u.to_string());

        let count_query = format!("SELECT count() AS total FROM feedback{where_clause} GROUP ALL");
        let mut builder = self.db.query(&count_query);
        if let Some(status) = status_bind {
            builder = builder.bind(("status", status));
        }
        if let Some(user) = user_bind.clone() {
            builder = builder.bind(("user_id", user));
        }
        let mut count_result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM feedback{where_clause} \
             ORDER BY created_at DESC LIMIT $limit START $offset"
        );
        let mut builder = self.db.query(&list_query);
        if let Some(status) = status_bind {
            builder = builder.bind(("status", status));
        }
        if let Some(user) = user_bind {
            builder = builder.bind(("user_id", user));
        }
        let mut result = builder
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FeedbackRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_feedback())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }
}
