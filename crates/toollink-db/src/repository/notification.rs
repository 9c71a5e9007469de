//! SurrealDB implementation of [`NotificationRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use toollink_core::error::ToolLinkResult;
use toollink_core::models::notification::{
    CreateNotification, Notification, NotificationStatus,
};
use toollink_core::repository::{NotificationRepository, PaginatedResult, Pagination};
use uuid::Uuid;

use crate::error::DbError;

fn parse_status(s: &str) -> Result<NotificationStatus, DbError> {
    match s {
        "Unread" => Ok(NotificationStatus::Unread),
        "Read" => Ok(NotificationStatus::Read),
        other => Err(DbError::Decode(format!(
            "unknown notification status: {other}"
        ))),
    }
}

#[derive(Debug, SurrealValue)]
struct NotificationRow {
    user_id: String,
    title: String,
    message: String,
    status: String,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct NotificationRowWithId {
    record_id: String,
    user_id: String,
    title: String,
    message: String,
    status: String,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_notification(self, id: Uuid) -> Result<Notification, DbError> {
        Ok(Notification {
            id,
            user_id: Uuid::parse_str(&self.user_id)
                .map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))?,
            title: self.title,
            message: self.message,
            status: parse_status(&self.status)?,
            read_at: self.read_at,
            created_at: self.created_at,
        })
    }
}

impl NotificationRowWithId {
    fn try_into_notification(self) -> Result<Notification, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(Notification {
            id,
            user_id: Uuid::parse_str(&self.user_id)
                .map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))?,
            title: self.title,
            message: self.message,
            status: parse_status(&self.status)?,
            read_at: self.read_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Notification repository.
#[derive(Clone)]
pub struct SurrealNotificationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealNotificationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> NotificationRepository for SurrealNotificationRepository<C> {
    async fn create(&self, input: CreateNotification) -> ToolLinkResult<Notification> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('notification', $id) SET \
                 user_id = $user_id, title = $title, \
                 message = $message, status = 'Unread'",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("title", input.title))
            .bind(("message", input.message))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "notification".into(),
            id: id_str,
        })?;

        Ok(row.into_notification(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ToolLinkResult<Notification> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('notification', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "notification".into(),
            id: id_str,
        })?;

        Ok(row.into_notification(id)?)
    }

    async fn mark_read(&self, id: Uuid) -> ToolLinkResult<Notification> {
        let id_str = id.to_string();

        // Marking an already-read notification again leaves the original
        // read_at untouched.
        let mut result = self
            .db
            .query(
                "UPDATE type::record('notification', $id) SET \
                 status = 'Read', \
                 read_at = read_at ?? time::now()",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "notification".into(),
            id: id_str,
        })?;

        Ok(row.into_notification(id)?)
    }

    async fn delete(&self, id: Uuid) -> ToolLinkResult<()> {
        self.db
            .query("DELETE type::record('notification', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> ToolLinkResult<PaginatedResult<Notification>> {
        let where_clause = if user_id.is_some() {
            " WHERE user_id = $user_id"
        } else {
            ""
        };
        let user_bind = user_id.map(|u| u.to_string());

        let count_query =
            format!("SELECT count() AS total FROM notification{where_clause} GROUP ALL");
        let mut builder = self.db.query(&count_query);
        if let Some(user) = user_bind.clone() {
            builder = builder.bind(("user_id", user));
        }
        let mut count_result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM notification{where_clause} \
             ORDER BY created_at DESC LIMIT $limit START $offset"
        );
        let mut builder = self.db.query(&list_query);
        if let Some(user) = user_bind {
            builder = builder.bind(("user_id", user));
        }
        let mut result = builder
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_notification())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }
}
