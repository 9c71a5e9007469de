//! SurrealDB implementation of [`SessionRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use toollink_core::error::ToolLinkResult;
use toollink_core::models::session::{CreateSession, Session};
use toollink_core::repository::SessionRepository;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SessionRow {
    user_id: String,
    token_hash: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: String,
    user_id: String,
    token_hash: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

fn parse_user_id(s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))
}

impl SessionRow {
    fn into_session(self, id: Uuid) -> Result<Session, DbError> {
        Ok(Session {
            id,
            user_id: parse_user_id(&self.user_id)?,
            token_hash: self.token_hash,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

impl SessionRowWithId {
    fn try_into_session(self) -> Result<Session, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(Session {
            id,
            user_id: parse_user_id(&self.user_id)?,
            token_hash: self.token_hash,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession) -> ToolLinkResult<Session> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('session', $id) SET \
                 user_id = $user_id, token_hash = $token_hash, \
                 ip_address = $ip_address, user_agent = $user_agent, \
                 expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("token_hash", input.token_hash))
            .bind(("ip_address", input.ip_address))
            .bind(("user_agent", input.user_agent))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: id_str,
        })?;

        Ok(row.into_session(id)?)
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> ToolLinkResult<Session> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE token_hash = $token_hash",
            )
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: "token_hash".into(),
        })?;

        Ok(row.try_into_session()?)
    }

    async fn invalidate(&self, id: Uuid) -> ToolLinkResult<()> {
        self.db
            .query("DELETE type::record('session', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn invalidate_user_sessions(&self, user_id: Uuid) -> ToolLinkResult<()> {
        self.db
            .query("DELETE session WHERE user_id = $user_id")
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> ToolLinkResult<u64> {
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM session \
                 WHERE expires_at <= time::now() GROUP ALL",
            )
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query("DELETE session WHERE expires_at <= time::now()")
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }
}
