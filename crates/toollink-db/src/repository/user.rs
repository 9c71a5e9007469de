//! SurrealDB implementation of [`UserRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use toollink_core::error::ToolLinkResult;
use toollink_core::models::user::{ApprovalStatus, CreateUser, UpdateUser, User};
use toollink_core::rbac::Role;
use toollink_core::repository::{PaginatedResult, Pagination, UserFilter, UserRepository};
use uuid::Uuid;

use crate::error::{DbError, map_unique_violation};

const UNIQUE_INDEXES: &[(&str, &str)] = &[
    ("idx_user_email", "email"),
    ("idx_user_username", "username"),
];

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    username: String,
    email: String,
    password_hash: String,
    full_name: String,
    phone: Option<String>,
    role: String,
    approval_status: String,
    is_active: bool,
    email_verified: bool,
    failed_login_attempts: u32,
    locked_until: Option<DateTime<Utc>>,
    approved_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    username: String,
    email: String,
    password_hash: String,
    full_name: String,
    phone: Option<String>,
    role: String,
    approval_status: String,
    is_active: bool,
    email_verified: bool,
    failed_login_attempts: u32,
    locked_until: Option<DateTime<Utc>>,
    approved_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<Role, DbError> {
    Role::parse(s).ok_or_else(|| DbError::Decode(format!("unknown role: {s}")))
}

fn parse_approval(s: &str) -> Result<ApprovalStatus, DbError> {
    match s {
        "Pending" => Ok(ApprovalStatus::Pending),
        "Active" => Ok(ApprovalStatus::Active),
        "Rejected" => Ok(ApprovalStatus::Rejected),
        other => Err(DbError::Decode(format!("unknown approval status: {other}"))),
    }
}

fn approval_to_string(s: ApprovalStatus) -> &'static str {
    match s {
        ApprovalStatus::Pending => "Pending",
        ApprovalStatus::Active => "Active",
        ApprovalStatus::Rejected => "Rejected",
    }
}

fn parse_opt_uuid(s: Option<String>, what: &str) -> Result<Option<Uuid>, DbError> {
    s.map(|v| {
        Uuid::parse_str(&v).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
    })
    .transpose()
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            full_name: self.full_name,
            phone: self.phone,
            role: parse_role(&self.role)?,
            approval_status: parse_approval(&self.approval_status)?,
            is_active: self.is_active,
            email_verified: self.email_verified,
            failed_login_attempts: self.failed_login_attempts,
            locked_until: self.locked_until,
            approved_by: parse_opt_uuid(self.approved_by, "approver")?,
            approved_at: self.approved_at,
            last_login_at: self.last_login_at,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            full_name: self.full_name,
            phone: self.phone,
            role: parse_role(&self.role)?,
            approval_status: parse_approval(&self.approval_status)?,
            is_active: self.is_active,
            email_verified: self.email_verified,
            failed_login_attempts: self.failed_login_attempts,
            locked_until: self.locked_until,
            approved_by: parse_opt_uuid(self.approved_by, "approver")?,
            approved_at: self.approved_at,
            last_login_at: self.last_login_at,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> ToolLinkResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 username = $username, email = $email, \
                 password_hash = $password_hash, \
                 full_name = $full_name, phone = $phone, \
                 role = $role, approval_status = $approval_status, \
                 is_active = true, email_verified = false, \
                 failed_login_attempts = 0, \
                 locked_until = NONE, approved_by = NONE, \
                 approved_at = NONE, last_login_at = NONE, \
                 deleted_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("username", input.username))
            .bind(("email", input.email))
            .bind(("password_hash", input.password_hash))
            .bind(("full_name", input.full_name))
            .bind(("phone", input.phone))
            .bind(("role", input.role.as_str().to_string()))
            .bind((
                "approval_status",
                approval_to_string(input.approval_status).to_string(),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| map_unique_violation(e, UNIQUE_INDEXES))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ToolLinkResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_email(&self, email: &str) -> ToolLinkResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE email = $email",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn get_by_username(&self, username: &str) -> ToolLinkResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE username = $username",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("username={username}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> ToolLinkResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.username.is_some() {
            sets.push("username = $username");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        if input.full_name.is_some() {
            sets.push("full_name = $full_name");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.approval_status.is_some() {
            sets.push("approval_status = $approval_status");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        if input.email_verified.is_some() {
            sets.push("email_verified = $email_verified");
        }
        if input.failed_login_attempts.is_some() {
            sets.push("failed_login_attempts = $failed_login_attempts");
        }
        if input.locked_until.is_some() {
            sets.push("locked_until = $locked_until");
        }
        if input.approved_by.is_some() {
            sets.push("approved_by = $approved_by");
        }
        if input.approved_at.is_some() {
            sets.push("approved_at = $approved_at");
        }
        if input.last_login_at.is_some() {
            sets.push("last_login_at = $last_login_at");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(username) = input.username {
            builder = builder.bind(("username", username));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(password_hash) = input.password_hash {
            builder = builder.bind(("password_hash", password_hash));
        }
        if let Some(full_name) = input.full_name {
            builder = builder.bind(("full_name", full_name));
        }
        if let Some(phone) = input.phone {
            // Option<Option<String>>: Some(Some(v)) = set, Some(None) = clear
            builder = builder.bind(("phone", phone));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role.as_str().to_string()));
        }
        if let Some(approval_status) = input.approval_status {
            builder = builder.bind((
                "approval_status",
                approval_to_string(approval_status).to_string(),
            ));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }
        if let Some(email_verified) = input.email_verified {
            builder = builder.bind(("email_verified", email_verified));
        }
        if let Some(failed_login_attempts) = input.failed_login_attempts {
            builder = builder.bind(("failed_login_attempts", failed_login_attempts));
        }
        if let Some(locked_until) = input.locked_until {
            builder = builder.bind(("locked_until", locked_until));
        }
        if let Some(approved_by) = input.approved_by {
            builder = builder.bind(("approved_by", approved_by.to_string()));
        }
        if let Some(approved_at) = input.approved_at {
            builder = builder.bind(("approved_at", approved_at));
        }
        if let Some(last_login_at) = input.last_login_at {
            builder = builder.bind(("last_login_at", last_login_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| map_unique_violation(e, UNIQUE_INDEXES))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn soft_delete(&self, id: Uuid) -> ToolLinkResult<()> {
        // Repeating a soft delete matches no rows and is a no-op.
        self.db
            .query(
                "UPDATE type::record('user', $id) SET \
                 is_active = false, deleted_at = time::now(), \
                 updated_at = time::now() \
                 WHERE deleted_at IS NONE",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn hard_delete(&self, id: Uuid) -> ToolLinkResult<()> {
        let user = self.get_by_id(id).await?;
        if user.deleted_at.is_none() {
            return Err(toollink_core::ToolLinkError::Conflict {
                message: "hard delete requires a prior soft delete".into(),
            });
        }

        self.db
            .query("DELETE type::record('user', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        filter: UserFilter,
        pagination: Pagination,
    ) -> ToolLinkResult<PaginatedResult<User>> {
        let mut conditions = Vec::new();
        if filter.role.is_some() {
            conditions.push("role = $role");
        }
        if filter.approval_status.is_some() {
            conditions.push("approval_status = $approval_status");
        }
        if filter.active_only {
            conditions.push("deleted_at IS NONE");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let role_bind = filter.role.map(|r| r.as_str().to_string());
        let approval_bind = filter
            .approval_status
            .map(|s| approval_to_string(s).to_string());

        let count_query = format!("SELECT count() AS total FROM user{where_clause} GROUP ALL");
        let mut builder = self.db.query(&count_query);
        if let Some(role) = role_bind.clone() {
            builder = builder.bind(("role", role));
        }
        if let Some(approval_status) = approval_bind.clone() {
            builder = builder.bind(("approval_status", approval_status));
        }
        let mut count_result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM user{where_clause} \
             ORDER BY created_at ASC LIMIT $limit START $offset"
        );
        let mut builder = self.db.query(&list_query);
        if let Some(role) = role_bind {
            builder = builder.bind(("role", role));
        }
        if let Some(approval_status) = approval_bind {
            builder = builder.bind(("approval_status", approval_status));
        }
        let mut result = builder
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }
}
