//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Soft deletes set a marker and
//! are idempotent; hard deletes are only legal on records that were
//! already soft-deleted. The activity log is append-only.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ToolLinkResult;
use crate::models::{
    activity::{Activity, CreateActivity},
    feedback::{CreateFeedback, Feedback, FeedbackStatus},
    inventory::{CreateInventoryItem, InventoryItem, UpdateInventoryItem},
    notification::{CreateNotification, Notification},
    order::{CreateOrder, Order, OrderStats, OrderStatus, UpdateOrder},
    prediction::{CreatePrediction, Prediction},
    report::{CreateReport, Report},
    session::{CreateSession, Session},
    settings::{Settings, UpdateSettings},
    user::{ApprovalStatus, CreateUser, UpdateUser, User},
};
use crate::rbac::Role;

/// Pagination parameters for list queries (1-based page index).
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

/// A paginated result set with the metadata the API surfaces.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> PaginatedResult<T> {
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit)
    }
}

// ---------------------------------------------------------------------------
// Users & sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub approval_status: Option<ApprovalStatus>,
    /// When false, soft-deleted users are included (admin views).
    pub active_only: bool,
}

pub trait UserRepository: Send + Sync {
    /// Fails with `DuplicateIdentity` when email or username collides.
    fn create(&self, input: CreateUser) -> impl Future<Output = ToolLinkResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ToolLinkResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = ToolLinkResult<User>> + Send;
    fn get_by_username(&self, username: &str)
    -> impl Future<Output = ToolLinkResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = ToolLinkResult<User>> + Send;
    /// Soft-delete: clears `is_active` and stamps `deleted_at`.
    /// Idempotent — repeating it is a no-op.
    fn soft_delete(&self, id: Uuid) -> impl Future<Output = ToolLinkResult<()>> + Send;
    /// Administrative cleanup. Fails with `Conflict` unless the record
    /// was already soft-deleted.
    fn hard_delete(&self, id: Uuid) -> impl Future<Output = ToolLinkResult<()>> + Send;
    fn list(
        &self,
        filter: UserFilter,
        pagination: Pagination,
    ) -> impl Future<Output = ToolLinkResult<PaginatedResult<User>>> + Send;
}

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession)
    -> impl Future<Output = ToolLinkResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = ToolLinkResult<Session>> + Send;
    /// Invalidate a single session (logout / rotation).
    fn invalidate(&self, id: Uuid) -> impl Future<Output = ToolLinkResult<()>> + Send;
    /// Invalidate all sessions for a user (e.g. on password change).
    fn invalidate_user_sessions(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = ToolLinkResult<()>> + Send;
    /// Remove all expired sessions, returning the number removed.
    fn cleanup_expired(&self) -> impl Future<Output = ToolLinkResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Orders & inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Ownership scoping — applied server-side for non-staff callers.
    pub customer_id: Option<Uuid>,
}

pub trait OrderRepository: Send + Sync {
    /// Fails with `DuplicateIdentity` on order-number collision.
    fn create(&self, input: CreateOrder) -> impl Future<Output = ToolLinkResult<Order>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ToolLinkResult<Order>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateOrder,
    ) -> impl Future<Output = ToolLinkResult<Order>> + Send;
    /// Soft-delete, preserving the audit trail. Idempotent.
    fn soft_delete(&self, id: Uuid) -> impl Future<Output = ToolLinkResult<()>> + Send;
    fn list(
        &self,
        filter: OrderFilter,
        pagination: Pagination,
    ) -> impl Future<Output = ToolLinkResult<PaginatedResult<Order>>> + Send;
    /// Counts by status plus revenue over non-cancelled orders.
    fn stats(&self) -> impl Future<Output = ToolLinkResult<OrderStats>> + Send;
    /// Non-cancelled orders created at or after `since` (prediction input).
    fn list_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = ToolLinkResult<Vec<Order>>> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    pub category: Option<String>,
    pub active_only: bool,
    pub low_stock_only: bool,
}

pub trait InventoryRepository: Send + Sync {
    /// Fails with `DuplicateIdentity` on SKU collision.
    fn create(
        &self,
        input: CreateInventoryItem,
    ) -> impl Future<Output = ToolLinkResult<InventoryItem>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ToolLinkResult<InventoryItem>> + Send;
    fn get_by_sku(&self, sku: &str)
    -> impl Future<Output = ToolLinkResult<InventoryItem>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateInventoryItem,
    ) -> impl Future<Output = ToolLinkResult<InventoryItem>> + Send;
    /// Apply a signed stock delta. Fails with `Validation` if the
    /// result would be negative — quantity can never go below zero.
    fn adjust_quantity(
        &self,
        id: Uuid,
        delta: i64,
    ) -> impl Future<Output = ToolLinkResult<InventoryItem>> + Send;
    /// Deactivate rather than delete (discontinued items). Idempotent.
    fn soft_delete(&self, id: Uuid) -> impl Future<Output = ToolLinkResult<()>> + Send;
    fn list(
        &self,
        filter: InventoryFilter,
        pagination: Pagination,
    ) -> impl Future<Output = ToolLinkResult<PaginatedResult<InventoryItem>>> + Send;
    /// Number of active items at or below their reorder threshold.
    fn count_low_stock(&self) -> impl Future<Output = ToolLinkResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Activity log (append-only)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub actor_id: Option<Uuid>,
    pub entity_type: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub trait ActivityLogRepository: Send + Sync {
    /// Append a new entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateActivity,
    ) -> impl Future<Output = ToolLinkResult<Activity>> + Send;
    fn list(
        &self,
        filter: ActivityFilter,
        pagination: Pagination,
    ) -> impl Future<Output = ToolLinkResult<PaginatedResult<Activity>>> + Send;
}

// ---------------------------------------------------------------------------
// Auxiliary entities
// ---------------------------------------------------------------------------

pub trait NotificationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateNotification,
    ) -> impl Future<Output = ToolLinkResult<Notification>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ToolLinkResult<Notification>> + Send;
    fn mark_read(&self, id: Uuid) -> impl Future<Output = ToolLinkResult<Notification>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ToolLinkResult<()>> + Send;
    fn list(
        &self,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> impl Future<Output = ToolLinkResult<PaginatedResult<Notification>>> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    pub status: Option<FeedbackStatus>,
    pub user_id: Option<Uuid>,
}

pub trait FeedbackRepository: Send + Sync {
    fn create(
        &self,
        input: CreateFeedback,
    ) -> impl Future<Output = ToolLinkResult<Feedback>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ToolLinkResult<Feedback>> + Send;
    /// `Pending → Resolved`; fails with `Conflict` if already resolved.
    fn resolve(
        &self,
        id: Uuid,
        resolver: Uuid,
    ) -> impl Future<Output = ToolLinkResult<Feedback>> + Send;
    fn list(
        &self,
        filter: FeedbackFilter,
        pagination: Pagination,
    ) -> impl Future<Output = ToolLinkResult<PaginatedResult<Feedback>>> + Send;
}

pub trait ReportRepository: Send + Sync {
    /// Creates the record in `Generating` state.
    fn create(&self, input: CreateReport) -> impl Future<Output = ToolLinkResult<Report>> + Send;
    fn complete(
        &self,
        id: Uuid,
        result: serde_json::Value,
    ) -> impl Future<Output = ToolLinkResult<Report>> + Send;
    fn fail(
        &self,
        id: Uuid,
        error: String,
    ) -> impl Future<Output = ToolLinkResult<Report>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ToolLinkResult<Report>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = ToolLinkResult<PaginatedResult<Report>>> + Send;
}

pub trait PredictionRepository: Send + Sync {
    fn create(
        &self,
        input: CreatePrediction,
    ) -> impl Future<Output = ToolLinkResult<Prediction>> + Send;
    fn list(
        &self,
        item_id: Option<Uuid>,
        pagination: Pagination,
    ) -> impl Future<Output = ToolLinkResult<PaginatedResult<Prediction>>> + Send;
}

pub trait SettingsRepository: Send + Sync {
    /// Returns defaults when no settings document exists yet.
    fn get(&self) -> impl Future<Output = ToolLinkResult<Settings>> + Send;
    fn update(
        &self,
        input: UpdateSettings,
    ) -> impl Future<Output = ToolLinkResult<Settings>> + Send;
}
