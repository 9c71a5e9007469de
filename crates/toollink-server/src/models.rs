//! Request and response shapes for the HTTP API.

use serde::{Deserialize, Serialize};
use toollink_core::models::inventory::{StockLocation, SupplierContact};
use toollink_core::models::order::{DeliveryPreferences, OrderStatus};
use toollink_core::models::report::ReportType;
use toollink_core::models::user::{ApprovalStatus, UserProfile};
use toollink_core::rbac::Role;
use toollink_core::repository::{PaginatedResult, Pagination};
use uuid::Uuid;

/// Hard ceiling on page size regardless of what the client asks for.
const MAX_PAGE_LIMIT: u64 = 100;

#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page).max(1),
            limit: self
                .limit
                .unwrap_or(defaults.limit)
                .clamp(1, MAX_PAGE_LIMIT),
        }
    }
}

/// Successful single-object envelope: `{ "success": true, "data": … }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// Successful list envelope with pagination metadata.
#[derive(Debug, Serialize)]
pub struct PagedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> PagedResponse<T> {
    pub fn from_result(result: PaginatedResult<T>) -> Self {
        let meta = PageMeta {
            page: result.page,
            limit: result.limit,
            total: result.total,
            total_pages: result.total_pages(),
        };
        Self {
            success: true,
            data: result.items,
            pagination: meta,
        }
    }
}

impl<T> PagedResponse<T> {
    /// Map the item type while keeping the pagination metadata.
    pub fn map_items<U>(result: PaginatedResult<T>, f: impl FnMut(T) -> U) -> PagedResponse<U> {
        let meta = PageMeta {
            page: result.page,
            limit: result.limit,
            total: result.total,
            total_pages: result.total_pages(),
        };
        PagedResponse {
            success: true,
            data: result.items.into_iter().map(f).collect(),
            pagination: meta,
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email or username. Accepts `email` as a field name for clients
    /// that only ever send one.
    #[serde(alias = "email")]
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UserQuery {
    pub role: Option<Role>,
    pub approval_status: Option<ApprovalStatus>,
    #[serde(default)]
    pub active_only: bool,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DeleteQuery {
    /// Hard deletion is only legal on already-soft-deleted records.
    #[serde(default)]
    pub hard: bool,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub item_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub delivery: Option<DeliveryPreferences>,
    pub discount: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateOrderRequest {
    /// Immutable — present only so its inclusion can be rejected.
    pub order_number: Option<String>,
    pub status: Option<OrderStatus>,
    pub delivery: Option<DeliveryPreferences>,
}

#[derive(Debug, Deserialize, Default)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateInventoryRequest {
    pub name: String,
    pub category: String,
    pub sku: String,
    pub description: Option<String>,
    pub quantity: u32,
    pub unit: String,
    pub reorder_threshold: u32,
    pub cost_price: f64,
    pub selling_price: f64,
    pub currency: Option<String>,
    #[serde(default)]
    pub location: StockLocation,
    #[serde(default)]
    pub supplier: SupplierContact,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateInventoryRequest {
    /// Immutable — present only so its inclusion can be rejected.
    pub sku: Option<String>,
    /// Stock changes must go through the adjust endpoint.
    pub quantity: Option<u32>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub reorder_threshold: Option<u32>,
    pub cost_price: Option<f64>,
    pub selling_price: Option<f64>,
    pub currency: Option<String>,
    pub location: Option<StockLocation>,
    pub supplier: Option<SupplierContact>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    /// Signed delta; a negative value records consumption.
    pub delta: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct InventoryQuery {
    pub category: Option<String>,
    #[serde(default)]
    pub active_only: bool,
    #[serde(default)]
    pub low_stock_only: bool,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

// ---------------------------------------------------------------------------
// Notifications, feedback, reports, predictions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct NotificationQuery {
    pub user_id: Option<Uuid>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFeedbackRequest {
    pub subject: String,
    pub message: String,
    pub rating: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FeedbackQuery {
    pub status: Option<toollink_core::models::feedback::FeedbackStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub report_type: ReportType,
    pub parameters: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePredictionRequest {
    pub item_id: Uuid,
    /// Historical window to derive demand from. Defaults to 30 days.
    pub window_days: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PredictionQuery {
    pub item_id: Option<Uuid>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct BulkUsersRequest {
    pub users: Vec<CreateUserRequest>,
}

#[derive(Debug, Serialize)]
pub struct BulkUserResult {
    pub username: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AuditLogQuery {
    pub actor_id: Option<Uuid>,
    pub entity_type: Option<String>,
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}
