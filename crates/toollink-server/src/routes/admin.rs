//! Administrative endpoints: dashboard aggregates, audit trail, bulk
//! user provisioning and runtime configuration.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use surrealdb::Connection;
use toollink_auth::service::RegisterInput;
use toollink_core::models::activity::{
    Activity, ActivityAction, ActivityOutcome, CreateActivity,
};
use toollink_core::models::settings::{Settings, UpdateSettings};
use toollink_core::models::user::ApprovalStatus;
use toollink_core::rbac::Permission;
use toollink_core::repository::{
    ActivityFilter, ActivityLogRepository, InventoryFilter, InventoryRepository, OrderRepository,
    Pagination, SettingsRepository, UserFilter, UserRepository,
};

use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::models::{
    ApiResponse, AuditLogQuery, BulkUserResult, BulkUsersRequest, PagedResponse,
};
use crate::state::AppState;

pub fn routes<C: Connection>() -> Router<AppState<C>> {
    Router::new()
        .route("/dashboard", get(dashboard::<C>))
        .route("/audit-logs", get(audit_logs::<C>))
        .route("/users/bulk", post(bulk_users::<C>))
        .route("/config", get(get_config::<C>).put(update_config::<C>))
}

/// One-shot aggregate view for the admin landing page.
async fn dashboard<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    state.authorize(auth.role, Permission::AdminDashboard)?;

    let one = Pagination { page: 1, limit: 1 };

    let users = state.users().list(UserFilter::default(), one).await?;
    let pending = state
        .users()
        .list(
            UserFilter {
                approval_status: Some(ApprovalStatus::Pending),
                ..UserFilter::default()
            },
            one,
        )
        .await?;
    let inventory = state
        .inventory()
        .list(
            InventoryFilter {
                active_only: true,
                ..InventoryFilter::default()
            },
            one,
        )
        .await?;
    let low_stock = state.inventory().count_low_stock().await?;
    let orders = state.orders().stats().await?;

    Ok(Json(ApiResponse::ok(json!({
        "users": {
            "total": users.total,
            "pending_approval": pending.total,
        },
        "inventory": {
            "active_items": inventory.total,
            "low_stock": low_stock,
        },
        "orders": {
            "total": orders.total_orders,
            "pending": orders.pending,
            "processing": orders.processing,
            "completed": orders.completed,
            "cancelled": orders.cancelled,
            "revenue": orders.revenue,
        },
    }))))
}

async fn audit_logs<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<PagedResponse<Activity>>> {
    state.authorize(auth.role, Permission::AuditLogsList)?;

    let pagination = Pagination {
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(20).clamp(1, 100),
    };
    let result = state
        .activities()
        .list(
            ActivityFilter {
                actor_id: query.actor_id,
                entity_type: query.entity_type,
                from: query.from,
                to: query.to,
            },
            pagination,
        )
        .await?;

    Ok(Json(PagedResponse::from_result(result)))
}

/// Provision many accounts in one call. Each row succeeds or fails on
/// its own; the response reports both and the batch never aborts early.
async fn bulk_users<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Json(body): Json<BulkUsersRequest>,
) -> ApiResult<Json<ApiResponse<Vec<BulkUserResult>>>> {
    state.authorize(auth.role, Permission::UsersBulkCreate)?;

    let mut results = Vec::with_capacity(body.users.len());
    for row in body.users {
        let username = row.username.clone();
        let outcome = state
            .auth()
            .register(RegisterInput {
                username: row.username,
                email: row.email,
                password: row.password,
                full_name: row.full_name,
                phone: row.phone,
                role: Some(row.role),
                self_service: false,
                ip_address: None,
            })
            .await;

        results.push(match outcome {
            Ok(user) => BulkUserResult {
                username,
                success: true,
                id: Some(user.id),
                error: None,
            },
            Err(e) => BulkUserResult {
                username,
                success: false,
                id: None,
                error: Some(e.to_string()),
            },
        });
    }

    let succeeded = results.iter().filter(|r| r.success).count();
    let outcome = if succeeded == results.len() {
        ActivityOutcome::Success
    } else if succeeded == 0 {
        ActivityOutcome::Failure
    } else {
        ActivityOutcome::Partial
    };

    state
        .record(CreateActivity {
            actor_id: Some(auth.user_id),
            action: ActivityAction::UsersBulkCreated,
            entity_type: "user".into(),
            entity_id: None,
            before: None,
            after: Some(json!({
                "requested": results.len(),
                "succeeded": succeeded,
            })),
            ip_address: None,
            outcome,
        })
        .await;

    Ok(Json(ApiResponse::ok(results)))
}

async fn get_config<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<Settings>>> {
    state.authorize(auth.role, Permission::ConfigUpdate)?;
    let settings = state.settings().get().await?;
    Ok(Json(ApiResponse::ok(settings)))
}

async fn update_config<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Json(body): Json<UpdateSettings>,
) -> ApiResult<Json<ApiResponse<Settings>>> {
    state.authorize(auth.role, Permission::ConfigUpdate)?;

    let before = state.settings().get().await?;
    let settings = state.settings().update(body).await?;

    state
        .record(CreateActivity {
            actor_id: Some(auth.user_id),
            action: ActivityAction::ConfigUpdated,
            entity_type: "settings".into(),
            entity_id: None,
            before: serde_json::to_value(&before).ok(),
            after: serde_json::to_value(&settings).ok(),
            ip_address: None,
            outcome: ActivityOutcome::Success,
        })
        .await;

    Ok(Json(ApiResponse::ok(settings)))
}
