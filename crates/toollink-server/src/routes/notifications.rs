//! Notification endpoints.
//!
//! Everyone can list and manage their own notifications; creating one
//! for another user and browsing the full feed are staff concerns.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use surrealdb::Connection;
use toollink_core::models::activity::{ActivityAction, CreateActivity};
use toollink_core::models::notification::{CreateNotification, Notification};
use toollink_core::rbac::{Permission, Role};
use toollink_core::repository::{NotificationRepository, Pagination};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::AuthUser;
use crate::models::{ApiResponse, CreateNotificationRequest, NotificationQuery, PagedResponse};
use crate::state::AppState;

pub fn routes<C: Connection>() -> Router<AppState<C>> {
    Router::new()
        .route("/", get(list::<C>).post(create::<C>))
        .route("/{id}", axum::routing::put(mark_read::<C>).delete(delete::<C>))
}

async fn list<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<PagedResponse<Notification>>> {
    state.authorize(auth.role, Permission::NotificationsList)?;

    // Non-staff callers are pinned to their own feed regardless of the
    // query string.
    let user_id = if auth.role.is_staff() {
        query.user_id.or(Some(auth.user_id))
    } else {
        Some(auth.user_id)
    };

    let pagination = Pagination {
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(20).clamp(1, 100),
    };
    let result = state.notifications().list(user_id, pagination).await?;

    Ok(Json(PagedResponse::from_result(result)))
}

async fn create<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Json(body): Json<CreateNotificationRequest>,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    state.authorize(auth.role, Permission::NotificationsCreate)?;

    let notification = state
        .notifications()
        .create(CreateNotification {
            user_id: body.user_id,
            title: body.title,
            message: body.message,
        })
        .await?;

    state
        .record(CreateActivity::success(
            Some(auth.user_id),
            ActivityAction::NotificationCreated,
            "notification",
            notification.id,
        ))
        .await;

    Ok(Json(ApiResponse::ok(notification)))
}

/// Marks the notification read. Reads are idempotent and keep the
/// original `read_at` stamp.
async fn mark_read<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    state.authorize(auth.role, Permission::NotificationsUpdate)?;

    let notification = state.notifications().get_by_id(id).await?;
    if notification.user_id != auth.user_id {
        return Err(ApiError::forbidden());
    }

    let notification = state.notifications().mark_read(id).await?;
    Ok(Json(ApiResponse::ok(notification)))
}

async fn delete<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    state.authorize(auth.role, Permission::NotificationsDelete)?;

    let notification = state.notifications().get_by_id(id).await?;
    if notification.user_id != auth.user_id && auth.role != Role::Admin {
        return Err(ApiError::forbidden());
    }

    state.notifications().delete(id).await?;
    Ok(Json(json!({ "success": true })))
}
