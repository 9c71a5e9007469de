//! User management endpoints.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use surrealdb::Connection;
use toollink_auth::service::RegisterInput;
use toollink_core::models::activity::{ActivityAction, CreateActivity};
use toollink_core::models::user::{UpdateUser, UserProfile};
use toollink_core::rbac::Permission;
use toollink_core::repository::{Pagination, UserFilter, UserRepository};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::models::{
    ApiResponse, CreateUserRequest, DeleteQuery, PagedResponse, RejectRequest, UpdateUserRequest,
    UserQuery,
};
use crate::state::AppState;

pub fn routes<C: Connection>() -> Router<AppState<C>> {
    Router::new()
        .route("/", get(list::<C>).post(create::<C>))
        .route(
            "/{id}",
            get(get_one::<C>).put(update::<C>).delete(delete::<C>),
        )
        .route("/{id}/approve", post(approve::<C>))
        .route("/{id}/reject", post(reject::<C>))
}

async fn list<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<PagedResponse<UserProfile>>> {
    state.authorize(auth.role, Permission::UsersList)?;

    let pagination = Pagination {
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(20).clamp(1, 100),
    };
    let result = state
        .users()
        .list(
            UserFilter {
                role: query.role,
                approval_status: query.approval_status,
                active_only: query.active_only,
            },
            pagination,
        )
        .await?;

    Ok(Json(PagedResponse::map_items(result, UserProfile::from)))
}

/// Administrative provisioning: the account is active immediately, no
/// approval step.
async fn create<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    state.authorize(auth.role, Permission::UsersCreate)?;

    let user = state
        .auth()
        .register(RegisterInput {
            username: body.username,
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            phone: body.phone,
            role: Some(body.role),
            self_service: false,
            ip_address: None,
        })
        .await?;

    Ok(Json(ApiResponse::ok(user.into())))
}

/// Callers may always fetch their own profile; anything else requires
/// the user-read permission.
async fn get_one<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    if id != auth.user_id {
        state.authorize(auth.role, Permission::UsersGet)?;
    }
    let user = state.users().get_by_id(id).await?;
    Ok(Json(ApiResponse::ok(user.into())))
}

async fn update<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    state.authorize(auth.role, Permission::UsersUpdate)?;

    let user = state
        .users()
        .update(
            id,
            UpdateUser {
                email: body.email,
                full_name: body.full_name,
                phone: body.phone.map(Some),
                role: body.role,
                is_active: body.is_active,
                ..UpdateUser::default()
            },
        )
        .await?;

    state
        .record(CreateActivity::success(
            Some(auth.user_id),
            ActivityAction::UserUpdated,
            "user",
            id,
        ))
        .await;

    Ok(Json(ApiResponse::ok(user.into())))
}

/// Soft delete by default; `?hard=true` permanently removes a record
/// that was already soft-deleted.
async fn delete<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    if query.hard {
        state.authorize(auth.role, Permission::UsersHardDelete)?;
        state.users().hard_delete(id).await?;
    } else {
        state.authorize(auth.role, Permission::UsersDelete)?;
        state.users().soft_delete(id).await?;
        state.auth().revoke_all_sessions(id).await?;
    }

    state
        .record(CreateActivity::success(
            Some(auth.user_id),
            ActivityAction::UserDeleted,
            "user",
            id,
        ))
        .await;

    Ok(Json(json!({ "success": true })))
}

async fn approve<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    state.authorize(auth.role, Permission::UsersApprove)?;
    let user = state.auth().approve(id, auth.user_id).await?;
    Ok(Json(ApiResponse::ok(user.into())))
}

async fn reject<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectRequest>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    state.authorize(auth.role, Permission::UsersApprove)?;
    let user = state.auth().reject(id, auth.user_id, body.reason).await?;
    Ok(Json(ApiResponse::ok(user.into())))
}
