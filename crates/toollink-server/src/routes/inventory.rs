//! Inventory endpoints.
//!
//! The SKU is immutable and quantity changes only go through the
//! adjust endpoint, so plain updates that carry either field are
//! rejected outright.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use surrealdb::Connection;
use toollink_core::models::activity::{ActivityAction, CreateActivity};
use toollink_core::models::inventory::{CreateInventoryItem, InventoryItem, UpdateInventoryItem};
use toollink_core::rbac::Permission;
use toollink_core::repository::{InventoryFilter, InventoryRepository};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::AuthUser;
use crate::models::{
    AdjustStockRequest, ApiResponse, CreateInventoryRequest, InventoryQuery, PagedResponse,
    UpdateInventoryRequest,
};
use crate::state::AppState;

pub fn routes<C: Connection>() -> Router<AppState<C>> {
    Router::new()
        .route("/", get(list::<C>).post(create::<C>))
        .route(
            "/{id}",
            get(get_one::<C>).put(update::<C>).delete(delete::<C>),
        )
        .route("/{id}/adjust", post(adjust::<C>))
}

async fn list<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Query(query): Query<InventoryQuery>,
) -> ApiResult<Json<PagedResponse<InventoryItem>>> {
    state.authorize(auth.role, Permission::InventoryList)?;

    let pagination = toollink_core::repository::Pagination {
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(20).clamp(1, 100),
    };
    let result = state
        .inventory()
        .list(
            InventoryFilter {
                category: query.category,
                active_only: query.active_only,
                low_stock_only: query.low_stock_only,
            },
            pagination,
        )
        .await?;

    Ok(Json(PagedResponse::from_result(result)))
}

async fn create<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Json(body): Json<CreateInventoryRequest>,
) -> ApiResult<Json<ApiResponse<InventoryItem>>> {
    state.authorize(auth.role, Permission::InventoryCreate)?;

    if body.selling_price < 0.0 || body.cost_price < 0.0 {
        return Err(ApiError::validation("prices cannot be negative"));
    }
    if body.sku.trim().is_empty() {
        return Err(ApiError::validation("sku cannot be empty"));
    }

    let item = state
        .inventory()
        .create(CreateInventoryItem {
            name: body.name,
            category: body.category,
            sku: body.sku,
            description: body.description,
            quantity: body.quantity,
            unit: body.unit,
            reorder_threshold: body.reorder_threshold,
            cost_price: body.cost_price,
            selling_price: body.selling_price,
            currency: body.currency.unwrap_or_else(|| "USD".into()),
            location: body.location,
            supplier: body.supplier,
        })
        .await?;

    state
        .record(CreateActivity {
            after: Some(json!({ "sku": item.sku, "quantity": item.quantity })),
            ..CreateActivity::success(
                Some(auth.user_id),
                ActivityAction::InventoryCreated,
                "inventory_item",
                item.id,
            )
        })
        .await;

    Ok(Json(ApiResponse::ok(item)))
}

async fn get_one<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<InventoryItem>>> {
    state.authorize(auth.role, Permission::InventoryGet)?;
    let item = state.inventory().get_by_id(id).await?;
    Ok(Json(ApiResponse::ok(item)))
}

async fn update<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateInventoryRequest>,
) -> ApiResult<Json<ApiResponse<InventoryItem>>> {
    state.authorize(auth.role, Permission::InventoryUpdate)?;

    if body.sku.is_some() {
        return Err(ApiError::conflict("sku is immutable"));
    }
    if body.quantity.is_some() {
        return Err(ApiError::conflict(
            "quantity changes must go through the adjust endpoint",
        ));
    }

    let item = state
        .inventory()
        .update(
            id,
            UpdateInventoryItem {
                name: body.name,
                category: body.category,
                description: body.description.map(Some),
                unit: body.unit,
                reorder_threshold: body.reorder_threshold,
                cost_price: body.cost_price,
                selling_price: body.selling_price,
                currency: body.currency,
                location: body.location,
                supplier: body.supplier,
                is_active: body.is_active,
            },
        )
        .await?;

    state
        .record(CreateActivity::success(
            Some(auth.user_id),
            ActivityAction::InventoryUpdated,
            "inventory_item",
            id,
        ))
        .await;

    Ok(Json(ApiResponse::ok(item)))
}

/// Deactivates the item so existing orders keep a valid reference.
async fn delete<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    state.authorize(auth.role, Permission::InventoryDelete)?;

    state.inventory().get_by_id(id).await?;
    state.inventory().soft_delete(id).await?;

    state
        .record(CreateActivity::success(
            Some(auth.user_id),
            ActivityAction::InventoryDeleted,
            "inventory_item",
            id,
        ))
        .await;

    Ok(Json(json!({ "success": true })))
}

/// Signed stock delta. The repository refuses any adjustment that would
/// take the quantity below zero.
async fn adjust<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<AdjustStockRequest>,
) -> ApiResult<Json<ApiResponse<InventoryItem>>> {
    state.authorize(auth.role, Permission::InventoryAdjust)?;

    if body.delta == 0 {
        return Err(ApiError::validation("delta cannot be zero"));
    }

    let before = state.inventory().get_by_id(id).await?;
    let item = state.inventory().adjust_quantity(id, body.delta).await?;

    state
        .record(CreateActivity {
            before: Some(json!({ "quantity": before.quantity })),
            after: Some(json!({
                "quantity": item.quantity,
                "reason": body.reason,
            })),
            ..CreateActivity::success(
                Some(auth.user_id),
                ActivityAction::InventoryAdjusted,
                "inventory_item",
                id,
            )
        })
        .await;

    Ok(Json(ApiResponse::ok(item)))
}
