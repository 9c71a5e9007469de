//! Order endpoints.
//!
//! Pricing is always computed server-side from current inventory
//! prices and the runtime settings; totals supplied by clients are
//! ignored. Creating an order atomically decrements stock per line
//! item through the guarded adjustment, so an order can never
//! oversell.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use surrealdb::Connection;
use toollink_core::models::activity::{ActivityAction, CreateActivity};
use toollink_core::models::order::{
    CreateOrder, Order, OrderItem, OrderPricing, OrderStats, UpdateOrder, round_currency,
};
use toollink_core::rbac::{Permission, Role};
use toollink_core::repository::{
    InventoryRepository, NotificationRepository, OrderFilter, OrderRepository, Pagination,
    SettingsRepository, UserFilter, UserRepository,
};
use toollink_core::{ToolLinkError, ToolLinkResult};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::AuthUser;
use crate::models::{ApiResponse, CreateOrderRequest, OrderQuery, PagedResponse, UpdateOrderRequest};
use crate::state::AppState;

pub fn routes<C: Connection>() -> Router<AppState<C>> {
    Router::new()
        .route("/", get(list::<C>).post(create::<C>))
        .route("/stats", get(stats::<C>))
        .route(
            "/{id}",
            get(get_one::<C>).put(update::<C>).delete(delete::<C>),
        )
}

async fn list<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Json<PagedResponse<Order>>> {
    state.authorize(auth.role, Permission::OrdersList)?;

    // Non-staff callers only ever see their own orders.
    let customer_id = if auth.role.is_staff() {
        None
    } else {
        Some(auth.user_id)
    };

    let pagination = Pagination {
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(20).clamp(1, 100),
    };
    let result = state
        .orders()
        .list(
            OrderFilter {
                status: query.status,
                customer_id,
            },
            pagination,
        )
        .await?;

    Ok(Json(PagedResponse::from_result(result)))
}

async fn create<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Json(body): Json<CreateOrderRequest>,
) -> ApiResult<Json<ApiResponse<Order>>> {
    state.authorize(auth.role, Permission::OrdersCreate)?;

    if body.items.is_empty() {
        return Err(ApiError::validation("an order needs at least one item"));
    }
    let discount = body.discount.unwrap_or(0.0);
    if discount < 0.0 {
        return Err(ApiError::validation("discount cannot be negative"));
    }

    let settings = state.settings().get().await?;

    // Resolve every line against current inventory before touching
    // stock.
    let mut items = Vec::with_capacity(body.items.len());
    for line in &body.items {
        if line.quantity == 0 {
            return Err(ApiError::validation("line quantity must be at least 1"));
        }
        let stock = state.inventory().get_by_id(line.item_id).await?;
        if !stock.is_active {
            return Err(ApiError::validation(format!(
                "{} is no longer available",
                stock.sku
            )));
        }
        items.push(OrderItem {
            item_id: stock.id,
            name: stock.name,
            quantity: line.quantity,
            unit_price: stock.selling_price,
            subtotal: round_currency(stock.selling_price * line.quantity as f64),
        });
    }

    // Decrement stock line by line; on failure, put back what was
    // already taken.
    let mut decremented: Vec<(Uuid, i64)> = Vec::new();
    for item in &items {
        let delta = -(item.quantity as i64);
        match state.inventory().adjust_quantity(item.item_id, delta).await {
            Ok(adjusted) => {
                decremented.push((item.item_id, delta));
                if adjusted.is_low_stock() && settings.low_stock_alerts {
                    notify_low_stock(&state, &adjusted.name, &adjusted.sku, adjusted.quantity)
                        .await;
                }
            }
            Err(e) => {
                rollback_stock(&state, &decremented).await;
                return Err(e.into());
            }
        }
    }

    let pricing = OrderPricing::compute(
        &items,
        settings.tax_rate,
        settings.delivery_charge,
        discount,
    );

    let order = state
        .orders()
        .create(CreateOrder {
            order_number: generate_order_number(),
            customer_id: auth.user_id,
            items,
            pricing,
            delivery: body.delivery.unwrap_or_default(),
        })
        .await;

    let order = match order {
        Ok(order) => order,
        Err(e) => {
            rollback_stock(&state, &decremented).await;
            return Err(e.into());
        }
    };

    state
        .record(CreateActivity {
            after: Some(json!({
                "order_number": order.order_number,
                "total": order.pricing.total,
            })),
            ..CreateActivity::success(
                Some(auth.user_id),
                ActivityAction::OrderCreated,
                "customer_order",
                order.id,
            )
        })
        .await;

    Ok(Json(ApiResponse::ok(order)))
}

async fn get_one<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Order>>> {
    state.authorize(auth.role, Permission::OrdersGet)?;
    let order = fetch_scoped(&state, &auth, id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

async fn update<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateOrderRequest>,
) -> ApiResult<Json<ApiResponse<Order>>> {
    state.authorize(auth.role, Permission::OrdersUpdate)?;

    if body.order_number.is_some() {
        return Err(ApiError::conflict("order_number is immutable"));
    }

    let current = state.orders().get_by_id(id).await?;
    if let Some(next) = body.status
        && !current.status.can_transition_to(next)
    {
        return Err(ApiError::conflict(format!(
            "cannot move order from {:?} to {next:?}",
            current.status
        )));
    }

    let status_changed = body.status.is_some();
    let order = state
        .orders()
        .update(
            id,
            UpdateOrder {
                status: body.status,
                delivery: body.delivery,
            },
        )
        .await?;

    if status_changed {
        state
            .record(CreateActivity {
                before: Some(json!({ "status": current.status })),
                after: Some(json!({ "status": order.status })),
                ..CreateActivity::success(
                    Some(auth.user_id),
                    ActivityAction::OrderStatusChanged,
                    "customer_order",
                    id,
                )
            })
            .await;
    }

    Ok(Json(ApiResponse::ok(order)))
}

async fn delete<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    state.authorize(auth.role, Permission::OrdersDelete)?;

    // Confirm it exists first so a bogus id reads as 404, not success.
    state.orders().get_by_id(id).await?;
    state.orders().soft_delete(id).await?;

    state
        .record(CreateActivity::success(
            Some(auth.user_id),
            ActivityAction::OrderDeleted,
            "customer_order",
            id,
        ))
        .await;

    Ok(Json(json!({ "success": true })))
}

async fn stats<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<OrderStats>>> {
    state.authorize(auth.role, Permission::OrdersStats)?;
    let stats = state.orders().stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// Fetch an order, hiding other customers' orders from non-staff
/// callers as if they did not exist.
async fn fetch_scoped<C: Connection>(
    state: &AppState<C>,
    auth: &AuthUser,
    id: Uuid,
) -> ToolLinkResult<Order> {
    let order = state.orders().get_by_id(id).await?;
    if !auth.role.is_staff() && order.customer_id != auth.user_id {
        return Err(ToolLinkError::NotFound {
            entity: "customer_order".into(),
            id: id.to_string(),
        });
    }
    Ok(order)
}

/// Human-facing order number, e.g. `ORD-1A2B3C4D`.
fn generate_order_number() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("ORD-{}", id[..8].to_uppercase())
}

async fn rollback_stock<C: Connection>(state: &AppState<C>, decremented: &[(Uuid, i64)]) {
    for (item_id, delta) in decremented {
        if let Err(e) = state.inventory().adjust_quantity(*item_id, -delta).await {
            tracing::error!(error = %e, item_id = %item_id, "failed to roll back stock");
        }
    }
}

/// Notify every administrator that an item crossed its reorder
/// threshold.
async fn notify_low_stock<C: Connection>(state: &AppState<C>, name: &str, sku: &str, left: u32) {
    let admins = state
        .users()
        .list(
            UserFilter {
                role: Some(Role::Admin),
                active_only: true,
                ..UserFilter::default()
            },
            Pagination { page: 1, limit: 50 },
        )
        .await;

    let admins = match admins {
        Ok(result) => result.items,
        Err(e) => {
            tracing::warn!(error = %e, "failed to list admins for low-stock alert");
            return;
        }
    };

    for admin in admins {
        let created = state
            .notifications()
            .create(toollink_core::models::notification::CreateNotification {
                user_id: admin.id,
                title: "Low stock".into(),
                message: format!("{name} ({sku}) is down to {left} units"),
            })
            .await;
        if let Err(e) = created {
            tracing::warn!(error = %e, "failed to create low-stock notification");
        }
    }
}
