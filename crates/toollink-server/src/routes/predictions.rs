//! Demand prediction endpoints.
//!
//! Deliberately simple: the predicted quantity is the total sold over
//! the historical window, and confidence grows with the number of
//! orders that contributed to it. The point is a stable, explainable
//! baseline, not a model.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use surrealdb::Connection;
use toollink_core::models::activity::{ActivityAction, CreateActivity};
use toollink_core::models::prediction::{CreatePrediction, Prediction};
use toollink_core::rbac::Permission;
use toollink_core::repository::{
    InventoryRepository, OrderRepository, Pagination, PredictionRepository,
};

use crate::error::{ApiError, ApiResult};
use crate::extract::AuthUser;
use crate::models::{ApiResponse, CreatePredictionRequest, PagedResponse, PredictionQuery};
use crate::state::AppState;

const DEFAULT_WINDOW_DAYS: u32 = 30;
const MAX_WINDOW_DAYS: u32 = 365;

pub fn routes<C: Connection>() -> Router<AppState<C>> {
    Router::new().route("/", get(list::<C>).post(create::<C>))
}

async fn list<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Query(query): Query<PredictionQuery>,
) -> ApiResult<Json<PagedResponse<Prediction>>> {
    state.authorize(auth.role, Permission::PredictionsList)?;

    let pagination = Pagination {
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(20).clamp(1, 100),
    };
    let result = state.predictions().list(query.item_id, pagination).await?;

    Ok(Json(PagedResponse::from_result(result)))
}

async fn create<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Json(body): Json<CreatePredictionRequest>,
) -> ApiResult<Json<ApiResponse<Prediction>>> {
    state.authorize(auth.role, Permission::PredictionsCreate)?;

    let window_days = body.window_days.unwrap_or(DEFAULT_WINDOW_DAYS);
    if window_days == 0 || window_days > MAX_WINDOW_DAYS {
        return Err(ApiError::validation(format!(
            "window_days must be between 1 and {MAX_WINDOW_DAYS}"
        )));
    }

    // 404 on unknown items rather than predicting for a phantom.
    let item = state.inventory().get_by_id(body.item_id).await?;

    let since = Utc::now() - Duration::days(i64::from(window_days));
    let orders = state.orders().list_since(since).await?;

    let mut sold: u64 = 0;
    let mut contributing = 0u32;
    for order in &orders {
        let line_total: u64 = order
            .items
            .iter()
            .filter(|line| line.item_id == item.id)
            .map(|line| u64::from(line.quantity))
            .sum();
        if line_total > 0 {
            contributing += 1;
            sold += line_total;
        }
    }

    let predicted_quantity = u32::try_from(sold).unwrap_or(u32::MAX);
    // Asymptotically approaches 1.0 as more orders contribute.
    let confidence = f64::from(contributing) / (f64::from(contributing) + 5.0);

    let prediction = state
        .predictions()
        .create(CreatePrediction {
            item_id: item.id,
            window_days,
            predicted_quantity,
            confidence,
            created_by: auth.user_id,
        })
        .await?;

    state
        .record(CreateActivity::success(
            Some(auth.user_id),
            ActivityAction::PredictionCreated,
            "prediction",
            prediction.id,
        ))
        .await;

    Ok(Json(ApiResponse::ok(prediction)))
}
