//! Report endpoints.
//!
//! Generation runs synchronously inside the creating request. The
//! record is written in `Generating` state first so a crash mid-way
//! leaves an honest trail, then moved to `Completed` or `Failed`.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use surrealdb::Connection;
use toollink_core::models::activity::{ActivityAction, CreateActivity};
use toollink_core::models::report::{CreateReport, Report, ReportType};
use toollink_core::rbac::Permission;
use toollink_core::repository::{
    ActivityFilter, ActivityLogRepository, InventoryFilter, InventoryRepository, OrderRepository,
    Pagination, ReportRepository,
};
use toollink_core::ToolLinkResult;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::models::{ApiResponse, CreateReportRequest, PageQuery, PagedResponse};
use crate::state::AppState;

pub fn routes<C: Connection>() -> Router<AppState<C>> {
    Router::new()
        .route("/", get(list::<C>).post(create::<C>))
        .route("/{id}", get(get_one::<C>))
}

async fn list<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PagedResponse<Report>>> {
    state.authorize(auth.role, Permission::ReportsList)?;
    let result = state.reports().list(query.pagination()).await?;
    Ok(Json(PagedResponse::from_result(result)))
}

async fn create<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Json(body): Json<CreateReportRequest>,
) -> ApiResult<Json<ApiResponse<Report>>> {
    state.authorize(auth.role, Permission::ReportsCreate)?;

    let report = state
        .reports()
        .create(CreateReport {
            requested_by: auth.user_id,
            report_type: body.report_type,
            parameters: body.parameters.unwrap_or_else(|| json!({})),
        })
        .await?;

    let report = match generate(&state, body.report_type).await {
        Ok(result) => state.reports().complete(report.id, result).await?,
        Err(e) => state.reports().fail(report.id, e.to_string()).await?,
    };

    state
        .record(CreateActivity::success(
            Some(auth.user_id),
            ActivityAction::ReportGenerated,
            "report",
            report.id,
        ))
        .await;

    Ok(Json(ApiResponse::ok(report)))
}

async fn get_one<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Report>>> {
    state.authorize(auth.role, Permission::ReportsGet)?;
    let report = state.reports().get_by_id(id).await?;
    Ok(Json(ApiResponse::ok(report)))
}

async fn generate<C: Connection>(
    state: &AppState<C>,
    report_type: ReportType,
) -> ToolLinkResult<serde_json::Value> {
    match report_type {
        ReportType::Sales => {
            let stats = state.orders().stats().await?;
            Ok(json!({
                "total_orders": stats.total_orders,
                "pending": stats.pending,
                "processing": stats.processing,
                "completed": stats.completed,
                "cancelled": stats.cancelled,
                "revenue": stats.revenue,
            }))
        }
        ReportType::Inventory => {
            let all = state
                .inventory()
                .list(
                    InventoryFilter {
                        active_only: true,
                        ..InventoryFilter::default()
                    },
                    Pagination { page: 1, limit: 1 },
                )
                .await?;
            let low = state
                .inventory()
                .list(
                    InventoryFilter {
                        active_only: true,
                        low_stock_only: true,
                        ..InventoryFilter::default()
                    },
                    Pagination {
                        page: 1,
                        limit: 100,
                    },
                )
                .await?;
            Ok(json!({
                "active_items": all.total,
                "low_stock_count": low.total,
                "low_stock": low
                    .items
                    .iter()
                    .map(|i| json!({
                        "sku": i.sku,
                        "name": i.name,
                        "quantity": i.quantity,
                        "reorder_threshold": i.reorder_threshold,
                    }))
                    .collect::<Vec<_>>(),
            }))
        }
        ReportType::Activity => {
            let recent = state
                .activities()
                .list(
                    ActivityFilter::default(),
                    Pagination {
                        page: 1,
                        limit: 100,
                    },
                )
                .await?;
            let failures = recent
                .items
                .iter()
                .filter(|a| a.outcome == toollink_core::models::activity::ActivityOutcome::Failure)
                .count();
            Ok(json!({
                "total_entries": recent.total,
                "sampled": recent.items.len(),
                "failures_in_sample": failures,
            }))
        }
    }
}
