//! Feedback endpoints.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use surrealdb::Connection;
use toollink_core::models::activity::{ActivityAction, CreateActivity};
use toollink_core::models::feedback::{CreateFeedback, Feedback};
use toollink_core::rbac::Permission;
use toollink_core::repository::{FeedbackFilter, FeedbackRepository, Pagination};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::AuthUser;
use crate::models::{ApiResponse, CreateFeedbackRequest, FeedbackQuery, PagedResponse};
use crate::state::AppState;

pub fn routes<C: Connection>() -> Router<AppState<C>> {
    Router::new()
        .route("/", get(list::<C>).post(create::<C>))
        .route("/{id}/resolve", post(resolve::<C>))
}

async fn list<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Query(query): Query<FeedbackQuery>,
) -> ApiResult<Json<PagedResponse<Feedback>>> {
    state.authorize(auth.role, Permission::FeedbackList)?;

    // Non-staff callers only see their own submissions.
    let user_id = if auth.role.is_staff() {
        None
    } else {
        Some(auth.user_id)
    };

    let pagination = Pagination {
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(20).clamp(1, 100),
    };
    let result = state
        .feedback()
        .list(
            FeedbackFilter {
                status: query.status,
                user_id,
            },
            pagination,
        )
        .await?;

    Ok(Json(PagedResponse::from_result(result)))
}

async fn create<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Json(body): Json<CreateFeedbackRequest>,
) -> ApiResult<Json<ApiResponse<Feedback>>> {
    state.authorize(auth.role, Permission::FeedbackCreate)?;

    if let Some(rating) = body.rating
        && !(1..=5).contains(&rating)
    {
        return Err(ApiError::validation("rating must be between 1 and 5"));
    }

    let feedback = state
        .feedback()
        .create(CreateFeedback {
            user_id: auth.user_id,
            subject: body.subject,
            message: body.message,
            rating: body.rating,
        })
        .await?;

    state
        .record(CreateActivity::success(
            Some(auth.user_id),
            ActivityAction::FeedbackSubmitted,
            "feedback",
            feedback.id,
        ))
        .await;

    Ok(Json(ApiResponse::ok(feedback)))
}

/// Resolution is terminal; resolving twice is a conflict.
async fn resolve<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Feedback>>> {
    state.authorize(auth.role, Permission::FeedbackResolve)?;

    let feedback = state.feedback().resolve(id, auth.user_id).await?;

    state
        .record(CreateActivity::success(
            Some(auth.user_id),
            ActivityAction::FeedbackResolved,
            "feedback",
            id,
        ))
        .await;

    Ok(Json(ApiResponse::ok(feedback)))
}
