//! HTTP route tree.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use surrealdb::Connection;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod feedback;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod predictions;
pub mod reports;
pub mod users;

/// Build the full application router.
pub fn router<C: Connection>(state: AppState<C>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth::routes())
        .nest("/api/users", users::routes())
        .nest("/api/orders", orders::routes())
        .nest("/api/inventory", inventory::routes())
        .nest("/api/notifications", notifications::routes())
        .nest("/api/feedback", feedback::routes())
        .nest("/api/reports", reports::routes())
        .nest("/api/predictions", predictions::routes())
        .nest("/api/admin", admin::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Unauthenticated liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
