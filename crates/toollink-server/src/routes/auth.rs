//! Authentication endpoints.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use surrealdb::Connection;
use toollink_auth::service::{LoginInput, RefreshInput, RegisterInput};
use toollink_core::models::user::UserProfile;

use crate::error::{ApiError, ApiResult};
use crate::extract::{AuthUser, client_key};
use crate::models::{
    ApiResponse, ChangePasswordRequest, LoginRequest, LogoutRequest, RefreshRequest,
    RegisterRequest, TokenResponse,
};
use crate::state::AppState;

pub fn routes<C: Connection>() -> Router<AppState<C>> {
    Router::new()
        .route("/register", post(register::<C>))
        .route("/login", post(login::<C>))
        .route("/refresh-token", post(refresh::<C>))
        .route("/logout", post(logout::<C>))
        .route("/change-password", post(change_password::<C>))
}

/// Self-service registration. New accounts are pending customers until
/// an administrator approves them.
async fn register<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let user = state
        .auth()
        .register(RegisterInput {
            username: body.username,
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            phone: body.phone,
            role: None,
            self_service: true,
            ip_address: Some(client_key(&headers)),
        })
        .await?;

    Ok(Json(ApiResponse::ok(user.into())))
}

async fn login<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<TokenResponse>>> {
    let key = client_key(&headers);
    if !state.login_limiter().allow(&key) {
        return Err(ApiError::rate_limited());
    }

    let output = state
        .auth()
        .login(LoginInput {
            identifier: body.identifier,
            password: body.password,
            ip_address: Some(key),
            user_agent: user_agent(&headers),
        })
        .await?;

    Ok(Json(ApiResponse::ok(TokenResponse {
        access_token: output.access_token,
        refresh_token: output.refresh_token,
        expires_in: output.expires_in,
        user: Some(output.user),
    })))
}

async fn refresh<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<TokenResponse>>> {
    let key = client_key(&headers);
    if !state.login_limiter().allow(&key) {
        return Err(ApiError::rate_limited());
    }

    let output = state
        .auth()
        .refresh(RefreshInput {
            raw_refresh_token: body.refresh_token,
            ip_address: Some(key),
            user_agent: user_agent(&headers),
        })
        .await?;

    Ok(Json(ApiResponse::ok(TokenResponse {
        access_token: output.access_token,
        refresh_token: output.refresh_token,
        expires_in: output.expires_in,
        user: None,
    })))
}

/// Idempotent: logging out a token that is already gone succeeds.
async fn logout<C: Connection>(
    State(state): State<AppState<C>>,
    Json(body): Json<LogoutRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state.auth().logout(&body.refresh_token).await?;
    Ok(Json(json!({ "success": true })))
}

async fn change_password<C: Connection>(
    State(state): State<AppState<C>>,
    auth: AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state
        .auth()
        .change_password(auth.user_id, &body.current_password, &body.new_password)
        .await?;
    Ok(Json(json!({ "success": true })))
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
