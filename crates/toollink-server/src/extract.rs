//! Request authentication extractor.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use surrealdb::Connection;
use toollink_auth::token;
use toollink_core::rbac::Role;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller, extracted from a `Bearer` access token.
///
/// Missing, malformed, or expired tokens reject the request with 401
/// before the handler runs.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl<C: Connection> FromRequestParts<AppState<C>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<C>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("expected a Bearer token"))?;

        let claims = token::validate_access_token(token, state.auth().config())
            .map_err(|e| ApiError::unauthorized(format!("invalid or expired token: {e}")))?;

        let user_id = Uuid::parse_str(&claims.0.sub)
            .map_err(|_| ApiError::unauthorized("malformed token subject"))?;

        Ok(AuthUser {
            user_id,
            role: claims.0.role,
        })
    }
}

/// Best-effort client identity for rate-limit keying — the first
/// `x-forwarded-for` hop when present.
pub fn client_key(parts: &axum::http::HeaderMap) -> String {
    parts
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
