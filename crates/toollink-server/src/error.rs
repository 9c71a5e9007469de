//! API error envelope.
//!
//! Every failure leaves the server as
//! `{ "success": false, "error": <message>, "errorType": <code> }` with
//! an appropriate HTTP status. Database and crypto internals are logged
//! and never shown to clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use toollink_core::{AuthFailureKind, ToolLinkError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error_type: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error_type: "UNAUTHORIZED",
            message: message.into(),
        }
    }

    pub fn forbidden() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            error_type: "FORBIDDEN",
            message: "you do not have permission to perform this action".into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error_type: "VALIDATION_ERROR",
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            error_type: "CONFLICT",
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error_type: "NOT_FOUND",
            message: message.into(),
        }
    }

    pub fn rate_limited() -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            error_type: "RATE_LIMITED",
            message: "too many requests, try again later".into(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error_type: "INTERNAL_ERROR",
            message: "an internal error occurred".into(),
        }
    }
}

impl From<ToolLinkError> for ApiError {
    fn from(err: ToolLinkError) -> Self {
        match err {
            ToolLinkError::NotFound { entity, id } => {
                Self::not_found(format!("{entity} {id} not found"))
            }
            ToolLinkError::DuplicateIdentity { field } => Self {
                status: StatusCode::CONFLICT,
                error_type: "DUPLICATE_IDENTITY",
                message: format!("{field} is already taken"),
            },
            ToolLinkError::AuthenticationFailed { kind, reason } => {
                let error_type = match kind {
                    AuthFailureKind::AccountPending => "ACCOUNT_PENDING_APPROVAL",
                    AuthFailureKind::AccountLocked => "ACCOUNT_LOCKED",
                    AuthFailureKind::AccountRejected => "ACCOUNT_REJECTED",
                    AuthFailureKind::AccountDeactivated => "ACCOUNT_DEACTIVATED",
                    AuthFailureKind::Token => "UNAUTHORIZED",
                    AuthFailureKind::InvalidCredentials => "INVALID_CREDENTIALS",
                };
                Self {
                    status: StatusCode::UNAUTHORIZED,
                    error_type,
                    message: reason,
                }
            }
            ToolLinkError::Forbidden { reason } => Self {
                status: StatusCode::FORBIDDEN,
                error_type: "FORBIDDEN",
                message: reason,
            },
            ToolLinkError::Validation { message } => Self::validation(message),
            ToolLinkError::Conflict { message } => Self::conflict(message),
            ToolLinkError::RateLimited => Self::rate_limited(),
            ToolLinkError::Database(detail) => {
                tracing::error!(detail, "database error");
                Self::internal()
            }
            ToolLinkError::Crypto(detail) => {
                tracing::error!(detail, "crypto error");
                Self::internal()
            }
            ToolLinkError::Internal(detail) => {
                tracing::error!(detail, "internal error");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "error": self.message,
            "errorType": self.error_type,
        }));
        (self.status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
