//! Authentication error types.

use thiserror::Error;
use toollink_core::error::{AuthFailureKind, ToolLinkError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is locked")]
    AccountLocked,

    #[error("account is pending approval")]
    AccountPendingApproval,

    #[error("account has been rejected")]
    AccountRejected,

    #[error("account is deactivated")]
    AccountInactive,

    #[error("password does not meet the minimum length of {0}")]
    PasswordPolicy(usize),

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl AuthError {
    /// The structured failure kind, for variants that represent a
    /// refused authentication attempt.
    fn failure_kind(&self) -> AuthFailureKind {
        match self {
            AuthError::AccountLocked => AuthFailureKind::AccountLocked,
            AuthError::AccountPendingApproval => AuthFailureKind::AccountPending,
            AuthError::AccountRejected => AuthFailureKind::AccountRejected,
            AuthError::AccountInactive => AuthFailureKind::AccountDeactivated,
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => AuthFailureKind::Token,
            _ => AuthFailureKind::InvalidCredentials,
        }
    }
}

impl From<AuthError> for ToolLinkError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::PasswordPolicy(_) => ToolLinkError::Validation {
                message: err.to_string(),
            },
            AuthError::Crypto(msg) => ToolLinkError::Crypto(msg),
            other => ToolLinkError::AuthenticationFailed {
                kind: other.failure_kind(),
                reason: other.to_string(),
            },
        }
    }
}
