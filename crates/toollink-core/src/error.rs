//! Error types for the ToolLink system.

use thiserror::Error;

/// Why an authentication attempt was refused. Carried alongside the
/// human-readable reason so API layers can map failures to stable
/// error codes without inspecting message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureKind {
    InvalidCredentials,
    AccountLocked,
    AccountPending,
    AccountRejected,
    AccountDeactivated,
    /// Missing, malformed, or expired token.
    Token,
}

#[derive(Debug, Error)]
pub enum ToolLinkError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Identity already taken: {field}")]
    DuplicateIdentity { field: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed {
        kind: AuthFailureKind,
        reason: String,
    },

    #[error("Access denied: {reason}")]
    Forbidden { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ToolLinkResult<T> = Result<T, ToolLinkError>;
