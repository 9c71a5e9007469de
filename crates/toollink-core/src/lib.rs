//! ToolLink Core — domain models, error taxonomy, repository traits,
//! and the role-based access policy shared across all crates.

pub mod error;
pub mod models;
pub mod rbac;
pub mod repository;

pub use error::{AuthFailureKind, ToolLinkError, ToolLinkResult};
