//! ToolLink Auth — password authentication, JWT issuance/validation,
//! refresh-token rotation, and the registration/approval flow.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginInput, LoginOutput, RegisterInput};
pub use token::{AccessTokenClaims, ValidatedClaims};
