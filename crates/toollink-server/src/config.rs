//! Server configuration assembled from the process environment.

use toollink_auth::AuthConfig;
use toollink_core::{ToolLinkError, ToolLinkResult};
use toollink_db::DbConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,
    pub db: DbConfig,
    pub auth: AuthConfig,
    /// Requests per window allowed on login/refresh, per client.
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
}

impl ServerConfig {
    /// Build the configuration from `TOOLLINK_*` environment variables.
    /// The JWT signing secret has no default and must be provided.
    pub fn from_env() -> ToolLinkResult<Self> {
        let jwt_secret = std::env::var("TOOLLINK_JWT_SECRET").map_err(|_| {
            ToolLinkError::Validation {
                message: "TOOLLINK_JWT_SECRET is not set".into(),
            }
        })?;

        let auth = AuthConfig {
            jwt_secret,
            pepper: std::env::var("TOOLLINK_PASSWORD_PEPPER").ok(),
            ..AuthConfig::default()
        };

        Ok(Self {
            bind_addr: std::env::var("TOOLLINK_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            db: DbConfig::from_env(),
            auth,
            rate_limit_max: std::env::var("TOOLLINK_RATE_LIMIT_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            rate_limit_window_secs: std::env::var("TOOLLINK_RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        })
    }
}
