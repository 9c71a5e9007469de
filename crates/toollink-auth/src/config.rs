//! Authentication configuration.

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for HS256 JWT signing and verification.
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default: 900 = 15 minutes).
    pub access_token_lifetime_secs: u64,
    /// Refresh token lifetime in seconds (default: 2_592_000 = 30 days).
    pub refresh_token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
    /// Max consecutive failed login attempts before lockout (default: 5).
    pub max_failed_login_attempts: u32,
    /// Lockout duration in seconds (default: 900 = 15 min).
    pub lockout_duration_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_lifetime_secs: 900,
            refresh_token_lifetime_secs: 2_592_000,
            jwt_issuer: "toollink".into(),
            pepper: None,
            min_password_length: 8,
            max_failed_login_attempts: 5,
            lockout_duration_secs: 900,
        }
    }
}
