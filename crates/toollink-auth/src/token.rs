//! JWT access token issuance/verification and opaque refresh token
//! generation.
//!
//! Access tokens are signed with HS256 using a shared secret from the
//! environment. Validation is stateless — no database lookup — so a
//! user whose role changed after issuance keeps the old role until
//! the token expires (accepted staleness window).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use toollink_core::rbac::Role;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject — user ID (UUID string).
    pub sub: String,
    /// Role tag at issuance time.
    pub role: Role,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

/// Issue a signed HS256 JWT access token.
pub fn issue_access_token(
    user_id: Uuid,
    role: Role,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = AccessTokenClaims {
        sub: user_id.to_string(),
        role,
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + config.access_token_lifetime_secs as i64,
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    let header = Header::new(Algorithm::HS256);
    jsonwebtoken::encode(&header, &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Decode and verify an HS256 JWT access token.
pub fn decode_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<AccessTokenClaims, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

    jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

/// Validated JWT claims — a newtype proving the token was verified.
#[derive(Debug, Clone)]
pub struct ValidatedClaims(pub AccessTokenClaims);

/// Validate a JWT access token (signature, expiry, issuer) and return
/// the verified claims.
///
/// This is the entry point for request-level authentication middleware.
pub fn validate_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<ValidatedClaims, AuthError> {
    decode_access_token(token, config).map(ValidatedClaims)
}

/// Generate a cryptographically random opaque refresh token
/// (32 bytes → base64url-encoded, no padding).
pub fn generate_refresh_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hash of a raw refresh token, hex-encoded.
///
/// This is the value stored in the database as `session.token_hash`.
pub fn hash_refresh_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-not-for-production".into(),
            jwt_issuer: "toollink-test".into(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn jwt_roundtrip() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token = issue_access_token(user_id, Role::Cashier, &config).unwrap();
        let claims = decode_access_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, Role::Cashier);
        assert_eq!(claims.iss, "toollink-test");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let token = issue_access_token(Uuid::new_v4(), Role::Admin, &config).unwrap();

        let other = AuthConfig {
            jwt_secret: "a-different-secret".into(),
            ..test_config()
        };
        assert!(matches!(
            decode_access_token(&token, &other),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = AuthConfig {
            access_token_lifetime_secs: 0,
            ..test_config()
        };
        let token = issue_access_token(Uuid::new_v4(), Role::Customer, &config).unwrap();

        // exp == now in the same second still validates; let the clock
        // tick past the expiry before decoding.
        std::thread::sleep(std::time::Duration::from_secs(1));

        // Default leeway is 60s; disable it to observe the expiry.
        let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.jwt_issuer]);
        validation.leeway = 0;
        let result = jsonwebtoken::decode::<AccessTokenClaims>(&token, &key, &validation);
        assert!(matches!(
            result.unwrap_err().kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }

    #[test]
    fn jti_is_unique() {
        let config = test_config();
        let uid = Uuid::new_v4();

        let t1 = issue_access_token(uid, Role::Driver, &config).unwrap();
        let t2 = issue_access_token(uid, Role::Driver, &config).unwrap();

        let c1 = decode_access_token(&t1, &config).unwrap();
        let c2 = decode_access_token(&t2, &config).unwrap();
        assert_ne!(c1.jti, c2.jti);
    }

    #[test]
    fn refresh_token_is_url_safe() {
        let token = generate_refresh_token();
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        // 32 bytes → 43 base64url chars.
        assert_eq!(token.len(), 43);
    }

    #[test]
    fn refresh_token_hash_is_deterministic() {
        let raw = "some-refresh-token";
        assert_eq!(hash_refresh_token(raw), hash_refresh_token(raw));
        assert_ne!(hash_refresh_token("token-a"), hash_refresh_token("token-b"));
    }
}
