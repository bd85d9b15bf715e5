//! Session token creation and verification (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;
use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized};

/// Session claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Sign a session token for `subject` acting as `role`.
pub fn issue_token(config: &AppConfig, subject: Uuid, role: Role) -> Result<IssuedToken, ApiError> {
    let now = Utc::now();
    let ttl = i64::try_from(config.session_ttl_seconds).unwrap_or(i64::MAX);
    let expires_at = now + Duration::seconds(ttl);

    let claims = SessionClaims {
        sub: subject,
        role,
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("failed to sign session token: {e}"))?;

    Ok(IssuedToken { token, expires_at })
}

/// Verify a session token, returning its claims.
///
/// Malformed, tampered and expired tokens are all 401; key problems are 500.
pub fn verify_token(config: &AppConfig, token: &str) -> Result<SessionClaims, ApiError> {
    let key = DecodingKey::from_secret(config.jwt_secret_bytes());

    decode::<SessionClaims>(token, &key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => unauthorized(Some("Session expired")),
            ErrorKind::InvalidKeyFormat | ErrorKind::Crypto(_) => {
                anyhow::anyhow!("session token verification failed: {e}").into()
            }
            _ => unauthorized(Some("Invalid session token")),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn config() -> AppConfig {
        AppConfig {
            jwt_secret: Some("test-secret-key-that-is-long-enough!!".to_string()),
            session_ttl_seconds: 3600,
            ..Default::default()
        }
    }

    #[test]
    fn issued_token_verifies() {
        let config = config();
        let subject = Uuid::new_v4();
        let issued = issue_token(&config, subject, Role::OrganicFarmer).unwrap();

        let claims = verify_token(&config, &issued.token).unwrap();
        assert_eq!(claims.sub, subject);
        assert_eq!(claims.role, Role::OrganicFarmer);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issued = issue_token(&config(), Uuid::new_v4(), Role::Admin).unwrap();
        let other = AppConfig {
            jwt_secret: Some("a-completely-different-secret-value!!".to_string()),
            ..config()
        };

        let err = verify_token(&other, &issued.token).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = config();
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            role: Role::Farmer,
            iat: Utc::now().timestamp() - 7200,
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret_bytes()),
        )
        .unwrap();

        let err = verify_token(&config, &token).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, Box::from("Session expired"));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = verify_token(&config(), "not.a.jwt").unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
