//! Admin authentication
//!
//! One shared admin password. A successful login yields an HS256 JWT that
//! the browser keeps in the `auth-token` cookie; API clients may send the
//! same token as `Authorization: Bearer`.

pub mod cookie;

use beeri_core::config::AuthSecrets;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub use cookie::{clear_session_cookie, session_cookie, SESSION_COOKIE};

const ADMIN_SUBJECT: &str = "admin";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no session token")]
    Missing,

    #[error("session expired")]
    Expired,

    #[error("invalid session token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("failed to sign session token: {0}")]
    Sign(jsonwebtoken::errors::Error),
}

/// JWT payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing keys, password digest and session lifetime
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    password_digest: [u8; 32],
    ttl: Duration,
}

impl std::fmt::Debug for AuthKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthKeys").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl AuthKeys {
    pub fn new(secrets: &AuthSecrets, ttl_hours: i64) -> Self {
        let secret = secrets.jwt_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            password_digest: digest(&secrets.admin_password),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Compare digests so the check takes the same time for any candidate.
    pub fn check_password(&self, candidate: &str) -> bool {
        digest(candidate)
            .as_slice()
            .ct_eq(self.password_digest.as_slice())
            .into()
    }

    pub fn issue(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: ADMIN_SUBJECT.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::Sign)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e),
            }
        })?;

        if data.claims.sub != ADMIN_SUBJECT {
            return Err(AuthError::Invalid(jsonwebtoken::errors::ErrorKind::InvalidSubject.into()));
        }
        Ok(data.claims)
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> AuthKeys {
        AuthKeys::new(
            &AuthSecrets {
                jwt_secret: "0123456789abcdef0123456789abcdef".into(),
                admin_password: "ועד-הורים-2024".into(),
            },
            168,
        )
    }

    #[test]
    fn password_check() {
        let keys = keys();
        assert!(keys.check_password("ועד-הורים-2024"));
        assert!(!keys.check_password("ועד-הורים-2025"));
        assert!(!keys.check_password(""));
        assert!(!keys.check_password("ועד-הורים-202"));
        assert!(!keys.check_password("ועד-הורים-2024 "));
    }

    #[test]
    fn issued_token_verifies() {
        let keys = keys();
        let token = keys.issue(Utc::now()).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.exp - claims.iat, 168 * 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys();
        let token = keys.issue(Utc::now() - Duration::hours(200)).unwrap();
        assert!(matches!(keys.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = AuthKeys::new(
            &AuthSecrets {
                jwt_secret: "another-secret-of-enough-length".into(),
                admin_password: "x".into(),
            },
            1,
        );
        let token = other.issue(Utc::now()).unwrap();
        assert!(matches!(keys().verify(&token), Err(AuthError::Invalid(_))));
        assert!(matches!(keys().verify("not-a-jwt"), Err(AuthError::Invalid(_))));
    }

    #[test]
    fn wrong_subject_is_rejected() {
        let keys = keys();
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Claims {
                sub: "parent".into(),
                iat: now,
                exp: now + 60,
            },
            &keys.encoding,
        )
        .unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
