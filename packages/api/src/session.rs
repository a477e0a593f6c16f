//! Session tokens
//!
//! Customers and staff authenticate with an HS256 JWT signed with the shared
//! `SESSION_SECRET`. The identity provider and this API use the same secret,
//! so the API can both verify tokens and reissue them to extend a session.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

const ISSUER: &str = "stringline";
const AUDIENCE: &str = "stringline-session";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_seconds: ttl_hours * 60 * 60,
        }
    }

    pub fn issue(
        &self,
        sub: &str,
        email: Option<String>,
        name: Option<String>,
    ) -> Result<String, ApiError> {
        let iat = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: sub.to_string(),
            email,
            name,
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            iat,
            nbf: iat - 30, // 30 second clock skew allowance
            exp: iat + self.ttl_seconds,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, ApiError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn session_roundtrip() {
        let keys = SessionKeys::new(b"test-secret-with-enough-bytes", 1);
        let token = keys
            .issue("user_1", Some("a@example.com".into()), None)
            .unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "user_1");
        assert_eq!(claims.email.as_deref(), Some("a@example.com"));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn rejects_foreign_signatures() {
        let ours = SessionKeys::new(b"test-secret-with-enough-bytes", 1);
        let theirs = SessionKeys::new(b"another-secret-entirely-000000", 1);
        let token = theirs.issue("user_1", None, None).unwrap();
        let err = ours.verify(&token).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn rejects_expired_tokens() {
        let keys = SessionKeys::new(b"test-secret-with-enough-bytes", -2);
        let token = keys.issue("user_1", None, None).unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
