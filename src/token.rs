//! Access token issuance and validation.
//!
//! Tokens are HS256-signed JWTs carrying the user id in `sub`. Expiry is
//! enforced by `jsonwebtoken` during validation.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

use crate::constants::MAX_TOKEN_EXPIRY_MINUTES;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
    expiry: Duration,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// `expiry_minutes` is clamped to `1..=MAX_TOKEN_EXPIRY_MINUTES`.
    pub fn new(secret: &str, expiry_minutes: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        TokenService {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                validation,
            }),
            expiry: Duration::minutes(expiry_minutes.clamp(1, MAX_TOKEN_EXPIRY_MINUTES)),
        }
    }

    /// Issue a token for `user_id` valid from now for the configured lifetime.
    pub fn issue(&self, user_id: &str) -> jsonwebtoken::errors::Result<String> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        user_id: &str,
        issued_at: OffsetDateTime,
    ) -> jsonwebtoken::errors::Result<String> {
        let expires_at = issued_at
            .checked_add(self.expiry)
            .ok_or(ErrorKind::InvalidToken)?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
    }

    pub fn validate(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        decode::<Claims>(token, &self.keys.decoding, &self.keys.validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-test-secret-test-secret";

    #[test]
    fn issued_token_validates_to_same_subject() {
        let service = TokenService::new(SECRET, 60);
        let token = service.issue("user-1").unwrap();

        let claims = service.validate(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = TokenService::new(SECRET, 60);
        let two_hours_ago = OffsetDateTime::now_utc() - Duration::hours(2);
        let token = service.issue_at("user-1", two_hours_ago).unwrap();

        assert!(service.validate(&token).is_err());
    }

    #[test]
    fn expiry_past_representable_time_is_an_error() {
        let service = TokenService::new(SECRET, 60);
        let end_of_time = time::PrimitiveDateTime::MAX.assume_utc();

        assert!(service.issue_at("user-1", end_of_time).is_err());
    }

    #[test]
    fn oversized_lifetime_is_clamped() {
        let service = TokenService::new(SECRET, i64::MAX);
        let token = service.issue("user-1").unwrap();

        let claims = service.validate(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_TOKEN_EXPIRY_MINUTES * 60);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = TokenService::new("another-secret-another-secret-0000", 60);
        let verifier = TokenService::new(SECRET, 60);
        let token = issuer.issue("user-1").unwrap();

        assert!(verifier.validate(&token).is_err());
        assert!(verifier.validate("not.a.token").is_err());
    }
}
