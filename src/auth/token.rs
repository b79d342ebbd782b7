//! JWT bearer tokens: HS256, seven-day expiry, claims carry the user
//! identity so `/api/auth/me` style lookups need no session state.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{ApiError, ApiResult, db::User};

const TOKEN_TTL: Duration = Duration::days(7);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id (uuid).
    pub sub: String,
    pub email: String,
    pub username: String,
    /// Expiration, unix timestamp.
    pub exp: i64,
    /// Issued at, unix timestamp.
    pub iat: i64,
}

pub fn encode_jwt(user: &User, secret: &str) -> ApiResult<String> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        username: user.username.clone(),
        exp: (now + TOKEN_TTL).unix_timestamp(),
        iat: now.unix_timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to encode JWT: {e}")))
}

pub fn decode_jwt(token: &str, secret: &str) -> ApiResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::now_v7(),
            email: "alice@example.com".to_owned(),
            username: "alice".to_owned(),
            password_hash: String::new(),
        }
    }

    #[test]
    fn round_trips_claims() {
        let secret = "test-secret-key-must-be-at-least-32-chars-long!";
        let user = user();

        let token = encode_jwt(&user, secret).unwrap();
        let claims = decode_jwt(&token, secret).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.username, user.username);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = encode_jwt(&user(), "secret-one-that-is-long-enough!!").unwrap();
        let err = decode_jwt(&token, "secret-two-that-is-long-enough!!").unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn rejects_garbage_token() {
        assert!(matches!(
            decode_jwt("not-a-jwt", "whatever-secret").unwrap_err(),
            ApiError::Unauthorized(_)
        ));
    }
}
