use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use uuid::Uuid;

use super::{Keys, token};
use crate::ApiError;

/// Verified identity behind a `Bearer` credential. Handlers taking this
/// extractor trust it; nothing downstream re-validates the token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    Keys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Keys::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Access token required".to_owned()))?;

        let claims = token::decode_jwt(token, keys.secret())?;
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_owned()))?;

        Ok(AuthUser {
            id,
            email: claims.email,
            username: claims.username,
        })
    }
}
