mod extract;
mod pwd;
mod token;

pub use extract::AuthUser;
pub use pwd::{hash_password, verify_password};
pub use token::{Claims, decode_jwt, encode_jwt};

use axum::{
    Json, Router, debug_handler,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::{ApiError, ApiResult, AppState, db};

#[derive(Clone)]
pub struct Keys {
    secret: String,
}

impl Keys {
    pub fn new(secret: impl Into<String>) -> Keys {
        Keys { secret: secret.into() }
    }

    pub fn from_env() -> Keys {
        let secret = dotenv::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using an insecure development secret");
            "keepintouch-dev-secret".to_owned()
        });
        Keys { secret }
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
}

#[derive(Deserialize)]
struct RegisterRequest {
    email: String,
    username: String,
    password: String,
}

#[debug_handler(state = AppState)]
async fn register(
    State(db_pool): State<SqlitePool>,
    State(keys): State<Keys>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let email = req.email.trim();
    let username = req.username.trim();

    if email.is_empty() || username.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Email, username, and password are required".to_owned(),
        ));
    }

    let password_hash = pwd::hash_password(&req.password)?;
    // the unique index on email turns a racing duplicate into a Conflict
    let user = db::create_user(&db_pool, email, username, &password_hash).await?;
    let token = token::encode_jwt(&user, keys.secret())?;

    tracing::info!(user_id = %user.id, username, "registered new user");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "token": token,
            "user": { "id": user.id, "email": user.email, "username": user.username },
        })),
    ))
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[debug_handler(state = AppState)]
async fn login(
    State(db_pool): State<SqlitePool>,
    State(keys): State<Keys>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_owned());

    let user = db::user_by_email(&db_pool, req.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !pwd::verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    let token = token::encode_jwt(&user, keys.secret())?;

    tracing::info!(user_id = %user.id, username = %user.username, "user logged in");

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "user": { "id": user.id, "email": user.email, "username": user.username },
    })))
}

#[debug_handler(state = AppState)]
async fn me(
    State(db_pool): State<SqlitePool>,
    auth_user: AuthUser,
) -> ApiResult<Json<Value>> {
    let user = db::user_by_id(&db_pool, auth_user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?;

    Ok(Json(json!({
        "user": { "id": user.id, "email": user.email, "username": user.username },
    })))
}
