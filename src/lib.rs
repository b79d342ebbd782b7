pub mod ai;
pub mod auth;
pub mod chat;
pub mod db;
pub mod rooms;

use axum::{
    Json, Router,
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub ai: ai::AiClient,
    pub keys: auth::Keys,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(chat::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> ApiResult<String>;
    fn get_obj_field(&self, field: &str) -> ApiResult<&Value>;
}

impl GetField for serde_json::Value {
    fn get_str_field(&self, field: &str) -> ApiResult<String> {
        Ok(self
            .get(field)
            .ok_or_else(|| anyhow::anyhow!("expected {field} in response"))?
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("expected {field} to be a string"))?
            .to_owned())
    }

    fn get_obj_field(&self, field: &str) -> ApiResult<&Value> {
        Ok(self
            .get(field)
            .ok_or_else(|| anyhow::anyhow!("expected {field} in response"))?)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Only validation errors (4xx) and persistence errors (5xx) cross the
/// handler boundary; AI provider failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("chat room \"{0}\" not found")]
    UnknownRoom(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownRoom(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(err) => {
                tracing::error!("internal error: {err:#}");
                "Internal server error".to_owned()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.into())
    }
}

impl From<time::error::Format> for ApiError {
    fn from(err: time::error::Format) -> Self {
        ApiError::Internal(err.into())
    }
}

impl From<time::error::Parse> for ApiError {
    fn from(err: time::error::Parse) -> Self {
        ApiError::Internal(err.into())
    }
}
