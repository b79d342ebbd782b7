use axum::{
    Json, debug_handler,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::{
    ApiError, ApiResult, AppState,
    ai::{self, AiClient},
    auth::AuthUser,
    db,
    rooms::Room,
};

/// The original client omits `room` on the default screen; it means Kyle.
const DEFAULT_ROOM: &str = "Kyle";

#[derive(Deserialize)]
pub(crate) struct ListQuery {
    room: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn get_messages(
    State(db_pool): State<SqlitePool>,
    auth_user: AuthUser,
    Query(ListQuery { room }): Query<ListQuery>,
) -> ApiResult<Json<Value>> {
    let room: Room = room.as_deref().unwrap_or(DEFAULT_ROOM).parse()?;
    let messages = db::room_messages(&db_pool, auth_user.id, room).await?;

    Ok(Json(json!({ "messages": messages })))
}

#[derive(Deserialize)]
pub(crate) struct SendMessageRequest {
    text: String,
    room: Option<String>,
}

/// Send a message and get the persona's reply.
///
/// Validate, persist the user's message, gather a bounded history window,
/// ask the AI service for a reply (total, degrades to fallback), persist the
/// reply, return both records. The two inserts commit separately: a crash in
/// between leaves the user's message saved without a reply, which is a
/// recoverable state, not a lost message.
#[debug_handler(state = AppState)]
pub(crate) async fn send_message(
    State(db_pool): State<SqlitePool>,
    State(ai): State<AiClient>,
    auth_user: AuthUser,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Json<Value>> {
    let room: Room = req.room.as_deref().unwrap_or(DEFAULT_ROOM).parse()?;
    let text = req.text.trim();
    if text.is_empty() {
        return Err(ApiError::Validation("Message text cannot be empty".to_owned()));
    }

    let user_message = db::append_message(
        &db_pool,
        auth_user.id,
        room,
        text,
        false,
        Some(&auth_user.username),
    )
    .await?;

    let mut history =
        db::recent_messages(&db_pool, auth_user.id, room, ai::HISTORY_WINDOW).await?;
    // the new message goes to the provider as the prompt, not as history
    if history.last().is_some_and(|m| m.id == user_message.id) {
        history.pop();
    }

    let reply = ai.generate_reply(room, &history, text).await;
    tracing::debug!(
        room = %room,
        user_id = %auth_user.id,
        source = ?reply.source,
        "reply generated"
    );

    let ai_message = db::append_message(
        &db_pool,
        auth_user.id,
        room,
        &reply.text,
        true,
        Some(room.persona_name()),
    )
    .await?;

    Ok(Json(json!({
        "userMessage": user_message,
        "aiMessage": ai_message,
    })))
}
