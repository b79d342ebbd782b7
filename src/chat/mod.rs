mod messages;
mod room_list;

use axum::{Router, routing::get};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/chat/messages",
            get(messages::get_messages).post(messages::send_message),
        )
        .route("/api/chat/rooms", get(room_list::get_rooms))
}
