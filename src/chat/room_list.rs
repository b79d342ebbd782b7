use axum::{Json, debug_handler};
use serde_json::{Value, json};

use crate::{ApiResult, AppState, auth::AuthUser, rooms::ALL_ROOMS};

#[debug_handler(state = AppState)]
pub(crate) async fn get_rooms(_auth_user: AuthUser) -> ApiResult<Json<Value>> {
    let rooms: Vec<Value> = ALL_ROOMS
        .iter()
        .map(|room| json!({ "id": room, "name": room.persona_name() }))
        .collect();

    Ok(Json(json!({ "rooms": rooms })))
}
