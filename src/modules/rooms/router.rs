use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_room, delete_room, get_available_rooms, get_room, get_rooms, update_room,
};

pub fn init_rooms_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_room).get(get_rooms))
        .route("/available", get(get_available_rooms))
        .route("/{id}", get(get_room).put(update_room).delete(delete_room))
}
