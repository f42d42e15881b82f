use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_building, delete_building, get_building, get_buildings, update_building,
};

pub fn init_buildings_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_building).get(get_buildings))
        .route(
            "/{id}",
            get(get_building)
                .put(update_building)
                .delete(delete_building),
        )
}
