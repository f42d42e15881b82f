use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    approve_booking, cancel_booking, create_booking, get_booking, get_bookings, reject_booking,
    update_booking,
};

pub fn init_bookings_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(get_bookings))
        .route("/{id}", get(get_booking).put(update_booking))
        .route("/{id}/cancel", post(cancel_booking))
        .route("/{id}/approve", post(approve_booking))
        .route("/{id}/reject", post(reject_booking))
}
