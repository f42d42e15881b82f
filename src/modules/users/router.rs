use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::role::require_admin;
use crate::state::AppState;

use super::controller::{create_user, delete_user, get_profile, get_user, get_users, update_user};

/// Account management is admin-only; `/me` is open to any signed-in user.
pub fn init_users_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_user).get(get_users))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
        .route("/me", get(get_profile))
}
