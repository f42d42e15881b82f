use axum::{Router, routing::post};

use crate::state::AppState;

use super::controller::{
    change_password, confirm_email, forgot_password, login, logout, refresh, register,
    resend_confirmation, reset_password,
};

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/confirm-email", post(confirm_email))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/change-password", post(change_password))
        .route("/resend-confirmation", post(resend_confirmation))
}
