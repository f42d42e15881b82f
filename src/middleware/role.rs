//! Role gates for the HTTP surface.
//!
//! Two styles are offered: a route layer ([`require_admin`]) for whole
//! routers, and extractors ([`RequireAdmin`], [`RequireBookingRole`]) for
//! individual handlers. Engine operations still run their own authority
//! checks; these gates only reject obviously unauthorized callers early.

use anyhow::anyhow;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use roombook_core::AppError;
use roombook_models::UserRole;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub async fn require_roles(
    state: &AppState,
    req: Request,
    next: Next,
    allowed_roles: &[UserRole],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();
    let auth_user = AuthUser::from_request_parts(&mut parts, state).await?;
    check_any_role(&auth_user, allowed_roles)?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Route layer admitting administrators only.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(&state, req, next, &[UserRole::Admin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[UserRole]) -> Result<(), AppError> {
    let role = auth_user.role();
    if !allowed_roles.contains(&role) {
        return Err(AppError::forbidden(anyhow!(
            "Access denied. Role '{}' may not perform this action",
            role
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        check_any_role(&auth_user, &[UserRole::Admin])?;
        Ok(RequireAdmin(auth_user))
    }
}

/// Admins and teachers: the roles that may create or change bookings.
#[derive(Debug, Clone)]
pub struct RequireBookingRole(pub AuthUser);

impl FromRequestParts<AppState> for RequireBookingRole {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        check_any_role(&auth_user, &[UserRole::Admin, UserRole::Teacher])?;
        Ok(RequireBookingRole(auth_user))
    }
}
