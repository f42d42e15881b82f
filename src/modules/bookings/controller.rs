use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use roombook_core::AppError;
use roombook_models::bookings::{
    BookingFilterParams, CreateBookingDto, PaginatedBookingsResponse, UpdateBookingDto,
};
use roombook_models::{Booking, BookingId};

use crate::middleware::auth::AuthUser;
use crate::middleware::role::{RequireAdmin, RequireBookingRole};
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::BookingService;

/// Reserve a room
#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingDto,
    responses(
        (status = 201, description = "Booking created with status pending", body = Booking),
        (status = 400, description = "Invalid title or time window, inactive room"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Room or teacher not found"),
        (status = 409, description = "Room already booked for an overlapping time")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_booking(
    State(state): State<AppState>,
    RequireBookingRole(auth_user): RequireBookingRole,
    ValidatedJson(dto): ValidatedJson<CreateBookingDto>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = BookingService::create_booking(&state.db, auth_user.requester(), dto).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    params(
        ("room_id" = Option<String>, Query, description = "Filter by room ID"),
        ("teacher_id" = Option<String>, Query, description = "Filter by teacher ID (ignored for teachers)"),
        ("status" = Option<String>, Query, description = "pending, approved, rejected or cancelled"),
        ("from" = Option<String>, Query, description = "Only bookings ending after this RFC 3339 instant"),
        ("to" = Option<String>, Query, description = "Only bookings starting before this RFC 3339 instant"),
        ("limit" = Option<i64>, Query, description = "Items per page (1-100, default 10)"),
        ("offset" = Option<i64>, Query, description = "Items to skip"),
        ("page" = Option<i64>, Query, description = "Page number, starting at 1")
    ),
    responses(
        (status = 200, description = "Paginated bookings", body = PaginatedBookingsResponse),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_bookings(
    State(state): State<AppState>,
    auth_user: AuthUser,
    filters: Result<Query<BookingFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedBookingsResponse>, AppError> {
    let Query(filters) =
        filters.map_err(|e| AppError::bad_request(anyhow!("Invalid query parameters: {}", e)))?;

    let bookings = BookingService::list_bookings(&state.db, auth_user.requester(), filters).await?;
    Ok(Json(bookings))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking details", body = Booking),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your booking"),
        (status = 404, description = "Booking not found")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_booking(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, AppError> {
    let booking = BookingService::get_booking(&state.db, auth_user.requester(), id).await?;
    Ok(Json(booking))
}

/// Move, retitle or reassign a booking
#[utoipa::path(
    put,
    path = "/api/bookings/{id}",
    params(("id" = String, Path, description = "Booking ID")),
    request_body = UpdateBookingDto,
    responses(
        (status = 200, description = "Booking updated", body = Booking),
        (status = 400, description = "Invalid title or time window"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your booking"),
        (status = 404, description = "Booking, room or teacher not found"),
        (status = 409, description = "Overlapping booking, or booking is cancelled")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_booking(
    State(state): State<AppState>,
    RequireBookingRole(auth_user): RequireBookingRole,
    Path(id): Path<BookingId>,
    ValidatedJson(dto): ValidatedJson<UpdateBookingDto>,
) -> Result<Json<Booking>, AppError> {
    let booking =
        BookingService::update_booking(&state.db, auth_user.requester(), id, dto).await?;
    Ok(Json(booking))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/cancel",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled", body = Booking),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your booking"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is already cancelled")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn cancel_booking(
    State(state): State<AppState>,
    RequireBookingRole(auth_user): RequireBookingRole,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, AppError> {
    let booking = BookingService::cancel_booking(&state.db, auth_user.requester(), id).await?;
    Ok(Json(booking))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/approve",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking approved", body = Booking),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is not pending")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn approve_booking(
    State(state): State<AppState>,
    RequireAdmin(auth_user): RequireAdmin,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, AppError> {
    let booking = BookingService::approve_booking(&state.db, auth_user.requester(), id).await?;
    Ok(Json(booking))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/reject",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking rejected", body = Booking),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is not pending")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn reject_booking(
    State(state): State<AppState>,
    RequireAdmin(auth_user): RequireAdmin,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, AppError> {
    let booking = BookingService::reject_booking(&state.db, auth_user.requester(), id).await?;
    Ok(Json(booking))
}
