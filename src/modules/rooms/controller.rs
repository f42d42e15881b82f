use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use roombook_core::AppError;
use roombook_models::rooms::{
    AvailabilityQuery, CreateRoomDto, PaginatedRoomsResponse, RoomFilterParams, UpdateRoomDto,
};
use roombook_models::{Room, RoomId};

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::modules::bookings::BookingService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::RoomService;

#[utoipa::path(
    post,
    path = "/api/rooms",
    request_body = CreateRoomDto,
    responses(
        (status = 201, description = "Room created", body = Room),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Building not found"),
        (status = 409, description = "Room code already exists in this building")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_room(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateRoomDto>,
) -> Result<(StatusCode, Json<Room>), AppError> {
    let room = RoomService::create_room(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

#[utoipa::path(
    get,
    path = "/api/rooms",
    params(
        ("building_id" = Option<String>, Query, description = "Filter by building ID"),
        ("is_active" = Option<bool>, Query, description = "Filter by active flag"),
        ("limit" = Option<i64>, Query, description = "Items per page (1-100, default 10)"),
        ("offset" = Option<i64>, Query, description = "Items to skip"),
        ("page" = Option<i64>, Query, description = "Page number, starting at 1")
    ),
    responses(
        (status = 200, description = "Paginated rooms", body = PaginatedRoomsResponse),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_rooms(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    filters: Result<Query<RoomFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedRoomsResponse>, AppError> {
    let Query(filters) =
        filters.map_err(|e| AppError::bad_request(anyhow!("Invalid query parameters: {}", e)))?;
    let rooms = RoomService::get_rooms(&state.db, filters).await?;
    Ok(Json(rooms))
}

/// Active rooms free for the whole window
///
/// A room is excluded when any non-cancelled booking overlaps `[from, to)`.
#[utoipa::path(
    get,
    path = "/api/rooms/available",
    params(
        ("from" = String, Query, description = "Window start (RFC 3339), not in the past"),
        ("to" = String, Query, description = "Window end (RFC 3339), after from")
    ),
    responses(
        (status = 200, description = "Available rooms", body = Vec<Room>),
        (status = 400, description = "Invalid window"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_available_rooms(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<Vec<Room>>, AppError> {
    let Query(query) =
        query.map_err(|e| AppError::bad_request(anyhow!("Invalid query parameters: {}", e)))?;
    let rooms = BookingService::list_available_rooms(&state.db, query.from, query.to).await?;
    Ok(Json(rooms))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{id}",
    params(("id" = String, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room details", body = Room),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Room not found")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<RoomId>,
) -> Result<Json<Room>, AppError> {
    let room = RoomService::get_room(&state.db, id).await?;
    Ok(Json(room))
}

#[utoipa::path(
    put,
    path = "/api/rooms/{id}",
    params(("id" = String, Path, description = "Room ID")),
    request_body = UpdateRoomDto,
    responses(
        (status = 200, description = "Room updated", body = Room),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Room or building not found"),
        (status = 409, description = "Room code already exists in this building")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_room(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<RoomId>,
    ValidatedJson(dto): ValidatedJson<UpdateRoomDto>,
) -> Result<Json<Room>, AppError> {
    let room = RoomService::update_room(&state.db, id, dto).await?;
    Ok(Json(room))
}

#[utoipa::path(
    delete,
    path = "/api/rooms/{id}",
    params(("id" = String, Path, description = "Room ID")),
    responses(
        (status = 204, description = "Room deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Room has bookings")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_room(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<RoomId>,
) -> Result<StatusCode, AppError> {
    RoomService::delete_room(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
