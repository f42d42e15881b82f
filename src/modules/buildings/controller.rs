use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use roombook_core::AppError;
use roombook_models::buildings::{
    CreateBuildingDto, BuildingFilterParams, PaginatedBuildingsResponse, UpdateBuildingDto,
};
use roombook_models::{Building, BuildingId};

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::BuildingService;

#[utoipa::path(
    post,
    path = "/api/buildings",
    request_body = CreateBuildingDto,
    responses(
        (status = 201, description = "Building created", body = Building),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 409, description = "Building name already exists")
    ),
    tag = "Buildings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_building(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateBuildingDto>,
) -> Result<(StatusCode, Json<Building>), AppError> {
    let building = BuildingService::create_building(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(building)))
}

#[utoipa::path(
    get,
    path = "/api/buildings",
    params(
        ("name" = Option<String>, Query, description = "Filter by name (partial match)"),
        ("limit" = Option<i64>, Query, description = "Items per page (1-100, default 10)"),
        ("offset" = Option<i64>, Query, description = "Items to skip"),
        ("page" = Option<i64>, Query, description = "Page number, starting at 1")
    ),
    responses(
        (status = 200, description = "Paginated buildings", body = PaginatedBuildingsResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Buildings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_buildings(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    filters: Result<Query<BuildingFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedBuildingsResponse>, AppError> {
    let Query(filters) =
        filters.map_err(|e| AppError::bad_request(anyhow!("Invalid query parameters: {}", e)))?;
    let buildings = BuildingService::get_buildings(&state.db, filters).await?;
    Ok(Json(buildings))
}

#[utoipa::path(
    get,
    path = "/api/buildings/{id}",
    params(("id" = String, Path, description = "Building ID")),
    responses(
        (status = 200, description = "Building details", body = Building),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Building not found")
    ),
    tag = "Buildings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_building(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<BuildingId>,
) -> Result<Json<Building>, AppError> {
    let building = BuildingService::get_building(&state.db, id).await?;
    Ok(Json(building))
}

#[utoipa::path(
    put,
    path = "/api/buildings/{id}",
    params(("id" = String, Path, description = "Building ID")),
    request_body = UpdateBuildingDto,
    responses(
        (status = 200, description = "Building updated", body = Building),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Building not found"),
        (status = 409, description = "Building name already exists")
    ),
    tag = "Buildings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_building(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<BuildingId>,
    ValidatedJson(dto): ValidatedJson<UpdateBuildingDto>,
) -> Result<Json<Building>, AppError> {
    let building = BuildingService::update_building(&state.db, id, dto).await?;
    Ok(Json(building))
}

/// Delete a building that has no rooms
#[utoipa::path(
    delete,
    path = "/api/buildings/{id}",
    params(("id" = String, Path, description = "Building ID")),
    responses(
        (status = 204, description = "Building deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Building not found"),
        (status = 409, description = "Building still has rooms")
    ),
    tag = "Buildings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_building(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<BuildingId>,
) -> Result<StatusCode, AppError> {
    BuildingService::delete_building(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
