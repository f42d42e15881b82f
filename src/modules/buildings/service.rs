use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use roombook_core::{AppError, PaginationMeta};
use roombook_models::buildings::{
    BuildingFilterParams, CreateBuildingDto, PaginatedBuildingsResponse, UpdateBuildingDto,
};
use roombook_models::{Building, BuildingId};

use crate::modules::departments::service::normalize_name;
use crate::utils::db::unique_violation_as_conflict;

const DUPLICATE_NAME: &str = "Building name already exists";

fn not_found() -> AppError {
    AppError::not_found(anyhow!("Building not found"))
}

pub struct BuildingService;

impl BuildingService {
    #[instrument(skip(db), fields(db.table = "buildings", db.operation = "insert"))]
    pub async fn create_building(db: &PgPool, dto: CreateBuildingDto) -> Result<Building, AppError> {
        let name = normalize_name(&dto.name)?;

        sqlx::query_as::<_, Building>(
            "INSERT INTO buildings (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(db)
        .await
        .map_err(|e| unique_violation_as_conflict(e, DUPLICATE_NAME))
    }

    #[instrument(skip(db), fields(db.table = "buildings", db.operation = "select"))]
    pub async fn get_buildings(
        db: &PgPool,
        filters: BuildingFilterParams,
    ) -> Result<PaginatedBuildingsResponse, AppError> {
        let pattern = filters.name.as_deref().map(|name| format!("%{}%", name.trim()));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM buildings WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(db)
        .await?;

        let data = sqlx::query_as::<_, Building>(
            r#"
            SELECT id, name, created_at FROM buildings
            WHERE ($1::text IS NULL OR name ILIKE $1)
            ORDER BY name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedBuildingsResponse {
            data,
            meta: PaginationMeta::new(&filters.pagination, total),
        })
    }

    #[instrument(skip(db), fields(db.table = "buildings", db.operation = "select"))]
    pub async fn get_building(db: &PgPool, id: BuildingId) -> Result<Building, AppError> {
        sqlx::query_as::<_, Building>("SELECT id, name, created_at FROM buildings WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(not_found)
    }

    #[instrument(skip(db), fields(db.table = "buildings", db.operation = "update"))]
    pub async fn update_building(
        db: &PgPool,
        id: BuildingId,
        dto: UpdateBuildingDto,
    ) -> Result<Building, AppError> {
        let name = normalize_name(&dto.name)?;

        sqlx::query_as::<_, Building>(
            "UPDATE buildings SET name = $2 WHERE id = $1 RETURNING id, name, created_at",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(db)
        .await
        .map_err(|e| unique_violation_as_conflict(e, DUPLICATE_NAME))?
        .ok_or_else(not_found)
    }

    /// Refused while any room still belongs to the building.
    #[instrument(skip(db), fields(db.table = "buildings", db.operation = "delete"))]
    pub async fn delete_building(db: &PgPool, id: BuildingId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let exists: Option<BuildingId> =
            sqlx::query_scalar("SELECT id FROM buildings WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(not_found());
        }

        let rooms: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE building_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if rooms > 0 {
            return Err(AppError::conflict(anyhow!(
                "Building still has {} room(s); delete or move them first",
                rooms
            )));
        }

        sqlx::query("DELETE FROM buildings WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
