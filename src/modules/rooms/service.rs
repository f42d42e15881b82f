use anyhow::anyhow;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use roombook_core::{AppError, PaginationMeta};
use roombook_models::rooms::{
    CreateRoomDto, PaginatedRoomsResponse, RoomFilterParams, UpdateRoomDto,
};
use roombook_models::{BuildingId, Room, RoomId};

use crate::utils::db::unique_violation_as_conflict;

const DUPLICATE_CODE: &str = "Room code already exists in this building";

fn not_found() -> AppError {
    AppError::not_found(anyhow!("Room not found"))
}

fn normalize_code(code: &str) -> Result<String, AppError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::bad_request(anyhow!("code must not be blank")));
    }
    Ok(code.to_string())
}

async fn ensure_building_exists(conn: &mut PgConnection, id: BuildingId) -> Result<(), AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM buildings WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    if !exists {
        return Err(AppError::not_found(anyhow!("Building not found")));
    }
    Ok(())
}

pub struct RoomService;

impl RoomService {
    #[instrument(skip(db), fields(db.table = "rooms", db.operation = "insert"))]
    pub async fn create_room(db: &PgPool, dto: CreateRoomDto) -> Result<Room, AppError> {
        let code = normalize_code(&dto.code)?;
        let mut conn = db.acquire().await?;

        ensure_building_exists(&mut conn, dto.building_id).await?;

        sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (building_id, code, capacity, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, building_id, code, capacity, is_active, created_at
            "#,
        )
        .bind(dto.building_id)
        .bind(code)
        .bind(dto.capacity)
        .bind(dto.is_active.unwrap_or(true))
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| unique_violation_as_conflict(e, DUPLICATE_CODE))
    }

    #[instrument(skip(db), fields(db.table = "rooms", db.operation = "select"))]
    pub async fn get_rooms(
        db: &PgPool,
        filters: RoomFilterParams,
    ) -> Result<PaginatedRoomsResponse, AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM rooms
            WHERE ($1::uuid IS NULL OR building_id = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            "#,
        )
        .bind(filters.building_id)
        .bind(filters.is_active)
        .fetch_one(db)
        .await?;

        let data = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, building_id, code, capacity, is_active, created_at
            FROM rooms
            WHERE ($1::uuid IS NULL OR building_id = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            ORDER BY code ASC, id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filters.building_id)
        .bind(filters.is_active)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedRoomsResponse {
            data,
            meta: PaginationMeta::new(&filters.pagination, total),
        })
    }

    #[instrument(skip(db), fields(db.table = "rooms", db.operation = "select"))]
    pub async fn get_room(db: &PgPool, id: RoomId) -> Result<Room, AppError> {
        sqlx::query_as::<_, Room>(
            "SELECT id, building_id, code, capacity, is_active, created_at FROM rooms WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(not_found)
    }

    /// Partial update; omitted fields keep their value.
    #[instrument(skip(db), fields(db.table = "rooms", db.operation = "update"))]
    pub async fn update_room(db: &PgPool, id: RoomId, dto: UpdateRoomDto) -> Result<Room, AppError> {
        let code = dto.code.as_deref().map(normalize_code).transpose()?;
        let mut conn = db.acquire().await?;

        if let Some(building_id) = dto.building_id {
            ensure_building_exists(&mut conn, building_id).await?;
        }

        sqlx::query_as::<_, Room>(
            r#"
            UPDATE rooms SET
                building_id = COALESCE($2, building_id),
                code = COALESCE($3, code),
                capacity = COALESCE($4, capacity),
                is_active = COALESCE($5, is_active)
            WHERE id = $1
            RETURNING id, building_id, code, capacity, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(dto.building_id)
        .bind(code)
        .bind(dto.capacity)
        .bind(dto.is_active)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| unique_violation_as_conflict(e, DUPLICATE_CODE))?
        .ok_or_else(not_found)
    }

    /// Refused while any booking, of any status, references the room.
    #[instrument(skip(db), fields(db.table = "rooms", db.operation = "delete"))]
    pub async fn delete_room(db: &PgPool, id: RoomId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let exists: Option<RoomId> =
            sqlx::query_scalar("SELECT id FROM rooms WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(not_found());
        }

        let has_bookings: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM bookings WHERE room_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if has_bookings {
            return Err(AppError::conflict(anyhow!(
                "Room has bookings and cannot be deleted; deactivate it instead"
            )));
        }

        sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
