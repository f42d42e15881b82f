use std::collections::HashSet;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use roombook_core::{AppError, PaginationMeta};
use roombook_models::bookings::{
    BOOKING_COLUMNS, BookingFilterParams, CreateBookingDto, PaginatedBookingsResponse,
    UpdateBookingDto,
};
use roombook_models::{Booking, BookingId, BookingStatus, Requester, Room, RoomId, UserId, UserRole};

use crate::metrics::{
    track_booking_cancelled, track_booking_conflict, track_booking_created,
    track_booking_status_change,
};
use crate::utils::db::foreign_key_violation_as_not_found;

use super::policy::{
    TimeWindow, availability_window, ensure_admin, ensure_can_modify, ensure_can_view,
    ensure_transition, exclude_busy, resolve_reassignment, resolve_teacher, scope_teacher_filter,
    validate_booking_input,
};

type Tx = Transaction<'static, Postgres>;

const TEACHER_NOT_FOUND: &str = "Teacher not found";

pub struct BookingService;

impl BookingService {
    #[instrument(skip(db, dto), fields(room.id = %dto.room_id, requester.id = %requester.id))]
    pub async fn create_booking(
        db: &PgPool,
        requester: Requester,
        dto: CreateBookingDto,
    ) -> Result<Booking, AppError> {
        let now = Utc::now();
        let assignment = resolve_teacher(requester, dto.teacher_id)?;
        let (title, window) = validate_booking_input(&dto.title, dto.starts_at, dto.ends_at, now)?;

        let mut tx = db.begin().await?;

        // Serializes every writer for this room until commit.
        lock_active_room(&mut tx, dto.room_id).await?;

        // Also covers self-bookings: the account may have been deleted or
        // demoted after its access token was issued.
        ensure_teacher(&mut tx, assignment.teacher_id()).await?;

        ensure_slot_free(&mut tx, dto.room_id, &window, None).await?;

        let sql = format!(
            "INSERT INTO bookings (room_id, teacher_id, title, starts_at, ends_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {BOOKING_COLUMNS}"
        );
        let booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(dto.room_id)
            .bind(assignment.teacher_id())
            .bind(&title)
            .bind(window.starts_at())
            .bind(window.ends_at())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| foreign_key_violation_as_not_found(e, TEACHER_NOT_FOUND))?;

        tx.commit().await?;

        track_booking_created();
        tracing::info!(booking.id = %booking.id, "Booking created");

        Ok(booking)
    }

    #[instrument(skip(db, dto), fields(booking.id = %id, requester.id = %requester.id))]
    pub async fn update_booking(
        db: &PgPool,
        requester: Requester,
        id: BookingId,
        dto: UpdateBookingDto,
    ) -> Result<Booking, AppError> {
        let now = Utc::now();
        let mut tx = db.begin().await?;

        let current = lock_booking(&mut tx, id).await?;
        ensure_can_modify(requester, &current)?;

        let (title, window) = validate_booking_input(&dto.title, dto.starts_at, dto.ends_at, now)?;

        let teacher_id = match resolve_reassignment(requester, current.teacher_id, dto.teacher_id) {
            Some(new_teacher) => {
                ensure_teacher(&mut tx, new_teacher).await?;
                new_teacher
            }
            None => current.teacher_id,
        };

        lock_active_room(&mut tx, dto.room_id).await?;
        ensure_slot_free(&mut tx, dto.room_id, &window, Some(id)).await?;

        let sql = format!(
            "UPDATE bookings
             SET room_id = $2, teacher_id = $3, title = $4, starts_at = $5, ends_at = $6
             WHERE id = $1
             RETURNING {BOOKING_COLUMNS}"
        );
        let booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .bind(dto.room_id)
            .bind(teacher_id)
            .bind(&title)
            .bind(window.starts_at())
            .bind(window.ends_at())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| foreign_key_violation_as_not_found(e, TEACHER_NOT_FOUND))?;

        tx.commit().await?;

        Ok(booking)
    }

    #[instrument(skip(db), fields(booking.id = %id, requester.id = %requester.id))]
    pub async fn cancel_booking(
        db: &PgPool,
        requester: Requester,
        id: BookingId,
    ) -> Result<Booking, AppError> {
        let mut tx = db.begin().await?;

        let current = lock_booking(&mut tx, id).await?;
        ensure_can_modify(requester, &current)?;
        ensure_transition(current.status, BookingStatus::Cancelled)?;

        let booking = set_status(&mut tx, id, BookingStatus::Cancelled).await?;
        tx.commit().await?;

        track_booking_cancelled();
        track_booking_status_change(BookingStatus::Cancelled.as_str());

        Ok(booking)
    }

    #[instrument(skip(db), fields(booking.id = %id))]
    pub async fn approve_booking(
        db: &PgPool,
        requester: Requester,
        id: BookingId,
    ) -> Result<Booking, AppError> {
        ensure_admin(requester, "approve")?;
        Self::decide(db, id, BookingStatus::Approved).await
    }

    #[instrument(skip(db), fields(booking.id = %id))]
    pub async fn reject_booking(
        db: &PgPool,
        requester: Requester,
        id: BookingId,
    ) -> Result<Booking, AppError> {
        ensure_admin(requester, "reject")?;
        Self::decide(db, id, BookingStatus::Rejected).await
    }

    async fn decide(db: &PgPool, id: BookingId, next: BookingStatus) -> Result<Booking, AppError> {
        let mut tx = db.begin().await?;

        let current = lock_booking(&mut tx, id).await?;
        ensure_transition(current.status, next)?;

        let booking = set_status(&mut tx, id, next).await?;
        tx.commit().await?;

        track_booking_status_change(next.as_str());

        Ok(booking)
    }

    #[instrument(skip(db), fields(booking.id = %id))]
    pub async fn get_booking(
        db: &PgPool,
        requester: Requester,
        id: BookingId,
    ) -> Result<Booking, AppError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(booking_not_found)?;

        ensure_can_view(requester, &booking)?;

        Ok(booking)
    }

    #[instrument(skip(db))]
    pub async fn list_bookings(
        db: &PgPool,
        requester: Requester,
        filters: BookingFilterParams,
    ) -> Result<PaginatedBookingsResponse, AppError> {
        let teacher_id = scope_teacher_filter(requester, filters.teacher_id);
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        const WHERE: &str = "WHERE ($1::uuid IS NULL OR room_id = $1)
              AND ($2::uuid IS NULL OR teacher_id = $2)
              AND ($3::booking_status IS NULL OR status = $3)
              AND ($4::timestamptz IS NULL OR ends_at > $4)
              AND ($5::timestamptz IS NULL OR starts_at < $5)";

        let count_sql = format!("SELECT COUNT(*) FROM bookings {WHERE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filters.room_id)
            .bind(teacher_id)
            .bind(filters.status)
            .bind(filters.from)
            .bind(filters.to)
            .fetch_one(db)
            .await?;

        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings {WHERE}
             ORDER BY starts_at ASC, id ASC
             LIMIT $6 OFFSET $7"
        );
        let data = sqlx::query_as::<_, Booking>(&sql)
            .bind(filters.room_id)
            .bind(teacher_id)
            .bind(filters.status)
            .bind(filters.from)
            .bind(filters.to)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await?;

        Ok(PaginatedBookingsResponse {
            data,
            meta: PaginationMeta::new(&filters.pagination, total),
        })
    }

    /// Active rooms with no non-cancelled booking overlapping `[from, to)`.
    #[instrument(skip(db))]
    pub async fn list_available_rooms(
        db: &PgPool,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Room>, AppError> {
        let window = availability_window(from, to, Utc::now())?;

        let busy: Vec<RoomId> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT room_id FROM bookings
            WHERE status <> 'cancelled' AND starts_at < $2 AND ends_at > $1
            "#,
        )
        .bind(window.starts_at())
        .bind(window.ends_at())
        .fetch_all(db)
        .await?;

        let rooms = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, building_id, code, capacity, is_active, created_at
            FROM rooms
            WHERE is_active
            ORDER BY code ASC, id ASC
            "#,
        )
        .fetch_all(db)
        .await?;

        let busy: HashSet<RoomId> = busy.into_iter().collect();
        Ok(exclude_busy(rooms, &busy))
    }
}

fn booking_not_found() -> AppError {
    AppError::not_found(anyhow!("Booking not found"))
}

async fn lock_booking(tx: &mut Tx, id: BookingId) -> Result<Booking, AppError> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, Booking>(&sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(booking_not_found)
}

async fn lock_active_room(tx: &mut Tx, room_id: RoomId) -> Result<(), AppError> {
    let is_active: Option<bool> =
        sqlx::query_scalar("SELECT is_active FROM rooms WHERE id = $1 FOR UPDATE")
            .bind(room_id)
            .fetch_optional(&mut **tx)
            .await?;

    match is_active {
        None => Err(AppError::not_found(anyhow!("Room not found"))),
        Some(false) => Err(AppError::bad_request(anyhow!("Room is not active"))),
        Some(true) => Ok(()),
    }
}

/// Holds a share lock on the user row so a concurrent role change waits for
/// this booking to commit.
async fn ensure_teacher(tx: &mut Tx, teacher_id: UserId) -> Result<(), AppError> {
    let role: Option<UserRole> =
        sqlx::query_scalar("SELECT role FROM users WHERE id = $1 FOR SHARE")
            .bind(teacher_id)
            .fetch_optional(&mut **tx)
            .await?;

    match role {
        None => Err(AppError::not_found(anyhow!(TEACHER_NOT_FOUND))),
        Some(UserRole::Teacher) => Ok(()),
        Some(_) => Err(AppError::bad_request(anyhow!(
            "teacher_id must reference a user with the teacher role"
        ))),
    }
}

/// Must run while the room row is locked.
async fn ensure_slot_free(
    tx: &mut Tx,
    room_id: RoomId,
    window: &TimeWindow,
    exclude: Option<BookingId>,
) -> Result<(), AppError> {
    let taken: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM bookings
            WHERE room_id = $1
              AND status <> 'cancelled'
              AND starts_at < $3
              AND ends_at > $2
              AND ($4::uuid IS NULL OR id <> $4)
        )
        "#,
    )
    .bind(room_id)
    .bind(window.starts_at())
    .bind(window.ends_at())
    .bind(exclude)
    .fetch_one(&mut **tx)
    .await?;

    if taken {
        track_booking_conflict();
        return Err(AppError::conflict(anyhow!(
            "Room is already booked for the requested time"
        )));
    }
    Ok(())
}

async fn set_status(tx: &mut Tx, id: BookingId, status: BookingStatus) -> Result<Booking, AppError> {
    let sql = format!("UPDATE bookings SET status = $2 WHERE id = $1 RETURNING {BOOKING_COLUMNS}");
    let booking = sqlx::query_as::<_, Booking>(&sql)
        .bind(id)
        .bind(status)
        .fetch_one(&mut **tx)
        .await?;
    Ok(booking)
}
