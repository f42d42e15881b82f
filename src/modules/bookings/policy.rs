//! Pure booking rules: time windows, overlap, titles and authority.
//!
//! Nothing here touches the database, so every rule is unit tested in
//! isolation. The service composes these checks in a fixed order:
//! authority first, then title, then time order, then past start.

use std::collections::HashSet;

use anyhow::anyhow;
use chrono::{DateTime, Utc};

use roombook_core::AppError;
use roombook_models::bookings::MAX_TITLE_LENGTH;
use roombook_models::{Booking, BookingStatus, Requester, Room, RoomId, UserId, UserRole};

/// Half-open interval overlap: `[a_start, a_end)` and `[b_start, b_end)`
/// share at least one instant.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// A validated `[starts_at, ends_at)` window with `ends_at > starts_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<Self, AppError> {
        if ends_at <= starts_at {
            return Err(AppError::bad_request(anyhow!(
                "ends_at must be after starts_at"
            )));
        }
        Ok(Self { starts_at, ends_at })
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    /// Rejects windows that start at or before `now`.
    pub fn ensure_future(&self, now: DateTime<Utc>, field: &str) -> Result<(), AppError> {
        if self.starts_at <= now {
            return Err(AppError::bad_request(anyhow!(
                "{} must be in the future",
                field
            )));
        }
        Ok(())
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        overlaps(self.starts_at, self.ends_at, other.starts_at, other.ends_at)
    }
}

/// Trims the title and checks it is non-blank and at most 200 characters.
pub fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request(anyhow!("title must not be blank")));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::bad_request(anyhow!(
            "title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(title.to_string())
}

/// Field checks shared by create and update, in reporting order.
pub fn validate_booking_input(
    title: &str,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(String, TimeWindow), AppError> {
    let title = validate_title(title)?;
    let window = TimeWindow::new(starts_at, ends_at)?;
    window.ensure_future(now, "starts_at")?;
    Ok((title, window))
}

/// Availability queries must look forward: `from < to` and `from` not in
/// the past.
pub fn availability_window(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<TimeWindow, AppError> {
    if to <= from {
        return Err(AppError::bad_request(anyhow!("to must be after from")));
    }
    if from < now {
        return Err(AppError::bad_request(anyhow!("from must not be in the past")));
    }
    TimeWindow::new(from, to)
}

/// Who a new booking belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeacherAssignment {
    /// A teacher booking for themselves.
    Requester(UserId),
    /// An admin booking on behalf of another user.
    OnBehalfOf(UserId),
}

impl TeacherAssignment {
    pub fn teacher_id(self) -> UserId {
        match self {
            Self::Requester(id) | Self::OnBehalfOf(id) => id,
        }
    }
}

/// Authority step for creation. Teachers always book for themselves and any
/// supplied `teacher_id` is ignored. Admins must name a teacher. Staff may
/// not create bookings.
pub fn resolve_teacher(
    requester: Requester,
    requested: Option<UserId>,
) -> Result<TeacherAssignment, AppError> {
    match requester.role {
        UserRole::Teacher => Ok(TeacherAssignment::Requester(requester.id)),
        UserRole::Admin => requested
            .map(TeacherAssignment::OnBehalfOf)
            .ok_or_else(|| {
                AppError::bad_request(anyhow!("teacher_id is required when booking as admin"))
            }),
        UserRole::Staff => Err(AppError::forbidden(anyhow!(
            "Staff members cannot create bookings"
        ))),
    }
}

/// Teacher to reassign to on update, if any. Only admins may reassign;
/// a teacher's `teacher_id` is ignored.
pub fn resolve_reassignment(
    requester: Requester,
    current: UserId,
    requested: Option<UserId>,
) -> Option<UserId> {
    if !requester.is_admin() {
        return None;
    }
    requested.filter(|id| *id != current)
}

fn is_owner_or_admin(requester: Requester, booking: &Booking) -> bool {
    match requester.role {
        UserRole::Admin => true,
        UserRole::Teacher => booking.teacher_id == requester.id,
        UserRole::Staff => false,
    }
}

/// Authority then state check for update and cancel. Cancelled bookings
/// are immutable.
pub fn ensure_can_modify(requester: Requester, booking: &Booking) -> Result<(), AppError> {
    if !is_owner_or_admin(requester, booking) {
        return Err(AppError::forbidden(anyhow!(
            "You can only modify your own bookings"
        )));
    }
    if booking.status.is_terminal() {
        return Err(AppError::already_in_terminal_state(anyhow!(
            "Booking is already cancelled"
        )));
    }
    Ok(())
}

/// Admins and staff read everything; teachers only their own bookings.
pub fn ensure_can_view(requester: Requester, booking: &Booking) -> Result<(), AppError> {
    if requester.role == UserRole::Teacher && booking.teacher_id != requester.id {
        return Err(AppError::forbidden(anyhow!(
            "You can only view your own bookings"
        )));
    }
    Ok(())
}

pub fn ensure_admin(requester: Requester, action: &str) -> Result<(), AppError> {
    if !requester.is_admin() {
        return Err(AppError::forbidden(anyhow!(
            "Only administrators can {} bookings",
            action
        )));
    }
    Ok(())
}

pub fn ensure_transition(current: BookingStatus, next: BookingStatus) -> Result<(), AppError> {
    if current.is_terminal() {
        return Err(AppError::already_in_terminal_state(anyhow!(
            "Booking is already {}",
            current
        )));
    }
    if !current.can_transition_to(next) {
        return Err(AppError::conflict(anyhow!(
            "Cannot change booking status from {} to {}",
            current,
            next
        )));
    }
    Ok(())
}

/// Teachers only ever see their own bookings in listings.
pub fn scope_teacher_filter(requester: Requester, requested: Option<UserId>) -> Option<UserId> {
    match requester.role {
        UserRole::Teacher => Some(requester.id),
        UserRole::Admin | UserRole::Staff => requested,
    }
}

/// Drops every room with a conflicting booking.
pub fn exclude_busy(rooms: Vec<Room>, busy: &HashSet<RoomId>) -> Vec<Room> {
    rooms
        .into_iter()
        .filter(|room| !busy.contains(&room.id))
        .collect()
}
