//! Bookings and their status lifecycle.
//!
//! ```text
//! Pending ──► Approved ──┐
//!    │                   ├──► Cancelled (terminal)
//!    ├──────► Rejected ──┘
//!    └──────────────────────► Cancelled
//! ```

use chrono::{DateTime, Utc};
use roombook_core::serde::{deserialize_optional_datetime, deserialize_optional_from_str};
use roombook_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{BookingId, RoomId, UserId};

pub const MAX_TITLE_LENGTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Approved, Cancelled)
                | (Rejected, Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: BookingId,
    pub room_id: RoomId,
    pub teacher_id: UserId,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

pub const BOOKING_COLUMNS: &str =
    "id, room_id, teacher_id, title, starts_at, ends_at, status, created_at";

/// Title and time window are checked by the booking engine so that the
/// failures surface in a fixed order.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookingDto {
    pub room_id: RoomId,
    /// Required when an admin books on behalf of a teacher; ignored for teachers.
    pub teacher_id: Option<UserId>,
    #[schema(example = "Algebra II revision")]
    pub title: String,
    #[schema(example = "2099-01-01T10:00:00Z")]
    pub starts_at: DateTime<Utc>,
    #[schema(example = "2099-01-01T11:00:00Z")]
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBookingDto {
    pub room_id: RoomId,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Admins may reassign the booking to another teacher.
    pub teacher_id: Option<UserId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_from_str")]
    pub room_id: Option<RoomId>,
    #[serde(default, deserialize_with = "deserialize_optional_from_str")]
    pub teacher_id: Option<UserId>,
    #[serde(default, deserialize_with = "deserialize_optional_from_str")]
    pub status: Option<BookingStatus>,
    /// Only bookings ending after this instant.
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub from: Option<DateTime<Utc>>,
    /// Only bookings starting before this instant.
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub to: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedBookingsResponse {
    pub data: Vec<Booking>,
    pub meta: PaginationMeta,
}
