//! Bookable rooms and the availability query.

use chrono::{DateTime, Utc};
use roombook_core::serde::{deserialize_optional_bool, deserialize_optional_from_str};
use roombook_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{BuildingId, RoomId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Room {
    pub id: RoomId,
    pub building_id: BuildingId,
    /// Room code, unique within its building (e.g. "B-204")
    pub code: String,
    pub capacity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRoomDto {
    pub building_id: BuildingId,
    #[validate(length(min = 1, max = 50, message = "code must be 1-50 characters"))]
    #[schema(example = "B-204")]
    pub code: String,
    #[validate(range(min = 1, message = "capacity must be a positive integer"))]
    pub capacity: i32,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateRoomDto {
    pub building_id: Option<BuildingId>,
    #[validate(length(min = 1, max = 50, message = "code must be 1-50 characters"))]
    pub code: Option<String>,
    #[validate(range(min = 1, message = "capacity must be a positive integer"))]
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_from_str")]
    pub building_id: Option<BuildingId>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// Half-open window `[from, to)` for which free rooms are requested.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AvailabilityQuery {
    #[schema(example = "2099-01-01T10:00:00Z")]
    pub from: DateTime<Utc>,
    #[schema(example = "2099-01-01T11:00:00Z")]
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedRoomsResponse {
    pub data: Vec<Room>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_params_parse_bool_strings() {
        let params: RoomFilterParams =
            serde_json::from_str(r#"{"is_active":"true","building_id":""}"#).unwrap();
        assert_eq!(params.is_active, Some(true));
        assert!(params.building_id.is_none());
    }
}
