//! User accounts and roles.

use roombook_core::serde::deserialize_optional_from_str;
use roombook_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{DepartmentId, UserId};
use crate::value_types::Email;

/// Role of an account. Stored as the Postgres enum `user_role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Teacher,
    Staff,
}

impl UserRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Staff => "staff",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "staff" => Ok(Self::Staff),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Identity and role of the caller of an engine operation. Always passed
/// explicitly, never read from ambient request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: UserId,
    pub role: UserRole,
}

impl Requester {
    #[must_use]
    pub fn new(id: UserId, role: UserRole) -> Self {
        Self { id, role }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// A user as exposed by the API. The password hash never leaves the database
/// layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub role: UserRole,
    pub email_confirmed: bool,
    pub department_id: Option<DepartmentId>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Columns selected for a [`User`]; shared by every query returning one.
pub const USER_COLUMNS: &str =
    "id, email, full_name, role, email_confirmed, department_id, created_at, updated_at";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[schema(example = "Str0ngPass!")]
    pub password: String,
    #[validate(length(min = 1, max = 200, message = "full_name must be 1-200 characters"))]
    pub full_name: String,
    pub role: UserRole,
    pub department_id: Option<DepartmentId>,
}

/// Partial update. `department_id: null` detaches the user from their
/// department; omitting the field leaves it unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, max = 200, message = "full_name must be 1-200 characters"))]
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub department_id: Option<Option<DepartmentId>>,
}

fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_from_str")]
    pub role: Option<UserRole>,
    #[serde(default, deserialize_with = "deserialize_optional_from_str")]
    pub department_id: Option<DepartmentId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<User>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Teacher).unwrap(), r#""teacher""#);
        let role: UserRole = serde_json::from_str(r#""staff""#).unwrap();
        assert_eq!(role, UserRole::Staff);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("student".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_update_dto_distinguishes_null_from_missing() {
        let missing: UpdateUserDto = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(missing.department_id, None);

        let cleared: UpdateUserDto = serde_json::from_str(r#"{"department_id":null}"#).unwrap();
        assert_eq!(cleared.department_id, Some(None));

        let set: UpdateUserDto = serde_json::from_str(
            r#"{"department_id":"00000000-0000-0000-0000-000000000001"}"#,
        )
        .unwrap();
        assert!(matches!(set.department_id, Some(Some(_))));
    }

    #[test]
    fn test_filter_params_accept_empty_strings() {
        let params: UserFilterParams =
            serde_json::from_str(r#"{"role":"","department_id":"","limit":"5"}"#).unwrap();
        assert!(params.role.is_none());
        assert!(params.department_id.is_none());
        assert_eq!(params.pagination.limit(), 5);
    }
}
