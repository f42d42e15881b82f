use anyhow::anyhow;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use roombook_core::{AppError, PaginationMeta, ensure_password_strength, hash_password};
use roombook_models::users::{
    CreateUserDto, PaginatedUsersResponse, USER_COLUMNS, UpdateUserDto, UserFilterParams,
};
use roombook_models::{DepartmentId, Email, User, UserId, UserRole};

use crate::metrics::track_user_registered;
use crate::utils::db::unique_violation_as_conflict;

fn not_found() -> AppError {
    AppError::not_found(anyhow!("User not found"))
}

/// Teachers must belong to a department.
pub fn ensure_department_for_role(
    role: UserRole,
    department_id: Option<DepartmentId>,
) -> Result<(), AppError> {
    if role == UserRole::Teacher && department_id.is_none() {
        return Err(AppError::bad_request(anyhow!(
            "department_id is required for teachers"
        )));
    }
    Ok(())
}

async fn ensure_department_exists(
    conn: &mut PgConnection,
    id: DepartmentId,
) -> Result<(), AppError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM departments WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    if !exists {
        return Err(AppError::not_found(anyhow!("Department not found")));
    }
    Ok(())
}

async fn ensure_no_live_bookings(conn: &mut PgConnection, id: UserId) -> Result<(), AppError> {
    let live: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bookings WHERE teacher_id = $1 AND status <> 'cancelled'",
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    if live > 0 {
        return Err(AppError::conflict(anyhow!(
            "Teacher owns {} active booking(s); cancel or reassign them before changing the role",
            live
        )));
    }
    Ok(())
}

pub struct UserService;

impl UserService {
    #[instrument(skip_all, fields(user.role = %dto.role))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        let email = Email::new(&dto.email).map_err(|e| AppError::bad_request(anyhow!("{}", e)))?;
        ensure_password_strength(&dto.password)?;
        ensure_department_for_role(dto.role, dto.department_id)?;

        let mut conn = db.acquire().await?;
        if let Some(department_id) = dto.department_id {
            ensure_department_exists(&mut conn, department_id).await?;
        }

        let password_hash = hash_password(&dto.password)?;

        let sql = format!(
            "INSERT INTO users (email, password_hash, full_name, role, department_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&email)
            .bind(&password_hash)
            .bind(dto.full_name.trim())
            .bind(dto.role)
            .bind(dto.department_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| unique_violation_as_conflict(e, "Email already exists"))?;

        track_user_registered(user.role.as_str());
        Ok(user)
    }

    #[instrument(skip(db), fields(db.table = "users", db.operation = "select"))]
    pub async fn get_users(
        db: &PgPool,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        const WHERE: &str = "WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::uuid IS NULL OR department_id = $2)";

        let count_sql = format!("SELECT COUNT(*) FROM users {WHERE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filters.role)
            .bind(filters.department_id)
            .fetch_one(db)
            .await?;

        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users {WHERE}
             ORDER BY full_name ASC, id ASC
             LIMIT $3 OFFSET $4"
        );
        let data = sqlx::query_as::<_, User>(&sql)
            .bind(filters.role)
            .bind(filters.department_id)
            .bind(filters.pagination.limit())
            .bind(filters.pagination.offset())
            .fetch_all(db)
            .await?;

        Ok(PaginatedUsersResponse {
            data,
            meta: PaginationMeta::new(&filters.pagination, total),
        })
    }

    #[instrument(skip(db), fields(db.table = "users", db.operation = "select"))]
    pub async fn get_user(db: &PgPool, id: UserId) -> Result<User, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(not_found)
    }

    /// Partial update. The teacher-needs-a-department rule is checked
    /// against the resulting record whenever role or department changes.
    /// A teacher keeps the role while any non-cancelled booking is theirs.
    #[instrument(skip(db), fields(db.table = "users", db.operation = "update"))]
    pub async fn update_user(db: &PgPool, id: UserId, dto: UpdateUserDto) -> Result<User, AppError> {
        let mut tx = db.begin().await?;

        let select = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, User>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(not_found)?;

        let full_name = match dto.full_name.as_deref().map(str::trim) {
            Some("") => return Err(AppError::bad_request(anyhow!("full_name must not be blank"))),
            Some(name) => name.to_string(),
            None => current.full_name,
        };
        let role = dto.role.unwrap_or(current.role);
        let department_id = dto.department_id.unwrap_or(current.department_id);

        if dto.role.is_some() || dto.department_id.is_some() {
            ensure_department_for_role(role, department_id)?;
        }
        if let Some(Some(department_id)) = dto.department_id {
            ensure_department_exists(&mut tx, department_id).await?;
        }
        if current.role == UserRole::Teacher && role != UserRole::Teacher {
            ensure_no_live_bookings(&mut tx, id).await?;
        }

        let update = format!(
            "UPDATE users
             SET full_name = $2, role = $3, department_id = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&update)
            .bind(id)
            .bind(full_name)
            .bind(role)
            .bind(department_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Refused while the user owns bookings; tokens go with the account.
    #[instrument(skip(db), fields(db.table = "users", db.operation = "delete"))]
    pub async fn delete_user(db: &PgPool, id: UserId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let exists: Option<UserId> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(not_found());
        }

        let has_bookings: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM bookings WHERE teacher_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if has_bookings {
            return Err(AppError::conflict(anyhow!(
                "User owns bookings and cannot be deleted"
            )));
        }

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
