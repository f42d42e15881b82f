use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use roombook_core::{AppError, PaginationMeta};
use roombook_models::departments::{
    CreateDepartmentDto, DepartmentFilterParams, PaginatedDepartmentsResponse, UpdateDepartmentDto,
};
use roombook_models::{Department, DepartmentId};

use crate::utils::db::unique_violation_as_conflict;

const DUPLICATE_NAME: &str = "Department name already exists";

fn not_found() -> AppError {
    AppError::not_found(anyhow!("Department not found"))
}

pub(crate) fn normalize_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request(anyhow!("name must not be blank")));
    }
    Ok(name.to_string())
}

pub struct DepartmentService;

impl DepartmentService {
    #[instrument(skip(db), fields(db.table = "departments", db.operation = "insert"))]
    pub async fn create_department(
        db: &PgPool,
        dto: CreateDepartmentDto,
    ) -> Result<Department, AppError> {
        let name = normalize_name(&dto.name)?;

        sqlx::query_as::<_, Department>(
            "INSERT INTO departments (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(db)
        .await
        .map_err(|e| unique_violation_as_conflict(e, DUPLICATE_NAME))
    }

    #[instrument(skip(db), fields(db.table = "departments", db.operation = "select"))]
    pub async fn get_departments(
        db: &PgPool,
        filters: DepartmentFilterParams,
    ) -> Result<PaginatedDepartmentsResponse, AppError> {
        let pattern = filters.name.as_deref().map(|name| format!("%{}%", name.trim()));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM departments WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(db)
        .await?;

        let data = sqlx::query_as::<_, Department>(
            r#"
            SELECT id, name, created_at FROM departments
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

        Ok(PaginatedDepartmentsResponse {
            data,
            meta: PaginationMeta::new(&filters.pagination, total),
        })
    }

    #[instrument(skip(db), fields(db.table = "departments", db.operation = "select"))]
    pub async fn get_department(db: &PgPool, id: DepartmentId) -> Result<Department, AppError> {
        sqlx::query_as::<_, Department>("SELECT id, name, created_at FROM departments WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(not_found)
    }

    #[instrument(skip(db), fields(db.table = "departments", db.operation = "update"))]
    pub async fn update_department(
        db: &PgPool,
        id: DepartmentId,
        dto: UpdateDepartmentDto,
    ) -> Result<Department, AppError> {
        let name = normalize_name(&dto.name)?;

        sqlx::query_as::<_, Department>(
            "UPDATE departments SET name = $2 WHERE id = $1 RETURNING id, name, created_at",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(db)
        .await
        .map_err(|e| unique_violation_as_conflict(e, DUPLICATE_NAME))?
        .ok_or_else(not_found)
    }

    /// Detaches members before removing the department, in one transaction.
    #[instrument(skip(db), fields(db.table = "departments", db.operation = "delete"))]
    pub async fn delete_department(db: &PgPool, id: DepartmentId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let detached = sqlx::query(
            "UPDATE users SET department_id = NULL, updated_at = NOW() WHERE department_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(not_found());
        }

        tx.commit().await?;

        tracing::info!(department.id = %id, detached, "Department deleted");
        Ok(())
    }
}
