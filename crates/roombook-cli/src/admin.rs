//! Admin account bootstrap.
//!
//! Admins cannot be created through public registration, so the first one
//! comes from here.

use sqlx::PgPool;

use roombook_core::{ensure_password_strength, hash_password};
use roombook_models::{Email, UserId, UserRole};

/// Creates a confirmed admin account.
pub async fn create_admin(
    db: &PgPool,
    full_name: &str,
    email: &str,
    password: &str,
) -> Result<UserId, Box<dyn std::error::Error>> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err("Full name must not be blank".into());
    }

    let email = Email::new(email)?;
    ensure_password_strength(password).map_err(|e| e.error.to_string())?;
    let password_hash =
        hash_password(password).map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let user_id = sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (email, password_hash, full_name, role, email_confirmed)
         VALUES ($1, $2, $3, $4, TRUE)
         ON CONFLICT ((LOWER(email))) DO NOTHING
         RETURNING id",
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(full_name)
    .bind(UserRole::Admin)
    .fetch_optional(db)
    .await?;

    user_id.ok_or_else(|| "User with this email already exists".into())
}
