//! Persistence side of the token service: refresh credentials and
//! single-use tokens, stored as SHA-256 digests.

use chrono::{Duration, Utc};
use sqlx::PgConnection;

use roombook_auth::{create_access_token, hash_token, new_opaque_token};
use roombook_config::JwtConfig;
use roombook_core::AppError;
use roombook_models::auth::{AuthTokensResponse, UserTokenPurpose};
use roombook_models::{UserId, UserRole};

use crate::metrics::track_jwt_issued;

/// Issues an access credential and stores a fresh refresh credential.
pub async fn issue_session(
    conn: &mut PgConnection,
    user_id: UserId,
    email: &str,
    role: UserRole,
    jwt_config: &JwtConfig,
) -> Result<AuthTokensResponse, AppError> {
    let access_token = create_access_token(user_id, email, role, jwt_config)?;
    let refresh_token = new_opaque_token();
    let expires_at = Utc::now() + Duration::seconds(jwt_config.refresh_token_expiry);

    sqlx::query("INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(hash_token(&refresh_token))
        .bind(expires_at)
        .execute(&mut *conn)
        .await?;

    track_jwt_issued();

    Ok(AuthTokensResponse::bearer(
        access_token,
        refresh_token,
        jwt_config.access_token_expiry,
    ))
}

/// Atomically revokes a live refresh credential and returns its owner.
/// Of several concurrent callers presenting the same token, only one wins.
pub async fn claim_refresh_token(
    conn: &mut PgConnection,
    raw: &str,
) -> Result<Option<UserId>, AppError> {
    let user_id = sqlx::query_scalar(
        r#"
        UPDATE refresh_tokens
        SET revoked = TRUE
        WHERE token_hash = $1 AND NOT revoked AND expires_at > NOW()
        RETURNING user_id
        "#,
    )
    .bind(hash_token(raw))
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user_id)
}

pub async fn revoke_all_refresh_tokens(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<u64, AppError> {
    let result =
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND NOT revoked")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
    Ok(result.rows_affected())
}

/// Replaces any outstanding token of `purpose` for the user with a new one
/// and returns the raw value.
pub async fn replace_user_token(
    conn: &mut PgConnection,
    user_id: UserId,
    purpose: UserTokenPurpose,
    ttl_seconds: i64,
) -> Result<String, AppError> {
    sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 AND purpose = $2")
        .bind(user_id)
        .bind(purpose)
        .execute(&mut *conn)
        .await?;

    let raw = new_opaque_token();
    let expires_at = Utc::now() + Duration::seconds(ttl_seconds);

    sqlx::query(
        "INSERT INTO user_tokens (user_id, token_hash, purpose, expires_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(hash_token(&raw))
    .bind(purpose)
    .bind(expires_at)
    .execute(&mut *conn)
    .await?;

    Ok(raw)
}

/// Deletes a live single-use token and returns its owner. `owner`
/// restricts redemption to one user's tokens.
pub async fn consume_user_token(
    conn: &mut PgConnection,
    raw: &str,
    purpose: UserTokenPurpose,
    owner: Option<UserId>,
) -> Result<Option<UserId>, AppError> {
    let user_id = sqlx::query_scalar(
        r#"
        DELETE FROM user_tokens
        WHERE token_hash = $1
          AND purpose = $2
          AND expires_at > NOW()
          AND ($3::uuid IS NULL OR user_id = $3)
        RETURNING user_id
        "#,
    )
    .bind(hash_token(raw))
    .bind(purpose)
    .bind(owner)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user_id)
}
