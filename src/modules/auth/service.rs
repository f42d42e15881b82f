use std::sync::OnceLock;

use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use roombook_config::JwtConfig;
use roombook_core::{AppError, ensure_new_password, hash_password, verify_password};
use roombook_models::auth::{
    AuthTokensResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
    MessageResponse, RegisterRequest, ResetPasswordRequest, UserTokenPurpose,
};
use roombook_models::users::USER_COLUMNS;
use roombook_models::{DepartmentId, Email, User, UserId, UserRole};

use crate::metrics::{
    track_refresh_rotation, track_user_login_failure, track_user_login_success,
    track_user_registered,
};
use crate::utils::db::unique_violation_as_conflict;
use crate::utils::email::EmailService;

use super::tokens::{
    claim_refresh_token, consume_user_token, issue_session, replace_user_token,
    revoke_all_refresh_tokens,
};

pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for that email, a password reset link has been sent";

fn invalid_credentials() -> AppError {
    AppError::unauthorized(anyhow!("Invalid email or password"))
}

fn invalid_refresh_token() -> AppError {
    AppError::unauthorized(anyhow!("Invalid or expired refresh token"))
}

fn invalid_token() -> AppError {
    AppError::bad_request(anyhow!("Invalid or expired token"))
}

fn parse_email(raw: &str) -> Result<Email, AppError> {
    Email::new(raw).map_err(|e| AppError::bad_request(anyhow!("{}", e)))
}

/// Hash checked against when the email is unknown, so both failure paths
/// pay for one bcrypt verification.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    DUMMY_HASH
        .get_or_init(|| hash_password("roombook-dummy-password").ok())
        .as_deref()
}

#[derive(sqlx::FromRow)]
struct UserCredentials {
    id: UserId,
    email: Email,
    full_name: String,
    role: UserRole,
    email_confirmed: bool,
    password_hash: String,
}

async fn find_credentials_by_email(
    db: &PgPool,
    email: &Email,
) -> Result<Option<UserCredentials>, AppError> {
    let user = sqlx::query_as::<_, UserCredentials>(
        r#"
        SELECT id, email, full_name, role, email_confirmed, password_hash
        FROM users
        WHERE LOWER(email) = $1
        "#,
    )
    .bind(email.as_str())
    .fetch_optional(db)
    .await?;
    Ok(user)
}

async fn find_credentials_by_id(
    db: &PgPool,
    user_id: UserId,
) -> Result<Option<UserCredentials>, AppError> {
    let user = sqlx::query_as::<_, UserCredentials>(
        r#"
        SELECT id, email, full_name, role, email_confirmed, password_hash
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip_all, fields(user.role = %dto.role))]
    pub async fn register(
        db: &PgPool,
        jwt_config: &JwtConfig,
        mailer: &EmailService,
        dto: RegisterRequest,
    ) -> Result<AuthTokensResponse, AppError> {
        ensure_new_password(&dto.password, &dto.confirm_password)?;
        let email = parse_email(&dto.email)?;

        if find_credentials_by_email(db, &email).await?.is_some() {
            return Err(AppError::conflict(anyhow!("Email already exists")));
        }

        let department_id = match dto.department_id {
            Some(id) => existing_department(db, id).await?,
            None => None,
        };

        let password_hash = hash_password(&dto.password)?;

        let mut tx = db.begin().await?;

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
            .bind(department_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| unique_violation_as_conflict(e, "Email already exists"))?;

        let confirmation_token = replace_user_token(
            &mut tx,
            user.id,
            UserTokenPurpose::EmailConfirmation,
            jwt_config.email_confirmation_expiry,
        )
        .await?;

        let tokens = issue_session(&mut tx, user.id, user.email.as_str(), user.role, jwt_config)
            .await?;

        tx.commit().await?;

        track_user_registered(user.role.as_str());
        tracing::info!(user.id = %user.id, "User registered");

        if let Err(e) = mailer
            .send_email_confirmation(user.email.as_str(), &user.full_name, &confirmation_token)
            .await
        {
            tracing::warn!(user.id = %user.id, error = %e, "Failed to send confirmation email");
        }

        Ok(tokens)
    }

    #[instrument(skip_all)]
    pub async fn login(
        db: &PgPool,
        jwt_config: &JwtConfig,
        dto: LoginRequest,
    ) -> Result<AuthTokensResponse, AppError> {
        let user = match Email::new(&dto.email) {
            Ok(email) => find_credentials_by_email(db, &email).await?,
            Err(_) => None,
        };

        let Some(user) = user else {
            if let Some(hash) = dummy_hash() {
                let _ = verify_password(&dto.password, hash);
            }
            track_user_login_failure();
            return Err(invalid_credentials());
        };

        if !verify_password(&dto.password, &user.password_hash)? {
            track_user_login_failure();
            return Err(invalid_credentials());
        }

        let mut tx = db.begin().await?;
        let tokens =
            issue_session(&mut tx, user.id, user.email.as_str(), user.role, jwt_config).await?;
        tx.commit().await?;

        track_user_login_success(user.role.as_str());
        tracing::info!(user.id = %user.id, "User logged in");

        Ok(tokens)
    }

    /// Rotates a refresh credential: the presented token is revoked and a
    /// replacement issued in the same transaction.
    #[instrument(skip_all)]
    pub async fn refresh(
        db: &PgPool,
        jwt_config: &JwtConfig,
        refresh_token: &str,
    ) -> Result<AuthTokensResponse, AppError> {
        let mut tx = db.begin().await?;

        let user_id = claim_refresh_token(&mut tx, refresh_token)
            .await?
            .ok_or_else(invalid_refresh_token)?;

        let (email, role): (Email, UserRole) =
            sqlx::query_as("SELECT email, role FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(invalid_refresh_token)?;

        let tokens = issue_session(&mut tx, user_id, email.as_str(), role, jwt_config).await?;
        tx.commit().await?;

        track_refresh_rotation();

        Ok(tokens)
    }

    /// Revokes the presented refresh credential. Unknown or already revoked
    /// tokens are accepted silently.
    #[instrument(skip_all)]
    pub async fn logout(db: &PgPool, refresh_token: &str) -> Result<MessageResponse, AppError> {
        let mut conn = db.acquire().await?;
        if let Some(user_id) = claim_refresh_token(&mut conn, refresh_token).await? {
            tracing::info!(user.id = %user_id, "Refresh token revoked");
        }
        Ok(MessageResponse::new("Logged out"))
    }

    #[instrument(skip_all)]
    pub async fn confirm_email(db: &PgPool, token: &str) -> Result<MessageResponse, AppError> {
        let mut tx = db.begin().await?;

        let user_id = consume_user_token(&mut tx, token, UserTokenPurpose::EmailConfirmation, None)
            .await?
            .ok_or_else(invalid_token)?;

        sqlx::query("UPDATE users SET email_confirmed = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(user.id = %user_id, "Email confirmed");
        Ok(MessageResponse::new("Email confirmed"))
    }

    /// Always answers with the same message so callers cannot tell which
    /// emails are registered.
    #[instrument(skip_all)]
    pub async fn forgot_password(
        db: &PgPool,
        jwt_config: &JwtConfig,
        mailer: &EmailService,
        dto: ForgotPasswordRequest,
    ) -> Result<MessageResponse, AppError> {
        let user = match Email::new(&dto.email) {
            Ok(email) => find_credentials_by_email(db, &email).await?,
            Err(_) => None,
        };

        if let Some(user) = user {
            let mut tx = db.begin().await?;
            let token = replace_user_token(
                &mut tx,
                user.id,
                UserTokenPurpose::PasswordReset,
                jwt_config.password_reset_expiry,
            )
            .await?;
            tx.commit().await?;

            if let Err(e) = mailer
                .send_password_reset_email(user.email.as_str(), &user.full_name, &token)
                .await
            {
                tracing::warn!(user.id = %user.id, error = %e, "Failed to send password reset email");
            }
        }

        Ok(MessageResponse::new(FORGOT_PASSWORD_MESSAGE))
    }

    /// Redeems a password reset token. Outstanding refresh credentials are
    /// revoked so existing sessions must sign in again.
    #[instrument(skip_all)]
    pub async fn reset_password(
        db: &PgPool,
        dto: ResetPasswordRequest,
    ) -> Result<MessageResponse, AppError> {
        let email = parse_email(&dto.email)?;
        let user = find_credentials_by_email(db, &email)
            .await?
            .ok_or_else(invalid_token)?;

        ensure_new_password(&dto.new_password, &dto.confirm_password)?;
        let password_hash = hash_password(&dto.new_password)?;

        let mut tx = db.begin().await?;

        consume_user_token(
            &mut tx,
            &dto.token,
            UserTokenPurpose::PasswordReset,
            Some(user.id),
        )
        .await?
        .ok_or_else(invalid_token)?;

        set_password_hash(&mut tx, user.id, &password_hash).await?;
        revoke_all_refresh_tokens(&mut tx, user.id).await?;

        tx.commit().await?;

        tracing::info!(user.id = %user.id, "Password reset");
        Ok(MessageResponse::new("Password has been reset"))
    }

    #[instrument(skip(db, dto), fields(user.id = %user_id))]
    pub async fn change_password(
        db: &PgPool,
        user_id: UserId,
        dto: ChangePasswordRequest,
    ) -> Result<MessageResponse, AppError> {
        let user = find_credentials_by_id(db, user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized(anyhow!("User no longer exists")))?;

        if !verify_password(&dto.current_password, &user.password_hash)? {
            return Err(AppError::bad_request(anyhow!(
                "current_password is incorrect"
            )));
        }

        ensure_new_password(&dto.new_password, &dto.confirm_password)?;
        let password_hash = hash_password(&dto.new_password)?;

        let mut conn = db.acquire().await?;
        set_password_hash(&mut conn, user.id, &password_hash).await?;

        Ok(MessageResponse::new("Password changed"))
    }

    #[instrument(skip(db, jwt_config, mailer), fields(user.id = %user_id))]
    pub async fn resend_confirmation(
        db: &PgPool,
        jwt_config: &JwtConfig,
        mailer: &EmailService,
        user_id: UserId,
    ) -> Result<MessageResponse, AppError> {
        let user = find_credentials_by_id(db, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        if user.email_confirmed {
            return Err(AppError::conflict(anyhow!("Email is already confirmed")));
        }

        let mut tx = db.begin().await?;
        let token = replace_user_token(
            &mut tx,
            user.id,
            UserTokenPurpose::EmailConfirmation,
            jwt_config.email_confirmation_expiry,
        )
        .await?;
        tx.commit().await?;

        if let Err(e) = mailer
            .send_email_confirmation(user.email.as_str(), &user.full_name, &token)
            .await
        {
            tracing::warn!(user.id = %user.id, error = %e, "Failed to send confirmation email");
        }

        Ok(MessageResponse::new("Confirmation email sent"))
    }
}

/// Unknown departments are dropped rather than rejected.
async fn existing_department(
    db: &PgPool,
    id: DepartmentId,
) -> Result<Option<DepartmentId>, AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM departments WHERE id = $1)")
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(exists.then_some(id))
}

async fn set_password_hash(
    conn: &mut sqlx::PgConnection,
    user_id: UserId,
    password_hash: &str,
) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(password_hash)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
