//! Signed access credentials.
//!
//! Tokens are HS256 JWTs keyed by `JWT_SECRET`. Validation checks the
//! signature, `exp` and `iss`; any failure is reported as a single
//! unauthenticated error.

use anyhow::anyhow;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use roombook_config::JwtConfig;
use roombook_core::AppError;
use roombook_models::{UserId, UserRole};

use crate::claims::Claims;

pub fn create_access_token(
    user_id: UserId,
    email: &str,
    role: UserRole,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp().max(0) as usize;
    let exp = now.saturating_add(jwt_config.access_token_expiry.max(0) as usize);

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        jti: Uuid::new_v4().to_string(),
        iat: now,
        exp,
        iss: jwt_config.issuer.clone(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[jwt_config.issuer.as_str()]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(anyhow!("Invalid or expired token")))
}
