use std::env;

use crate::env_or;

pub const DEFAULT_ACCESS_EXPIRY: i64 = 24 * 60 * 60;
pub const DEFAULT_REFRESH_EXPIRY: i64 = 14 * 24 * 60 * 60;
pub const DEFAULT_EMAIL_CONFIRMATION_EXPIRY: i64 = 2 * 24 * 60 * 60;
pub const DEFAULT_PASSWORD_RESET_EXPIRY: i64 = 60 * 60;

/// Signing key and lifetimes (in seconds) for every credential the API issues.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
    pub email_confirmation_expiry: i64,
    pub password_reset_expiry: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "your-secret-key-change-in-production".to_string(),
            issuer: "roombook".to_string(),
            access_token_expiry: DEFAULT_ACCESS_EXPIRY,
            refresh_token_expiry: DEFAULT_REFRESH_EXPIRY,
            email_confirmation_expiry: DEFAULT_EMAIL_CONFIRMATION_EXPIRY,
            password_reset_expiry: DEFAULT_PASSWORD_RESET_EXPIRY,
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET is not set, using the insecure development secret");
                defaults.secret
            }
        };

        Self {
            secret,
            issuer: env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
            access_token_expiry: lifetime_from_env("JWT_ACCESS_EXPIRY", DEFAULT_ACCESS_EXPIRY),
            refresh_token_expiry: lifetime_from_env("JWT_REFRESH_EXPIRY", DEFAULT_REFRESH_EXPIRY),
            email_confirmation_expiry: lifetime_from_env(
                "EMAIL_CONFIRMATION_EXPIRY",
                DEFAULT_EMAIL_CONFIRMATION_EXPIRY,
            ),
            password_reset_expiry: lifetime_from_env(
                "PASSWORD_RESET_EXPIRY",
                DEFAULT_PASSWORD_RESET_EXPIRY,
            ),
        }
    }
}

fn lifetime_from_env(key: &str, default: i64) -> i64 {
    positive_lifetime(key, env_or(key, default), default)
}

/// Lifetimes must be positive; anything else falls back to `default`.
fn positive_lifetime(key: &str, seconds: i64, default: i64) -> i64 {
    if seconds > 0 {
        return seconds;
    }
    tracing::warn!(key, seconds, default, "Ignoring non-positive token lifetime");
    default
}
