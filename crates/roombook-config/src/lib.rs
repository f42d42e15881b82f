//! # Roombook Config
//!
//! Environment-driven configuration for the Roombook API. Every struct has a
//! `from_env()` constructor that falls back to development defaults when a
//! variable is unset or unparsable.
//!
//! - [`jwt`]: access credential signing and token lifetimes
//! - [`cors`]: allowed browser origins
//! - [`email`]: SMTP delivery settings
//! - [`rate_limit`]: per-IP request limits

pub mod cors;
pub mod email;
pub mod jwt;
pub mod rate_limit;

pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;

/// Reads and parses an environment variable, falling back to `default`.
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
