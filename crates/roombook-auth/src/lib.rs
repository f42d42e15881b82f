//! # Roombook Auth
//!
//! The token service:
//!
//! - [`claims`]: access credential claims
//! - [`jwt`]: issue and validate signed access credentials (HS256)
//! - [`opaque`]: random opaque tokens for refresh, email confirmation and
//!   password reset, plus the digest under which they are stored

pub mod claims;
pub mod jwt;
pub mod opaque;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
pub use opaque::{hash_token, new_opaque_token};
