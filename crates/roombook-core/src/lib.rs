//! # Roombook Core
//!
//! Foundational types shared across the Roombook workspace:
//!
//! - [`errors`]: the [`AppError`] taxonomy and its HTTP mapping
//! - [`pagination`]: query parameters and response metadata for list endpoints
//! - [`password`]: bcrypt hashing and the password strength policy
//! - [`serde`]: lenient query-string deserializers

pub mod errors;
pub mod pagination;
pub mod password;
pub mod serde;

pub use errors::{AppError, ErrorKind};
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{ensure_new_password, ensure_password_strength, hash_password, verify_password};
