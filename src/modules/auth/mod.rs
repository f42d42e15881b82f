//! Auth engine: registration, sessions and single-use tokens.

pub mod controller;
pub mod router;
pub mod service;
pub mod tokens;

pub use router::init_auth_router;
pub use service::AuthService;
