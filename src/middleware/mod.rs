//! Authentication and authorization for the HTTP surface.
//!
//! - [`auth`]: the [`auth::AuthUser`] bearer-credential extractor
//! - [`role`]: role gates as route layers and extractors
//!
//! Handlers turn an `AuthUser` into a `Requester` and pass it explicitly to
//! the service layer.

pub mod auth;
pub mod role;
