//! # Roombook Models
//!
//! Entities and DTOs shared by the API server and the CLI.
//!
//! - [`ids`]: typed identifiers
//! - [`value_types`]: validated primitives such as [`Email`]
//! - [`users`], [`departments`], [`buildings`], [`rooms`], [`bookings`]: entities and their DTOs
//! - [`auth`]: authentication request/response bodies

pub mod auth;
pub mod bookings;
pub mod buildings;
pub mod departments;
pub mod ids;
pub mod rooms;
pub mod users;
pub mod value_types;

pub use bookings::{Booking, BookingStatus};
pub use buildings::Building;
pub use departments::Department;
pub use ids::{BookingId, BuildingId, DepartmentId, RoomId, UserId};
pub use rooms::Room;
pub use users::{Requester, User, UserRole};
pub use value_types::Email;
