pub mod auth;
pub mod bookings;
pub mod buildings;
pub mod departments;
pub mod rooms;
pub mod users;
