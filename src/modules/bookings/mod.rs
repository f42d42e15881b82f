//! Booking engine: reservations, their lifecycle and room availability.

pub mod controller;
pub mod policy;
pub mod router;
pub mod service;

pub use router::init_bookings_router;
pub use service::BookingService;
