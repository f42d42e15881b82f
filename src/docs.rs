use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use roombook_core::{PaginationMeta, PaginationParams};
use roombook_models::auth::{
    AuthTokensResponse, ChangePasswordRequest, ConfirmEmailRequest, ForgotPasswordRequest,
    LoginRequest, MessageResponse, RefreshTokenRequest, RegisterRequest, ResetPasswordRequest,
};
use roombook_models::bookings::{
    CreateBookingDto, PaginatedBookingsResponse, UpdateBookingDto,
};
use roombook_models::buildings::{CreateBuildingDto, PaginatedBuildingsResponse, UpdateBuildingDto};
use roombook_models::departments::{
    CreateDepartmentDto, PaginatedDepartmentsResponse, UpdateDepartmentDto,
};
use roombook_models::rooms::{AvailabilityQuery, CreateRoomDto, PaginatedRoomsResponse, UpdateRoomDto};
use roombook_models::users::{CreateUserDto, PaginatedUsersResponse, UpdateUserDto};
use roombook_models::{Booking, BookingStatus, Building, Department, Room, User, UserRole};

use crate::modules::auth::controller::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::confirm_email,
        crate::modules::auth::controller::forgot_password,
        crate::modules::auth::controller::reset_password,
        crate::modules::auth::controller::change_password,
        crate::modules::auth::controller::resend_confirmation,
        crate::modules::departments::controller::create_department,
        crate::modules::departments::controller::get_departments,
        crate::modules::departments::controller::get_department,
        crate::modules::departments::controller::update_department,
        crate::modules::departments::controller::delete_department,
        crate::modules::buildings::controller::create_building,
        crate::modules::buildings::controller::get_buildings,
        crate::modules::buildings::controller::get_building,
        crate::modules::buildings::controller::update_building,
        crate::modules::buildings::controller::delete_building,
        crate::modules::rooms::controller::create_room,
        crate::modules::rooms::controller::get_rooms,
        crate::modules::rooms::controller::get_available_rooms,
        crate::modules::rooms::controller::get_room,
        crate::modules::rooms::controller::update_room,
        crate::modules::rooms::controller::delete_room,
        crate::modules::bookings::controller::create_booking,
        crate::modules::bookings::controller::get_bookings,
        crate::modules::bookings::controller::get_booking,
        crate::modules::bookings::controller::update_booking,
        crate::modules::bookings::controller::cancel_booking,
        crate::modules::bookings::controller::approve_booking,
        crate::modules::bookings::controller::reject_booking,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_profile,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
    ),
    components(
        schemas(
            ErrorResponse,
            PaginationMeta,
            PaginationParams,
            RegisterRequest,
            LoginRequest,
            AuthTokensResponse,
            RefreshTokenRequest,
            ConfirmEmailRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            ChangePasswordRequest,
            MessageResponse,
            Department,
            CreateDepartmentDto,
            UpdateDepartmentDto,
            PaginatedDepartmentsResponse,
            Building,
            CreateBuildingDto,
            UpdateBuildingDto,
            PaginatedBuildingsResponse,
            Room,
            CreateRoomDto,
            UpdateRoomDto,
            AvailabilityQuery,
            PaginatedRoomsResponse,
            Booking,
            BookingStatus,
            CreateBookingDto,
            UpdateBookingDto,
            PaginatedBookingsResponse,
            User,
            UserRole,
            CreateUserDto,
            UpdateUserDto,
            PaginatedUsersResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, sessions and password management"),
        (name = "Departments", description = "Department management"),
        (name = "Buildings", description = "Building management"),
        (name = "Rooms", description = "Room management and availability"),
        (name = "Bookings", description = "Room reservations and their lifecycle"),
        (name = "Users", description = "User management")
    ),
    info(
        title = "Roombook API",
        version = "0.1.0",
        description = "Room reservation backend built with Rust, Axum and PostgreSQL.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
