//! Seed row shapes and the knobs that size a seeding run.

use roombook_models::{BuildingId, DepartmentId, UserRole};

/// Every seeded department and building name starts with this, and every
/// seeded user email ends with [`SEED_EMAIL_DOMAIN`]. `clear-seed` keys off
/// both.
pub const SEED_NAME_PREFIX: &str = "Seed ";
pub const SEED_EMAIL_DOMAIN: &str = "@example.com";

/// Password shared by every seeded user.
pub const SEED_PASSWORD: &str = "Password123!";

pub struct DepartmentSeed {
    pub name: String,
}

pub struct BuildingSeed {
    pub name: String,
}

pub struct RoomSeed {
    pub building_id: BuildingId,
    pub code: String,
    pub capacity: i32,
}

pub struct UserSeed {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub department_id: Option<DepartmentId>,
}

#[derive(Clone)]
pub struct SeedConfig {
    pub departments: usize,
    pub buildings: usize,
    pub rooms_per_building: usize,
    pub teachers_per_department: usize,
    pub staff: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            departments: 4,
            buildings: 3,
            rooms_per_building: 10,
            teachers_per_department: 5,
            staff: 3,
        }
    }
}

impl SeedConfig {
    pub fn new(buildings: usize) -> Self {
        Self {
            buildings,
            ..Default::default()
        }
    }

    pub fn with_departments(mut self, departments: usize, teachers_per_department: usize) -> Self {
        self.departments = departments;
        self.teachers_per_department = teachers_per_department;
        self
    }

    pub fn with_rooms_per_building(mut self, rooms: usize) -> Self {
        self.rooms_per_building = rooms;
        self
    }

    pub fn with_staff(mut self, staff: usize) -> Self {
        self.staff = staff;
        self
    }

    pub fn total_rooms(&self) -> usize {
        self.buildings * self.rooms_per_building
    }

    pub fn total_users(&self) -> usize {
        self.departments * self.teachers_per_department + self.staff
    }
}
