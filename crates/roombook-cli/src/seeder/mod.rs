//! Demo data for development databases.
//!
//! Seeded rows are tagged (name prefix, email domain) so that
//! [`clear_all`] removes them without touching real data.

pub mod models;
pub mod organization;
pub mod users;

use sqlx::PgPool;
use std::time::Instant;

use roombook_core::hash_password;

pub use models::SeedConfig;

/// Seeds departments, buildings, rooms, teachers and staff.
pub async fn seed_all(db: &PgPool, config: SeedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!(
        "🌱 Seeding {} rooms and {} users...\n",
        config.total_rooms(),
        config.total_users()
    );

    // One hash for every seeded user; bcrypt per row would dominate the run.
    let password_hash = hash_password(models::SEED_PASSWORD)
        .map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let department_ids = organization::seed_departments(db, config.departments).await?;
    let building_ids = organization::seed_buildings(db, config.buildings).await?;
    organization::seed_rooms(db, &building_ids, config.rooms_per_building).await?;
    users::seed_users(
        db,
        &department_ids,
        config.teachers_per_department,
        config.staff,
        &password_hash,
    )
    .await?;

    println!("\n✅ Seeding complete in {:?}", start_time.elapsed());
    println!("   Seeded users sign in with password: {}", models::SEED_PASSWORD);

    Ok(())
}

/// Removes everything [`seed_all`] created, in one transaction.
pub async fn clear_all(db: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let mut tx = db.begin().await?;

    let (user_count, teacher_bookings) = users::clear_users(&mut tx).await?;

    let room_bookings = sqlx::query(
        "DELETE FROM bookings WHERE room_id IN (
             SELECT r.id FROM rooms r
             JOIN buildings b ON b.id = r.building_id
             WHERE b.name LIKE $1
         )",
    )
    .bind(format!("{}%", models::SEED_NAME_PREFIX))
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let (departments, buildings, rooms) = organization::clear_organization(&mut tx).await?;

    tx.commit().await?;

    println!("   ✓ Deleted {} bookings", teacher_bookings + room_bookings);
    println!("   ✓ Deleted {} users", user_count);
    println!(
        "   ✓ Deleted {} departments, {} buildings, {} rooms",
        departments, buildings, rooms
    );
    println!("✅ Cleared seeded data in {:?}", start_time.elapsed());

    Ok(())
}
