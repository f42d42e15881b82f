//! Department, building and room seeding.

use fake::Fake;
use fake::faker::address::en::{CityName, StreetName};
use fake::faker::company::en::Industry;
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashSet;
use std::time::Instant;

use roombook_models::{BuildingId, DepartmentId, RoomId};

use super::models::{BuildingSeed, DepartmentSeed, RoomSeed, SEED_NAME_PREFIX};

const ROOM_CAPACITIES: [i32; 5] = [12, 20, 30, 45, 120];

/// Generates uniquely named departments.
pub fn generate_departments(count: usize) -> Vec<DepartmentSeed> {
    unique_names(count, || Industry().fake())
        .into_iter()
        .map(|name| DepartmentSeed { name })
        .collect()
}

/// Generates uniquely named buildings.
pub fn generate_buildings(count: usize) -> Vec<BuildingSeed> {
    unique_names(count, || {
        let city: String = CityName().fake();
        let street: String = StreetName().fake();
        format!("{city} {street} Hall")
    })
    .into_iter()
    .map(|name| BuildingSeed { name })
    .collect()
}

/// Room codes follow `<floor><number>`, e.g. `101`, `102`, ..., `201`.
pub fn generate_rooms(building_ids: &[BuildingId], rooms_per_building: usize) -> Vec<RoomSeed> {
    building_ids
        .par_iter()
        .flat_map(|&building_id| {
            (0..rooms_per_building)
                .map(|i| RoomSeed {
                    building_id,
                    code: format!("{}{:02}", i / 10 + 1, i % 10 + 1),
                    capacity: ROOM_CAPACITIES[i % ROOM_CAPACITIES.len()],
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Draws from `generate` until `count` distinct names are collected, appending a
/// counter once the faker starts repeating itself.
fn unique_names(count: usize, generate: impl Fn() -> String) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    let mut names = Vec::with_capacity(count);
    let mut attempt = 0;

    while names.len() < count {
        let base: String = generate();
        let name = if attempt < count * 3 {
            format!("{SEED_NAME_PREFIX}{base}")
        } else {
            format!("{SEED_NAME_PREFIX}{base} {attempt}")
        };
        attempt += 1;

        if seen.insert(name.to_lowercase()) {
            names.push(name);
        }
    }

    names
}

pub async fn seed_departments(
    db: &PgPool,
    count: usize,
) -> Result<Vec<DepartmentId>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🏫 Seeding {} departments...", count);

    let departments = generate_departments(count);
    let mut tx = db.begin().await?;
    let ids = insert_named(&mut tx, "departments", departments.iter().map(|d| &d.name)).await?;
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} departments in {:?}",
        ids.len(),
        start_time.elapsed()
    );

    Ok(ids.into_iter().map(DepartmentId::from_uuid).collect())
}

pub async fn seed_buildings(
    db: &PgPool,
    count: usize,
) -> Result<Vec<BuildingId>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🏢 Seeding {} buildings...", count);

    let buildings = generate_buildings(count);
    let mut tx = db.begin().await?;
    let ids = insert_named(&mut tx, "buildings", buildings.iter().map(|b| &b.name)).await?;
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} buildings in {:?}",
        ids.len(),
        start_time.elapsed()
    );

    Ok(ids.into_iter().map(BuildingId::from_uuid).collect())
}

/// Names that already exist are skipped rather than failing the run.
async fn insert_named<'a>(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    names: impl Iterator<Item = &'a String>,
) -> Result<Vec<sqlx::types::Uuid>, Box<dyn std::error::Error>> {
    let names: Vec<&String> = names.collect();
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = format!("INSERT INTO {table} (name) VALUES ");
    for i in 0..names.len() {
        if i > 0 {
            query.push_str(", ");
        }
        query.push_str(&format!("(${})", i + 1));
    }
    query.push_str(" ON CONFLICT (name) DO NOTHING RETURNING id");

    let mut q = sqlx::query_scalar(&query);
    for name in names {
        q = q.bind(name);
    }

    Ok(q.fetch_all(&mut **tx).await?)
}

pub async fn seed_rooms(
    db: &PgPool,
    building_ids: &[BuildingId],
    rooms_per_building: usize,
) -> Result<Vec<RoomId>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!(
        "🚪 Seeding {} rooms ({} per building)...",
        building_ids.len() * rooms_per_building,
        rooms_per_building
    );

    let rooms = generate_rooms(building_ids, rooms_per_building);
    let mut tx = db.begin().await?;

    // 3 params per room
    const BATCH_SIZE: usize = 1000;
    let mut all_ids = Vec::with_capacity(rooms.len());
    for chunk in rooms.chunks(BATCH_SIZE) {
        all_ids.extend(insert_rooms_chunk(&mut tx, chunk).await?);
    }

    tx.commit().await?;

    println!(
        "   ✓ Inserted {} rooms in {:?}",
        all_ids.len(),
        start_time.elapsed()
    );

    Ok(all_ids)
}

async fn insert_rooms_chunk(
    tx: &mut Transaction<'_, Postgres>,
    rooms: &[RoomSeed],
) -> Result<Vec<RoomId>, Box<dyn std::error::Error>> {
    if rooms.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = String::from("INSERT INTO rooms (building_id, code, capacity) VALUES ");
    for i in 0..rooms.len() {
        if i > 0 {
            query.push_str(", ");
        }
        let param_idx = i * 3;
        query.push_str(&format!(
            "(${}, ${}, ${})",
            param_idx + 1,
            param_idx + 2,
            param_idx + 3
        ));
    }
    query.push_str(" RETURNING id");

    let mut q = sqlx::query_scalar(&query);
    for room in rooms {
        q = q.bind(room.building_id).bind(&room.code).bind(room.capacity);
    }

    let ids: Vec<RoomId> = q.fetch_all(&mut **tx).await?;
    Ok(ids)
}

/// Removes seeded buildings and their rooms, then seeded departments.
/// Bookings on those rooms must already be gone.
pub async fn clear_organization(
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(u64, u64, u64), Box<dyn std::error::Error>> {
    let pattern = format!("{SEED_NAME_PREFIX}%");

    let rooms = sqlx::query(
        "DELETE FROM rooms WHERE building_id IN (SELECT id FROM buildings WHERE name LIKE $1)",
    )
    .bind(&pattern)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    let buildings = sqlx::query("DELETE FROM buildings WHERE name LIKE $1")
        .bind(&pattern)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    let departments = sqlx::query("DELETE FROM departments WHERE name LIKE $1")
        .bind(&pattern)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    Ok((departments, buildings, rooms))
}
