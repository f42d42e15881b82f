//! Teacher and staff seeding.

use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;

use roombook_models::{DepartmentId, UserId, UserRole};

use super::models::{SEED_EMAIL_DOMAIN, UserSeed};

/// Generates `per_department` teachers for each department.
pub fn generate_teachers(
    department_ids: &[DepartmentId],
    per_department: usize,
    password_hash: &str,
) -> Vec<UserSeed> {
    department_ids
        .par_iter()
        .enumerate()
        .flat_map(|(dept_idx, &department_id)| {
            (0..per_department)
                .map(|user_idx| {
                    generate_user(
                        UserRole::Teacher,
                        Some(department_id),
                        dept_idx * 1000 + user_idx,
                        password_hash,
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Staff have no department.
pub fn generate_staff(count: usize, password_hash: &str) -> Vec<UserSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| generate_user(UserRole::Staff, None, idx, password_hash))
        .collect()
}

fn generate_user(
    role: UserRole,
    department_id: Option<DepartmentId>,
    idx: usize,
    password_hash: &str,
) -> UserSeed {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();

    // The index suffix keeps emails unique within a run.
    let email = format!(
        "{}.{}+{}{}{}",
        first_name.to_lowercase(),
        last_name.to_lowercase(),
        role.as_str(),
        idx,
        SEED_EMAIL_DOMAIN
    );

    UserSeed {
        full_name: format!("{first_name} {last_name}"),
        email,
        password_hash: password_hash.to_string(),
        role,
        department_id,
    }
}

pub async fn seed_users(
    db: &PgPool,
    department_ids: &[DepartmentId],
    teachers_per_department: usize,
    staff: usize,
    password_hash: &str,
) -> Result<Vec<UserId>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    let total = department_ids.len() * teachers_per_department + staff;
    println!(
        "👥 Seeding {} users ({} teachers per department, {} staff)...",
        total, teachers_per_department, staff
    );

    let mut users = generate_teachers(department_ids, teachers_per_department, password_hash);
    users.extend(generate_staff(staff, password_hash));

    let ids = insert_users_batch(db, &users).await?;

    println!(
        "   ✓ Inserted {} users in {:?}",
        ids.len(),
        start_time.elapsed()
    );

    Ok(ids)
}

pub async fn insert_users_batch(
    db: &PgPool,
    users: &[UserSeed],
) -> Result<Vec<UserId>, Box<dyn std::error::Error>> {
    let mut tx = db.begin().await?;

    // 5 params per user
    const BATCH_SIZE: usize = 1000;

    let mut all_ids = Vec::with_capacity(users.len());
    for chunk in users.chunks(BATCH_SIZE) {
        all_ids.extend(insert_users_chunk(&mut tx, chunk).await?);
    }

    tx.commit().await?;
    Ok(all_ids)
}

async fn insert_users_chunk(
    tx: &mut Transaction<'_, Postgres>,
    users: &[UserSeed],
) -> Result<Vec<UserId>, Box<dyn std::error::Error>> {
    if users.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = String::from(
        "INSERT INTO users (full_name, email, password_hash, role, department_id, email_confirmed) VALUES ",
    );

    for i in 0..users.len() {
        if i > 0 {
            query.push_str(", ");
        }
        let param_idx = i * 5;
        query.push_str(&format!(
            "(${}, ${}, ${}, ${}, ${}, TRUE)",
            param_idx + 1,
            param_idx + 2,
            param_idx + 3,
            param_idx + 4,
            param_idx + 5
        ));
    }

    query.push_str(" ON CONFLICT ((LOWER(email))) DO NOTHING RETURNING id");

    let mut q = sqlx::query_scalar(&query);
    for user in users {
        q = q
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.department_id);
    }

    let ids: Vec<UserId> = q.fetch_all(&mut **tx).await?;
    Ok(ids)
}

/// Deletes seeded users and every booking they own. Admins are kept.
pub async fn clear_users(
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(u64, u64), Box<dyn std::error::Error>> {
    let pattern = format!("%{SEED_EMAIL_DOMAIN}");

    let bookings = sqlx::query(
        "DELETE FROM bookings
         WHERE teacher_id IN (SELECT id FROM users WHERE email LIKE $1 AND role <> $2)",
    )
    .bind(&pattern)
    .bind(UserRole::Admin)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    let users = sqlx::query("DELETE FROM users WHERE email LIKE $1 AND role <> $2")
        .bind(&pattern)
        .bind(UserRole::Admin)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    Ok((users, bookings))
}
