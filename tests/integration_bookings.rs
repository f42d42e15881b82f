mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use sqlx::PgPool;

use common::{
    TestUser, create_active_room, create_test_building, create_test_room, create_test_teacher,
    create_test_user, json_request, send, setup_test_app, slot,
};
use roombook_models::{RoomId, UserRole};

fn booking_body(room_id: RoomId, start_hour: u32, end_hour: u32) -> Value {
    let (starts_at, ends_at) = slot(start_hour, end_hour);
    json!({
        "room_id": room_id,
        "title": "Algebra II revision",
        "starts_at": starts_at,
        "ends_at": ends_at
    })
}

async fn create_booking(
    app: &axum::Router,
    teacher: &TestUser,
    room_id: RoomId,
    start_hour: u32,
    end_hour: u32,
) -> (StatusCode, Value) {
    send(
        app,
        json_request(
            "POST",
            "/api/bookings",
            Some(&teacher.token),
            Some(booking_body(room_id, start_hour, end_hour)),
        ),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_booking_is_pending(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    let (status, body) = create_booking(&app, &teacher, room_id, 10, 11).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["teacher_id"], json!(teacher.id));
    assert_eq!(body["room_id"], json!(room_id));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_overlapping_booking_conflicts(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    let (first, _) = create_booking(&app, &teacher, room_id, 10, 11).await;
    assert_eq!(first, StatusCode::CREATED);

    let (start, end) = slot(10, 11);
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/bookings",
            Some(&teacher.token),
            Some(json!({
                "room_id": room_id,
                "title": "Overlap",
                "starts_at": start + Duration::minutes(30),
                "ends_at": end + Duration::minutes(30)
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already booked"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_touching_bookings_do_not_conflict(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    let (first, _) = create_booking(&app, &teacher, room_id, 10, 11).await;
    let (second, _) = create_booking(&app, &teacher, room_id, 11, 12).await;
    let (before, _) = create_booking(&app, &teacher, room_id, 9, 10).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CREATED);
    assert_eq!(before, StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_same_slot_in_another_room_is_allowed(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let first_room = create_active_room(&pool).await;
    let second_room = create_active_room(&pool).await;

    let (first, _) = create_booking(&app, &teacher, first_room, 10, 11).await;
    let (second, _) = create_booking(&app, &teacher, second_room, 10, 11).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancelled_booking_frees_its_slot(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    let (_, booking) = create_booking(&app, &teacher, room_id, 10, 11).await;
    let id = booking["id"].as_str().unwrap();

    let (cancel, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/bookings/{}/cancel", id),
            Some(&teacher.token),
            None,
        ),
    )
    .await;
    assert_eq!(cancel, StatusCode::OK);

    let (rebook, _) = create_booking(&app, &teacher, room_id, 10, 11).await;
    assert_eq!(rebook, StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_creates_admit_one_booking(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let room_id = create_active_room(&pool).await;

    let mut teachers = Vec::new();
    for _ in 0..6 {
        teachers.push(create_test_teacher(&pool).await);
    }

    let mut handles = Vec::new();
    for teacher in teachers {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            create_booking(&app, &teacher, room_id, 14, 15).await.0
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 5);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE room_id = $1")
        .bind(room_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_booking_validation(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;
    let (start, end) = slot(10, 11);

    let cases = [
        json!({ "room_id": room_id, "title": "   ", "starts_at": start, "ends_at": end }),
        json!({ "room_id": room_id, "title": "x".repeat(201), "starts_at": start, "ends_at": end }),
        json!({ "room_id": room_id, "title": "Backwards", "starts_at": end, "ends_at": start }),
        json!({ "room_id": room_id, "title": "Empty", "starts_at": start, "ends_at": start }),
        json!({
            "room_id": room_id,
            "title": "Past",
            "starts_at": Utc::now() - Duration::hours(2),
            "ends_at": Utc::now() - Duration::hours(1)
        }),
    ];

    for body in cases {
        let (status, _) = send(
            &app,
            json_request("POST", "/api/bookings", Some(&teacher.token), Some(body.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_booking_room_checks(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let building_id = create_test_building(&pool).await;
    let inactive = create_test_room(&pool, building_id, false).await;

    let (missing, _) = create_booking(&app, &teacher, RoomId::new(), 10, 11).await;
    let (inactive_status, _) = create_booking(&app, &teacher, inactive, 10, 11).await;

    assert_eq!(missing, StatusCode::NOT_FOUND);
    assert_eq!(inactive_status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_cannot_book_on_behalf_of_another(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let other = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    let mut body = booking_body(room_id, 10, 11);
    body["teacher_id"] = json!(other.id);

    let (status, booking) = send(
        &app,
        json_request("POST", "/api/bookings", Some(&teacher.token), Some(body)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["teacher_id"], json!(teacher.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_books_for_teacher(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;
    let teacher = create_test_teacher(&pool).await;
    let staff = create_test_user(&pool, UserRole::Staff, None).await;
    let room_id = create_active_room(&pool).await;

    let (without_teacher, _) = send(
        &app,
        json_request(
            "POST",
            "/api/bookings",
            Some(&admin.token),
            Some(booking_body(room_id, 10, 11)),
        ),
    )
    .await;
    assert_eq!(without_teacher, StatusCode::BAD_REQUEST);

    let mut for_staff = booking_body(room_id, 10, 11);
    for_staff["teacher_id"] = json!(staff.id);
    let (staff_target, _) = send(
        &app,
        json_request("POST", "/api/bookings", Some(&admin.token), Some(for_staff)),
    )
    .await;
    assert_eq!(staff_target, StatusCode::BAD_REQUEST);

    let mut for_unknown = booking_body(room_id, 10, 11);
    for_unknown["teacher_id"] = json!(uuid::Uuid::new_v4());
    let (unknown_target, _) = send(
        &app,
        json_request("POST", "/api/bookings", Some(&admin.token), Some(for_unknown)),
    )
    .await;
    assert_eq!(unknown_target, StatusCode::NOT_FOUND);

    let mut for_teacher = booking_body(room_id, 10, 11);
    for_teacher["teacher_id"] = json!(teacher.id);
    let (status, booking) = send(
        &app,
        json_request("POST", "/api/bookings", Some(&admin.token), Some(for_teacher)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["teacher_id"], json!(teacher.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_staff_cannot_create_bookings(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let staff = create_test_user(&pool, UserRole::Staff, None).await;
    let room_id = create_active_room(&pool).await;

    let (status, _) = create_booking(&app, &staff, room_id, 10, 11).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_booking_requires_authentication(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let room_id = create_active_room(&pool).await;

    let (status, _) = send(
        &app,
        json_request("POST", "/api/bookings", None, Some(booking_body(room_id, 10, 11))),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_booking_may_shift_within_own_slot(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    let (_, booking) = create_booking(&app, &teacher, room_id, 10, 12).await;
    let id = booking["id"].as_str().unwrap();

    let mut body = booking_body(room_id, 11, 13);
    body["title"] = json!("Shifted");
    let (status, updated) = send(
        &app,
        json_request("PUT", &format!("/api/bookings/{}", id), Some(&teacher.token), Some(body)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Shifted");
    assert_eq!(updated["status"], "pending");
    assert_eq!(updated["created_at"], booking["created_at"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_booking_conflicts_with_other_booking(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    create_booking(&app, &teacher, room_id, 10, 11).await;
    let (_, second) = create_booking(&app, &teacher, room_id, 12, 13).await;
    let id = second["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/bookings/{}", id),
            Some(&teacher.token),
            Some(booking_body(room_id, 10, 12)),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_cannot_modify_foreign_booking(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let owner = create_test_teacher(&pool).await;
    let intruder = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    let (_, booking) = create_booking(&app, &owner, room_id, 10, 11).await;
    let id = booking["id"].as_str().unwrap();

    let (update, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/bookings/{}", id),
            Some(&intruder.token),
            Some(booking_body(room_id, 12, 13)),
        ),
    )
    .await;
    let (cancel, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/bookings/{}/cancel", id),
            Some(&intruder.token),
            None,
        ),
    )
    .await;
    let (view, _) = send(
        &app,
        json_request("GET", &format!("/api/bookings/{}", id), Some(&intruder.token), None),
    )
    .await;

    assert_eq!(update, StatusCode::FORBIDDEN);
    assert_eq!(cancel, StatusCode::FORBIDDEN);
    assert_eq!(view, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_reassigns_booking(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;
    let owner = create_test_teacher(&pool).await;
    let successor = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    let (_, booking) = create_booking(&app, &owner, room_id, 10, 11).await;
    let id = booking["id"].as_str().unwrap();

    let mut body = booking_body(room_id, 10, 11);
    body["teacher_id"] = json!(successor.id);
    let (status, updated) = send(
        &app,
        json_request("PUT", &format!("/api/bookings/{}", id), Some(&admin.token), Some(body)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["teacher_id"], json!(successor.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_booking_validation(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let building_id = create_test_building(&pool).await;
    let room_id = create_test_room(&pool, building_id, true).await;
    let inactive = create_test_room(&pool, building_id, false).await;

    let (_, booking) = create_booking(&app, &teacher, room_id, 10, 11).await;
    let uri = format!("/api/bookings/{}", booking["id"].as_str().unwrap());
    let (start, end) = slot(10, 11);

    let invalid = [
        json!({ "room_id": room_id, "title": "   ", "starts_at": start, "ends_at": end }),
        json!({ "room_id": room_id, "title": "x".repeat(201), "starts_at": start, "ends_at": end }),
        json!({ "room_id": room_id, "title": "Backwards", "starts_at": end, "ends_at": start }),
        json!({ "room_id": room_id, "title": "Empty", "starts_at": start, "ends_at": start }),
        json!({
            "room_id": room_id,
            "title": "Past",
            "starts_at": Utc::now() - Duration::hours(2),
            "ends_at": Utc::now() - Duration::hours(1)
        }),
        json!({ "room_id": inactive, "title": "Closed room", "starts_at": start, "ends_at": end }),
    ];

    for body in invalid {
        let (status, _) = send(
            &app,
            json_request("PUT", &uri, Some(&teacher.token), Some(body.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    }

    let (missing_room, _) = send(
        &app,
        json_request(
            "PUT",
            &uri,
            Some(&teacher.token),
            Some(booking_body(RoomId::new(), 10, 11)),
        ),
    )
    .await;
    assert_eq!(missing_room, StatusCode::NOT_FOUND);

    // None of the rejected updates touched the stored booking.
    let (_, stored) = send(&app, json_request("GET", &uri, Some(&teacher.token), None)).await;
    assert_eq!(stored["title"], booking["title"]);
    assert_eq!(stored["room_id"], json!(room_id));
    assert_eq!(stored["starts_at"], booking["starts_at"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_booking_into_occupied_room_conflicts(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let other = create_test_teacher(&pool).await;
    let building_id = create_test_building(&pool).await;
    let first = create_test_room(&pool, building_id, true).await;
    let second = create_test_room(&pool, building_id, true).await;

    let (_, booking) = create_booking(&app, &teacher, first, 10, 11).await;
    create_booking(&app, &other, second, 10, 12).await;
    let uri = format!("/api/bookings/{}", booking["id"].as_str().unwrap());

    let (occupied, _) = send(
        &app,
        json_request("PUT", &uri, Some(&teacher.token), Some(booking_body(second, 11, 12))),
    )
    .await;
    let (free, moved) = send(
        &app,
        json_request("PUT", &uri, Some(&teacher.token), Some(booking_body(second, 12, 13))),
    )
    .await;

    assert_eq!(occupied, StatusCode::CONFLICT);
    assert_eq!(free, StatusCode::OK);
    assert_eq!(moved["room_id"], json!(second));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_reassignment_targets_are_checked(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;
    let owner = create_test_teacher(&pool).await;
    let staff = create_test_user(&pool, UserRole::Staff, None).await;
    let room_id = create_active_room(&pool).await;

    let (_, booking) = create_booking(&app, &owner, room_id, 10, 11).await;
    let uri = format!("/api/bookings/{}", booking["id"].as_str().unwrap());

    let mut to_staff = booking_body(room_id, 10, 11);
    to_staff["teacher_id"] = json!(staff.id);
    let (staff_target, _) = send(
        &app,
        json_request("PUT", &uri, Some(&admin.token), Some(to_staff)),
    )
    .await;

    let mut to_unknown = booking_body(room_id, 10, 11);
    to_unknown["teacher_id"] = json!(uuid::Uuid::new_v4());
    let (unknown_target, _) = send(
        &app,
        json_request("PUT", &uri, Some(&admin.token), Some(to_unknown)),
    )
    .await;

    assert_eq!(staff_target, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_target, StatusCode::NOT_FOUND);

    let (_, stored) = send(&app, json_request("GET", &uri, Some(&admin.token), None)).await;
    assert_eq!(stored["teacher_id"], json!(owner.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deleted_teacher_with_live_token_cannot_book(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(teacher.id)
        .execute(&pool)
        .await
        .unwrap();

    let (status, body) = create_booking(&app, &teacher, room_id, 10, 11).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Teacher not found");

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_bookings_with_huge_offset(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;
    create_booking(&app, &teacher, room_id, 10, 11).await;

    let (status, body) = send(
        &app,
        json_request(
            "GET",
            &format!("/api/bookings?offset={}", i64::MAX),
            Some(&teacher.token),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["meta"]["has_more"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancel_twice_reports_terminal_state(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    let (_, booking) = create_booking(&app, &teacher, room_id, 10, 11).await;
    let uri = format!("/api/bookings/{}/cancel", booking["id"].as_str().unwrap());

    let (first, cancelled) = send(&app, json_request("POST", &uri, Some(&teacher.token), None)).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (second, body) = send(&app, json_request("POST", &uri, Some(&teacher.token), None)).await;
    assert_eq!(second, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("cancelled"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancelled_booking_is_immutable(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let teacher = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    let (_, booking) = create_booking(&app, &teacher, room_id, 10, 11).await;
    let id = booking["id"].as_str().unwrap();
    send(
        &app,
        json_request("POST", &format!("/api/bookings/{}/cancel", id), Some(&teacher.token), None),
    )
    .await;

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/bookings/{}", id),
            Some(&teacher.token),
            Some(booking_body(room_id, 12, 13)),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_approve_and_reject_follow_state_machine(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;
    let teacher = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    let (_, first) = create_booking(&app, &teacher, room_id, 10, 11).await;
    let (_, second) = create_booking(&app, &teacher, room_id, 12, 13).await;
    let first_id = first["id"].as_str().unwrap();
    let second_id = second["id"].as_str().unwrap();

    let (teacher_attempt, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/bookings/{}/approve", first_id),
            Some(&teacher.token),
            None,
        ),
    )
    .await;
    assert_eq!(teacher_attempt, StatusCode::FORBIDDEN);

    let (approved, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/bookings/{}/approve", first_id),
            Some(&admin.token),
            None,
        ),
    )
    .await;
    assert_eq!(approved, StatusCode::OK);
    assert_eq!(body["status"], "approved");

    let (reject_approved, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/bookings/{}/reject", first_id),
            Some(&admin.token),
            None,
        ),
    )
    .await;
    assert_eq!(reject_approved, StatusCode::CONFLICT);

    let (rejected, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/bookings/{}/reject", second_id),
            Some(&admin.token),
            None,
        ),
    )
    .await;
    assert_eq!(rejected, StatusCode::OK);
    assert_eq!(body["status"], "rejected");

    let (cancel_approved, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/bookings/{}/cancel", first_id),
            Some(&teacher.token),
            None,
        ),
    )
    .await;
    assert_eq!(cancel_approved, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (approve_cancelled, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/bookings/{}/approve", first_id),
            Some(&admin.token),
            None,
        ),
    )
    .await;
    assert_eq!(approve_cancelled, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_bookings_scopes_teachers(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;
    let staff = create_test_user(&pool, UserRole::Staff, None).await;
    let alice = create_test_teacher(&pool).await;
    let bob = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    create_booking(&app, &alice, room_id, 8, 9).await;
    create_booking(&app, &alice, room_id, 9, 10).await;
    create_booking(&app, &bob, room_id, 10, 11).await;

    let (_, own) = send(&app, json_request("GET", "/api/bookings", Some(&alice.token), None)).await;
    assert_eq!(own["meta"]["total"], 2);
    assert!(
        own["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|b| b["teacher_id"] == json!(alice.id))
    );

    let (_, snooping) = send(
        &app,
        json_request(
            "GET",
            &format!("/api/bookings?teacher_id={}", bob.id),
            Some(&alice.token),
            None,
        ),
    )
    .await;
    assert_eq!(snooping["meta"]["total"], 2);

    let (_, everything) = send(&app, json_request("GET", "/api/bookings", Some(&staff.token), None)).await;
    assert_eq!(everything["meta"]["total"], 3);

    let (_, for_bob) = send(
        &app,
        json_request(
            "GET",
            &format!("/api/bookings?teacher_id={}", bob.id),
            Some(&admin.token),
            None,
        ),
    )
    .await;
    assert_eq!(for_bob["meta"]["total"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_bookings_filters_and_orders(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;
    let teacher = create_test_teacher(&pool).await;
    let room_id = create_active_room(&pool).await;

    create_booking(&app, &teacher, room_id, 12, 13).await;
    let (_, early) = create_booking(&app, &teacher, room_id, 8, 9).await;
    create_booking(&app, &teacher, room_id, 10, 11).await;

    send(
        &app,
        json_request(
            "POST",
            &format!("/api/bookings/{}/cancel", early["id"].as_str().unwrap()),
            Some(&teacher.token),
            None,
        ),
    )
    .await;

    let (status, all) = send(
        &app,
        json_request(
            "GET",
            &format!("/api/bookings?room_id={}", room_id),
            Some(&admin.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let starts: Vec<&str> = all["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["starts_at"].as_str().unwrap())
        .collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);

    let (_, pending) = send(
        &app,
        json_request("GET", "/api/bookings?status=pending", Some(&admin.token), None),
    )
    .await;
    assert_eq!(pending["meta"]["total"], 2);

    let (from, to) = slot(9, 11);
    let (_, window) = send(
        &app,
        json_request(
            "GET",
            &format!(
                "/api/bookings?from={}&to={}",
                urlencode(&from.to_rfc3339()),
                urlencode(&to.to_rfc3339())
            ),
            Some(&admin.token),
            None,
        ),
    )
    .await;
    assert_eq!(window["meta"]["total"], 1);

    let (_, page) = send(
        &app,
        json_request("GET", "/api/bookings?limit=1&page=2", Some(&admin.token), None),
    )
    .await;
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["meta"]["has_more"], true);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_bookings_rejects_bad_filters(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;

    let (status, _) = send(
        &app,
        json_request("GET", "/api/bookings?status=done", Some(&admin.token), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_missing_booking(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;

    let (status, _) = send(
        &app,
        json_request(
            "GET",
            &format!("/api/bookings/{}", uuid::Uuid::new_v4()),
            Some(&admin.token),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn urlencode(value: &str) -> String {
    value.replace('+', "%2B").replace(':', "%3A")
}
