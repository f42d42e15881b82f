mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use common::{
    create_test_building, create_test_department, create_test_room, create_test_user,
    json_request, send, setup_test_app, unique_name,
};
use roombook_models::UserRole;

#[sqlx::test(migrations = "./migrations")]
async fn test_department_crud(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;
    let name = unique_name("Mathematics");

    let (created, body) = send(
        &app,
        json_request(
            "POST",
            "/api/departments",
            Some(&admin.token),
            Some(json!({ "name": format!("  {}  ", name) })),
        ),
    )
    .await;
    assert_eq!(created, StatusCode::CREATED);
    assert_eq!(body["name"], name.as_str());
    let id = body["id"].as_str().unwrap().to_string();

    let renamed = unique_name("Applied Mathematics");
    let (updated, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/departments/{}", id),
            Some(&admin.token),
            Some(json!({ "name": renamed })),
        ),
    )
    .await;
    assert_eq!(updated, StatusCode::OK);
    assert_eq!(body["name"], renamed.as_str());

    let (fetched, body) = send(
        &app,
        json_request("GET", &format!("/api/departments/{}", id), Some(&admin.token), None),
    )
    .await;
    assert_eq!(fetched, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());

    let (deleted, _) = send(
        &app,
        json_request("DELETE", &format!("/api/departments/{}", id), Some(&admin.token), None),
    )
    .await;
    assert_eq!(deleted, StatusCode::NO_CONTENT);

    let (gone, _) = send(
        &app,
        json_request("GET", &format!("/api/departments/{}", id), Some(&admin.token), None),
    )
    .await;
    assert_eq!(gone, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_department_name_is_unique(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;
    let name = unique_name("Physics");

    let request = || {
        json_request(
            "POST",
            "/api/departments",
            Some(&admin.token),
            Some(json!({ "name": name })),
        )
    };

    let (first, _) = send(&app, request()).await;
    let (second, _) = send(&app, request()).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_department_delete_detaches_users(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;
    let department_id = create_test_department(&pool).await;
    let teacher = create_test_user(&pool, UserRole::Teacher, Some(department_id)).await;

    let (status, _) = send(
        &app,
        json_request(
            "DELETE",
            &format!("/api/departments/{}", department_id),
            Some(&admin.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let department: Option<uuid::Uuid> =
        sqlx::query_scalar("SELECT department_id FROM users WHERE id = $1")
            .bind(teacher.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(department.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_departments_readable_but_not_writable_by_staff(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let staff = create_test_user(&pool, UserRole::Staff, None).await;
    create_test_department(&pool).await;

    let (list, body) = send(&app, json_request("GET", "/api/departments", Some(&staff.token), None)).await;
    assert_eq!(list, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);

    let (create, _) = send(
        &app,
        json_request(
            "POST",
            "/api/departments",
            Some(&staff.token),
            Some(json!({ "name": "History" })),
        ),
    )
    .await;
    assert_eq!(create, StatusCode::FORBIDDEN);

    let (anonymous, _) = send(&app, json_request("GET", "/api/departments", None, None)).await;
    assert_eq!(anonymous, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_departments_search_by_name(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;

    for name in ["Chemistry", "Biochemistry", "Music"] {
        send(
            &app,
            json_request(
                "POST",
                "/api/departments",
                Some(&admin.token),
                Some(json!({ "name": name })),
            ),
        )
        .await;
    }

    let (_, body) = send(
        &app,
        json_request("GET", "/api/departments?name=chem", Some(&admin.token), None),
    )
    .await;

    assert_eq!(body["meta"]["total"], 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_building_crud(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;
    let name = unique_name("Science Block");

    let (created, body) = send(
        &app,
        json_request(
            "POST",
            "/api/buildings",
            Some(&admin.token),
            Some(json!({ "name": name })),
        ),
    )
    .await;
    assert_eq!(created, StatusCode::CREATED);
    let id = body["id"].as_str().unwrap().to_string();

    let (list, body) = send(&app, json_request("GET", "/api/buildings", Some(&admin.token), None)).await;
    assert_eq!(list, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);

    let (updated, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/buildings/{}", id),
            Some(&admin.token),
            Some(json!({ "name": "Arts Block" })),
        ),
    )
    .await;
    assert_eq!(updated, StatusCode::OK);
    assert_eq!(body["name"], "Arts Block");

    let (deleted, _) = send(
        &app,
        json_request("DELETE", &format!("/api/buildings/{}", id), Some(&admin.token), None),
    )
    .await;
    assert_eq!(deleted, StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_building_delete_restricted_by_rooms(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;
    let building_id = create_test_building(&pool).await;
    create_test_room(&pool, building_id, true).await;

    let (status, body) = send(
        &app,
        json_request(
            "DELETE",
            &format!("/api/buildings/{}", building_id),
            Some(&admin.token),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("1 room"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_building_name_validation(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_test_user(&pool, UserRole::Admin, None).await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/buildings",
            Some(&admin.token),
            Some(json!({ "name": "" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
