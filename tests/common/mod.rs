#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use roombook::router::init_router;
use roombook::state::AppState;
use roombook_auth::create_access_token;
use roombook_config::{CorsConfig, EmailConfig, JwtConfig, RateLimitConfig};
use roombook_core::hash_password;
use roombook_models::{BuildingId, DepartmentId, RoomId, UserId, UserRole};

pub const TEST_PASSWORD: &str = "Str0ngPass!";

pub struct TestUser {
    pub id: UserId,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub token: String,
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        ..JwtConfig::default()
    }
}

/// Buckets large enough that no test outside the rate limit suite trips them.
pub fn permissive_rate_limit_config() -> RateLimitConfig {
    RateLimitConfig {
        general_per_second: 1,
        general_burst_size: 10_000,
        auth_per_second: 1,
        auth_burst_size: 10_000,
    }
}

pub fn test_state(pool: PgPool, rate_limit_config: RateLimitConfig) -> AppState {
    AppState {
        db: pool,
        jwt_config: test_jwt_config(),
        email_config: EmailConfig::default(),
        cors_config: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        rate_limit_config,
    }
}

pub fn setup_test_app(pool: PgPool) -> Router {
    init_router(test_state(pool, permissive_rate_limit_config()))
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

pub fn unique_name(prefix: &str) -> String {
    format!("{} {}", prefix, Uuid::new_v4().simple())
}

/// A fixed slot far in the future: `2099-01-01T{start}:00Z` to `{end}:00Z`.
pub fn slot(start_hour: u32, end_hour: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let day = DateTime::parse_from_rfc3339("2099-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    (
        day + Duration::hours(start_hour as i64),
        day + Duration::hours(end_hour as i64),
    )
}

pub async fn create_test_user(
    pool: &PgPool,
    role: UserRole,
    department_id: Option<DepartmentId>,
) -> TestUser {
    let email = generate_unique_email();
    let hashed = hash_password(TEST_PASSWORD).unwrap();

    let id: UserId = sqlx::query_scalar(
        r#"
        INSERT INTO users (email, password_hash, full_name, role, email_confirmed, department_id)
        VALUES ($1, $2, $3, $4, TRUE, $5)
        RETURNING id
        "#,
    )
    .bind(&email)
    .bind(&hashed)
    .bind("Test User")
    .bind(role)
    .bind(department_id)
    .fetch_one(pool)
    .await
    .unwrap();

    let token = create_access_token(id, &email, role, &test_jwt_config()).unwrap();

    TestUser {
        id,
        email,
        password: TEST_PASSWORD.to_string(),
        role,
        token,
    }
}

pub async fn create_test_department(pool: &PgPool) -> DepartmentId {
    sqlx::query_scalar("INSERT INTO departments (name) VALUES ($1) RETURNING id")
        .bind(unique_name("Department"))
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_test_teacher(pool: &PgPool) -> TestUser {
    let department_id = create_test_department(pool).await;
    create_test_user(pool, UserRole::Teacher, Some(department_id)).await
}

pub async fn create_test_building(pool: &PgPool) -> BuildingId {
    sqlx::query_scalar("INSERT INTO buildings (name) VALUES ($1) RETURNING id")
        .bind(unique_name("Building"))
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_test_room(pool: &PgPool, building_id: BuildingId, is_active: bool) -> RoomId {
    sqlx::query_scalar(
        "INSERT INTO rooms (building_id, code, capacity, is_active) VALUES ($1, $2, 30, $3) RETURNING id",
    )
    .bind(building_id)
    .bind(format!("R-{}", &Uuid::new_v4().simple().to_string()[..8]))
    .bind(is_active)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_active_room(pool: &PgPool) -> RoomId {
    let building_id = create_test_building(pool).await;
    create_test_room(pool, building_id, true).await
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "10.0.0.1");

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends the request and parses the JSON body. An empty body reads as
/// `Null`, a non-JSON body (e.g. the rate limiter's) as a string.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, body)
}
