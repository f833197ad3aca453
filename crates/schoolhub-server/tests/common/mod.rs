// Shared test utilities for integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use schoolhub_db::entities::user::{self, UserRole};
use schoolhub_db::sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use schoolhub_db::{AppState, DatabaseConfig};
use schoolhub_migration::{Migrator, MigratorTrait};
use schoolhub_server::auth::jwt::{generate_token_pair, TokenSubject};
use serde_json::Value;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-testing-only";

pub const ADMIN_CIVIL_ID: &str = "279120905555";
pub const TEACHER_CIVIL_ID: &str = "285031201234";

/// The reverse proxy every test request arrives through by default.
pub const PROXY_ADDR: [u8; 4] = [10, 0, 0, 1];

/// Migrated in-memory database with one admin and one teacher.
pub async fn test_app_state() -> Arc<AppState> {
    let db = schoolhub_db::connect(&DatabaseConfig::in_memory())
        .await
        .unwrap();
    Migrator::up(&db, None).await.unwrap();

    insert_user(&db, ADMIN_CIVIL_ID, "Yousef Admin", UserRole::Admin, Some("Deputy Principal")).await;
    insert_user(&db, TEACHER_CIVIL_ID, "Mariam Al-Sabah", UserRole::Teacher, Some("Teacher")).await;

    state_with(db)
}

/// State over a database with no tables at all.
pub async fn broken_app_state() -> Arc<AppState> {
    let db = schoolhub_db::connect(&DatabaseConfig::in_memory())
        .await
        .unwrap();
    state_with(db)
}

fn state_with(db: DatabaseConnection) -> Arc<AppState> {
    Arc::new(AppState {
        db,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        audit_page_size: 50,
        trusted_proxies: vec![IpAddr::from(PROXY_ADDR)],
    })
}

async fn insert_user(
    db: &DatabaseConnection,
    civil_id: &str,
    name: &str,
    role: UserRole,
    job_title: Option<&str>,
) {
    user::ActiveModel {
        civil_id: Set(civil_id.to_string()),
        name: Set(name.to_string()),
        role: Set(role),
        subject: Set(None),
        job_title: Set(job_title.map(str::to_string)),
        created_at: Set(chrono::Utc::now().fixed_offset()),
    }
    .insert(db)
    .await
    .unwrap();
}

pub fn token_for(civil_id: &str, name: &str, role: &str) -> String {
    generate_token_pair(&subject_for(civil_id, name, role), TEST_JWT_SECRET)
        .unwrap()
        .access_token
}

pub fn refresh_token_for(civil_id: &str, name: &str, role: &str) -> String {
    generate_token_pair(&subject_for(civil_id, name, role), TEST_JWT_SECRET)
        .unwrap()
        .refresh_token
}

fn subject_for(civil_id: &str, name: &str, role: &str) -> TokenSubject {
    TokenSubject {
        civil_id: civil_id.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        subject: None,
        job_title: Some("Deputy Principal".to_string()),
    }
}

pub fn admin_token() -> String {
    token_for(ADMIN_CIVIL_ID, "Yousef Admin", "admin")
}

/// Send one request through a fresh router, via the trusted proxy, and
/// decode the JSON reply.
pub async fn send(
    state: &Arc<AppState>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_from(
        state,
        PROXY_ADDR,
        "203.0.113.7, 10.0.0.1",
        method,
        uri,
        token,
        body,
    )
    .await
}

/// Like `send`, but from socket peer `peer` carrying `forwarded_for`.
pub async fn send_from(
    state: &Arc<AppState>,
    peer: [u8; 4],
    forwarded_for: &str,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Forwarded-For", forwarded_for)
        .header("User-Agent", "schoolhub-tests");
    if let Some(token) = token {
        req = req.header("Authorization", format!("Bearer {token}"));
    }
    let mut req = match body {
        Some(json) => req
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 44321))));

    let app: Router = schoolhub_server::router(state.clone());
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
