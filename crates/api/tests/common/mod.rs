#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use panorama_api::auth::jwt::{generate_access_token, JwtConfig};
use panorama_api::config::ServerConfig;
use panorama_api::router::build_app_router;
use panorama_api::state::AppState;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

const TEST_JWT_SECRET: &str = "panorama-test-secret-that-is-long-enough";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["https://dashboards.example".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// The production router and middleware stack over the given pool.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_router(AppState {
        pool,
        config: Arc::new(test_config()),
    })
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// A seeded user and a valid access token for them.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub token: String,
}

pub async fn create_user(pool: &PgPool, username: &str, role: &str) -> TestUser {
    let id: i64 =
        sqlx::query_scalar("INSERT INTO users (username, role) VALUES ($1, $2) RETURNING id")
            .bind(username)
            .bind(role)
            .fetch_one(pool)
            .await
            .unwrap();
    let token = generate_access_token(id, role, &test_config().jwt).unwrap();
    TestUser { id, token }
}

// ---------------------------------------------------------------------------
// Monitoring fixtures
// ---------------------------------------------------------------------------

/// Host group 1 ("Linux servers") holding host 10084 and template 10001.
///
/// - host 10084: item 500, graph 600
/// - template 10001: item 501, item prototype 502, graph 601
/// - host group 2 with host 20000 (item 900), never granted to anyone
/// - public map 700
///
/// Every user in `members` joins user group 1, which gets `permission` on
/// host group 1.
pub async fn seed_monitoring(pool: &PgPool, members: &[&TestUser], permission: i16) {
    let statements = [
        "INSERT INTO host_groups (id, name) VALUES (1, 'Linux servers'), (2, 'Restricted')",
        "INSERT INTO hosts (id, name, status) VALUES \
         (10084, 'db01', 0), (10001, 'Template OS Linux', 3), (20000, 'vault', 0)",
        "INSERT INTO hosts_groups (host_id, group_id) VALUES (10084, 1), (10001, 1), (20000, 2)",
        "INSERT INTO items (id, host_id, name, flags) VALUES \
         (500, 10084, 'CPU load', 0), (501, 10001, 'CPU load', 0), \
         (502, 10001, 'Free space on {#FSNAME}', 2), (900, 20000, 'Secrets', 0)",
        "INSERT INTO graphs (id, host_id, name, flags) VALUES \
         (600, 10084, 'CPU', 0), (601, 10001, 'CPU', 0)",
        "INSERT INTO sysmaps (id, name, user_id, private) VALUES (700, 'Overview', NULL, FALSE)",
        "INSERT INTO user_groups (id, name) VALUES (1, 'Operators')",
    ];
    for sql in statements {
        sqlx::query(sql).execute(pool).await.unwrap();
    }
    for member in members {
        sqlx::query("INSERT INTO users_groups (user_id, usrgrp_id) VALUES ($1, 1)")
            .bind(member.id)
            .execute(pool)
            .await
            .unwrap();
    }
    sqlx::query("INSERT INTO rights (usrgrp_id, group_id, permission) VALUES (1, 1, $1)")
        .bind(permission)
        .execute(pool)
        .await
        .unwrap();
}

/// Number of rows in `table`.
pub async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(json).unwrap())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// Unauthenticated GET.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: &Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(app: Router, uri: &str, token: &str, body: &Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
