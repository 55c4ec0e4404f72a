//! Auth API Tests
//!
//! Integration tests for registration, login, logout and the current user,
//! running the router against in-memory stores.

use async_trait::async_trait;
use auth::{AppState, create_router};
use axum::http::{StatusCode, header::AUTHORIZATION};
use axum_test::TestServer;
use base64::{Engine, engine::general_purpose::STANDARD};
use common::{
    cache::{Cache, MemoryCache},
    models::WelcomeJob,
    queue::{JobQueue, MemoryQueue},
    repositories::{MemoryUserRepository, UserRepository},
    session::{SessionConfig, SessionStore, TOKEN_HEADER},
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

struct TestContext {
    server: TestServer,
    users: MemoryUserRepository,
    welcome_queue: MemoryQueue<WelcomeJob>,
}

/// Create a test server with in-memory backends.
fn create_test_server() -> TestContext {
    let users = MemoryUserRepository::new();
    let welcome_queue = MemoryQueue::<WelcomeJob>::new();

    let state = AppState {
        user_repository: Arc::new(users.clone()),
        sessions: SessionStore::new(Arc::new(MemoryCache::new()), &SessionConfig::default()),
        welcome_queue: Arc::new(welcome_queue.clone()),
    };

    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    TestContext {
        server,
        users,
        welcome_queue,
    }
}

fn basic(email: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", email, password)))
}

/// Register a user and log them in, returning the token.
async fn register_and_connect(server: &TestServer, email: &str, password: &str) -> String {
    server
        .post("/users")
        .json(&json!({ "email": email, "password": password }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .get("/connect")
        .add_header(AUTHORIZATION, basic(email, password))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["token"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_register_creates_user_and_queues_welcome() {
    let ctx = create_test_server();

    let response = ctx
        .server
        .post("/users")
        .json(&json!({ "email": "alice@example.com", "password": "pw" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("password").is_none());
    assert!(body.get("passwordDigest").is_none());

    let user = ctx
        .users
        .find_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(body["id"], user.id.to_string());
    assert_ne!(user.password_digest, "pw");

    let job = ctx
        .welcome_queue
        .dequeue(Duration::from_millis(10))
        .await
        .unwrap();
    assert_eq!(job, Some(WelcomeJob { user_id: user.id }));
}

#[tokio::test]
async fn test_register_validation_errors() {
    let ctx = create_test_server();

    let cases = [
        (json!({ "password": "pw" }), "Missing email"),
        (json!({ "email": "", "password": "pw" }), "Missing email"),
        (json!({ "email": "bob@example.com" }), "Missing password"),
        (json!({ "email": "not-an-email", "password": "pw" }), "Invalid email"),
    ];

    for (payload, message) in cases {
        let response = ctx.server.post("/users").json(&payload).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": message }));
    }

    assert_eq!(ctx.users.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let ctx = create_test_server();
    let payload = json!({ "email": "alice@example.com", "password": "pw" });

    ctx.server
        .post("/users")
        .json(&payload)
        .await
        .assert_status(StatusCode::CREATED);

    let response = ctx.server.post("/users").json(&payload).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Already exist" }));
    assert_eq!(ctx.users.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_connect_rejects_bad_credentials() {
    let ctx = create_test_server();
    register_and_connect(&ctx.server, "alice@example.com", "pw").await;

    let wrong_password = ctx
        .server
        .get("/connect")
        .add_header(AUTHORIZATION, basic("alice@example.com", "nope"))
        .await;
    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    wrong_password.assert_json(&json!({ "error": "Unauthorized" }));

    let unknown_user = ctx
        .server
        .get("/connect")
        .add_header(AUTHORIZATION, basic("nobody@example.com", "pw"))
        .await;
    unknown_user.assert_status(StatusCode::UNAUTHORIZED);
    unknown_user.assert_json(&json!({ "error": "Unauthorized" }));

    ctx.server
        .get("/connect")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    ctx.server
        .get("/connect")
        .add_header(AUTHORIZATION, "Basic !!!not-base64!!!".to_string())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_each_connect_issues_a_new_token() {
    let ctx = create_test_server();
    let first = register_and_connect(&ctx.server, "alice@example.com", "pw").await;

    let response = ctx
        .server
        .get("/connect")
        .add_header(AUTHORIZATION, basic("alice@example.com", "pw"))
        .await;
    response.assert_status_ok();
    let second = response.json::<Value>()["token"].as_str().unwrap().to_string();

    assert_ne!(first, second);
}

#[tokio::test]
async fn test_me_then_disconnect() {
    let ctx = create_test_server();
    let token = register_and_connect(&ctx.server, "alice@example.com", "pw").await;

    let me = ctx
        .server
        .get("/users/me")
        .add_header(TOKEN_HEADER, token.clone())
        .await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["email"], "alice@example.com");

    ctx.server
        .get("/disconnect")
        .add_header(TOKEN_HEADER, token.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    // The token is gone for good
    ctx.server
        .get("/users/me")
        .add_header(TOKEN_HEADER, token.clone())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    ctx.server
        .get("/disconnect")
        .add_header(TOKEN_HEADER, token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = create_test_server();

    let response = ctx.server.get("/users/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    response.assert_json(&json!({ "error": "Unauthorized" }));

    ctx.server
        .get("/disconnect")
        .add_header(TOKEN_HEADER, "never-issued".to_string())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let ctx = create_test_server();
    let response = ctx.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");
}

/// Cache whose every call fails, as when Redis is down
struct UnreachableCache;

#[async_trait]
impl Cache for UnreachableCache {
    async fn set(&self, _: &str, _: &str, _: Option<u64>) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }

    async fn get(&self, _: &str) -> anyhow::Result<Option<String>> {
        anyhow::bail!("connection refused")
    }

    async fn delete(&self, _: &str) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }

    async fn health_check(&self) -> anyhow::Result<bool> {
        anyhow::bail!("connection refused")
    }
}

struct ClosedQueue;

#[async_trait]
impl JobQueue<WelcomeJob> for ClosedQueue {
    async fn enqueue(&self, _: &WelcomeJob) -> anyhow::Result<()> {
        anyhow::bail!("queue unavailable")
    }

    async fn dequeue(&self, _: Duration) -> anyhow::Result<Option<WelcomeJob>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_unreachable_cache_is_a_server_error() {
    let state = AppState {
        user_repository: Arc::new(MemoryUserRepository::new()),
        sessions: SessionStore::new(Arc::new(UnreachableCache), &SessionConfig::default()),
        welcome_queue: Arc::new(MemoryQueue::<WelcomeJob>::new()),
    };
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    for path in ["/users/me", "/disconnect"] {
        server
            .get(path)
            .add_header(TOKEN_HEADER, "some-token".to_string())
            .await
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    server
        .post("/users")
        .json(&json!({ "email": "alice@example.com", "password": "pw" }))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .get("/connect")
        .add_header(AUTHORIZATION, basic("alice@example.com", "pw"))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_register_succeeds_when_welcome_cannot_be_queued() {
    let users = MemoryUserRepository::new();
    let state = AppState {
        user_repository: Arc::new(users.clone()),
        sessions: SessionStore::new(Arc::new(MemoryCache::new()), &SessionConfig::default()),
        welcome_queue: Arc::new(ClosedQueue),
    };
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");
    let payload = json!({ "email": "alice@example.com", "password": "pw" });

    let response = server.post("/users").json(&payload).await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["email"], "alice@example.com");
    assert_eq!(users.count().await.unwrap(), 1);

    // The account is usable right away
    server
        .get("/connect")
        .add_header(AUTHORIZATION, basic("alice@example.com", "pw"))
        .await
        .assert_status_ok();
}
