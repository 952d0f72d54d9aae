//! Integration tests for login, logout, and auth status.

mod common;

use common::{auth_enabled_config, TestHarness};
use serde_json::{json, Value};
use torget_core::config::Config;

fn single_user_config() -> Config {
    let mut config = auth_enabled_config();
    config.auth.username = Some("admin".into());
    config.auth.password_hash = Some("hunter2".into());
    config
}

#[tokio::test]
async fn login_with_auth_disabled_is_a_noop() {
    let (_h, addr) = TestHarness::with_server().await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/auth/login"))
        .json(&json!({"username": "anyone", "password": "anything"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn status_reflects_disabled_auth() {
    let (_h, addr) = TestHarness::with_server().await;

    let body: Value = reqwest::get(format!("http://{addr}/auth/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["auth_enabled"], false);
    assert_eq!(body["authenticated"], true);
}

#[tokio::test]
async fn login_issues_usable_token() {
    let (_h, addr) = TestHarness::with_server_config(single_user_config()).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/auth/login"))
        .json(&json!({"username": "admin", "password": "hunter2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    // The token works on a protected route.
    let form = reqwest::multipart::Form::new()
        .text("title", "Rug")
        .text("description", "")
        .text("price", "15.00");
    let resp = client
        .post(format!("http://{addr}/listings"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn login_upgrades_legacy_password_hash() {
    let (h, addr) = TestHarness::with_server_config(single_user_config()).await;
    // Pre-existing user row with a non-bcrypt placeholder hash.
    h.create_user("admin");

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/auth/login"))
        .json(&json!({"username": "admin", "password": "hunter2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // The stored hash was rewritten as bcrypt.
    let conn = h.conn();
    let stored: String = conn
        .query_row(
            "SELECT password_hash FROM users WHERE username = 'admin'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(stored.starts_with("$2"), "expected bcrypt hash, got {stored}");
    drop(conn);

    // Later logins verify against the upgraded hash.
    let resp = client
        .post(format!("http://{addr}/auth/login"))
        .json(&json!({"username": "admin", "password": "hunter2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("http://{addr}/auth/login"))
        .json(&json!({"username": "admin", "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let (_h, addr) = TestHarness::with_server_config(single_user_config()).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/auth/login"))
        .json(&json!({"username": "admin", "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn logout_invalidates_token() {
    let (h, addr) = TestHarness::with_server_config(auth_enabled_config()).await;
    let (_user, token) = h.user_with_token("carol");

    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // The token no longer opens protected routes.
    let form = reqwest::multipart::Form::new()
        .text("title", "Rug")
        .text("description", "")
        .text("price", "15.00");
    let resp = client
        .post(format!("http://{addr}/listings"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn status_resolves_token_to_user() {
    let (h, addr) = TestHarness::with_server_config(auth_enabled_config()).await;
    let (user_id, token) = h.user_with_token("dave");

    let client = reqwest::Client::new();
    let body: Value = client
        .get(format!("http://{addr}/auth/status"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["auth_enabled"], true);
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user_id"], user_id.to_string());
    assert_eq!(body["username"], "dave");
}

#[tokio::test]
async fn api_key_opens_protected_routes() {
    let mut config = auth_enabled_config();
    config.auth.api_key = Some("super-secret".into());
    let (_h, addr) = TestHarness::with_server_config(config).await;

    let client = reqwest::Client::new();
    let form = reqwest::multipart::Form::new()
        .text("title", "Kettle")
        .text("description", "")
        .text("price", "5.00");
    let resp = client
        .post(format!("http://{addr}/listings"))
        .bearer_auth("super-secret")
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
