use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use authkeep::api::AppState;
use authkeep::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

/// RFC 6238 test secret (ASCII "12345678901234567890" in base32).
const TEST_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.token_secret_path = String::new();

    let state = authkeep::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    let app = authkeep::api::router(state.clone()).await;
    (app, state)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, body)
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed for {username}");
    body["data"]["token"].as_str().unwrap().to_string()
}

/// Create a regular user via the bootstrap admin and return their token.
async fn create_user_and_login(app: &Router, username: &str) -> String {
    let admin_token = login(app, "admin", "admin").await;
    let password = format!("{username}-password");
    let (status, _) = request(
        app,
        "POST",
        "/api/users",
        Some(&admin_token),
        Some(json!({
            "username": username,
            "password": password,
            "user_type": "user"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    login(app, username, &password).await
}

#[tokio::test]
async fn add_and_list_secrets_with_fresh_codes() {
    let (app, _) = spawn_app().await;
    let token = create_user_and_login(&app, "bob").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/totp",
        Some(&token),
        Some(json!({"label": "github", "secret": TEST_SECRET})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["label"], "github");
    assert_eq!(body["data"]["is_default"], false);

    let (status, body) = request(&app, "GET", "/api/totp", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);

    // Codes are derived at response time and never include the secret.
    let code = entries[0]["code"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
    assert!(entries[0].get("secret").is_none());
}

#[tokio::test]
async fn add_rejects_bad_input() {
    let (app, _) = spawn_app().await;
    let token = create_user_and_login(&app, "bob").await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/totp",
        Some(&token),
        Some(json!({"label": "bad", "secret": "not base32 !!"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "POST",
        "/api/totp",
        Some(&token),
        Some(json!({"label": "   ", "secret": TEST_SECRET})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Labels are unique per user.
    let (status, _) = request(
        &app,
        "POST",
        "/api/totp",
        Some(&token),
        Some(json!({"label": "github", "secret": TEST_SECRET})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request(
        &app,
        "POST",
        "/api/totp",
        Some(&token),
        Some(json!({"label": "github", "secret": TEST_SECRET})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn default_flag_stays_unique_across_switches() {
    let (app, _) = spawn_app().await;
    let token = create_user_and_login(&app, "bob").await;

    for label in ["github", "aws", "mail"] {
        let (status, _) = request(
            &app,
            "POST",
            "/api/totp",
            Some(&token),
            Some(json!({"label": label, "secret": TEST_SECRET})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    for label in ["github", "aws", "github", "mail"] {
        let (status, _) = request(
            &app,
            "PUT",
            "/api/totp/default",
            Some(&token),
            Some(json!({"label": label})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = request(&app, "GET", "/api/totp", Some(&token), None).await;
        let defaults: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|e| e["is_default"] == true)
            .map(|e| e["label"].as_str().unwrap())
            .collect();
        assert_eq!(defaults, vec![label]);
    }

    // Unknown label leaves the flags untouched.
    let (status, _) = request(
        &app,
        "PUT",
        "/api/totp/default",
        Some(&token),
        Some(json!({"label": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = request(&app, "GET", "/api/totp", Some(&token), None).await;
    let default_count = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["is_default"] == true)
        .count();
    assert_eq!(default_count, 1);
}

#[tokio::test]
async fn users_cannot_touch_each_others_secrets() {
    let (app, _) = spawn_app().await;
    let alice_token = create_user_and_login(&app, "alice").await;

    // create_user_and_login logs in as admin each time; reuse it for bob.
    let admin_token = login(&app, "admin", "admin").await;
    let (status, _) = request(
        &app,
        "POST",
        "/api/users",
        Some(&admin_token),
        Some(json!({"username": "bob", "password": "bob-password", "user_type": "user"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let bob_token = login(&app, "bob", "bob-password").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/totp",
        Some(&alice_token),
        Some(json!({"label": "private", "secret": TEST_SECRET})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let alice_secret_id = body["data"]["id"].as_str().unwrap().to_string();

    // Bob sees nothing of alice's.
    let (_, body) = request(&app, "GET", "/api/totp", Some(&bob_token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    // Bob cannot delete alice's secret even with its real id.
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/totp/{alice_secret_id}"),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Nor claim her label as his default.
    let (status, _) = request(
        &app,
        "PUT",
        "/api/totp/default",
        Some(&bob_token),
        Some(json!({"label": "private"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Alice still has it, and can delete it herself.
    let (_, body) = request(&app, "GET", "/api/totp", Some(&alice_token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/totp/{alice_secret_id}"),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_user_cascades_their_secrets() {
    let (app, state) = spawn_app().await;
    let admin_token = login(&app, "admin", "admin").await;

    let (_, body) = request(
        &app,
        "POST",
        "/api/users",
        Some(&admin_token),
        Some(json!({"username": "dave", "password": "dave-password", "user_type": "user"})),
    )
    .await;
    let dave_id: Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();

    let dave_token = login(&app, "dave", "dave-password").await;
    for label in ["one", "two"] {
        let (status, _) = request(
            &app,
            "POST",
            "/api/totp",
            Some(&dave_token),
            Some(json!({"label": label, "secret": TEST_SECRET})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/users/{dave_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Verify at the store level: no orphaned rows survive the cascade.
    let rows = state.store.totp().list_for_user(dave_id).await.unwrap();
    assert!(rows.is_empty());
}
