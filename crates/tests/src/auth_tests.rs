use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn register_creates_user_and_returns_tokens() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "domain": "school",
            "email": "Alice@Test.com",
            "username": "alice",
            "display_name": "Alice",
            "password": "Password123!",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 201);
    let json: Value = resp.json().await.unwrap();
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["user"]["email"], "alice@test.com");
    assert_eq!(json["user"]["username"], "alice");
}

#[tokio::test]
async fn same_email_is_allowed_in_another_domain_only() {
    let app = TestApp::spawn().await;
    let first = app.register_user("school-a", "dup@test.com", "dup").await;
    let second = app.register_user("school-b", "dup@test.com", "dup").await;
    assert_ne!(first.domain, second.domain);

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "domain": "school-a",
            "email": "dup@test.com",
            "username": "other",
            "display_name": "Other",
            "password": "Password123!",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn login_and_me_roundtrip() {
    let app = TestApp::spawn().await;
    let user = app.register_user("school", "bob@test.com", "bob").await;

    let resp = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&serde_json::json!({
            "domain": "school",
            "email": "bob@test.com",
            "password": "Password123!",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let token = json["access_token"].as_str().unwrap();

    let resp = app.auth_get("/api/auth/me", token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let me: Value = resp.json().await.unwrap();
    assert_eq!(me["id"], user.id.to_hex());
    assert_eq!(me["domain"], user.domain.to_hex());
}

#[tokio::test]
async fn login_with_wrong_password_or_domain_fails() {
    let app = TestApp::spawn().await;
    app.register_user("school", "carol@test.com", "carol").await;

    for (domain, password) in [("school", "wrong-password"), ("elsewhere", "Password123!")] {
        let resp = app
            .client
            .post(app.url("/api/auth/login"))
            .json(&serde_json::json!({
                "domain": domain,
                "email": "carol@test.com",
                "password": password,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 401);
    }
}

#[tokio::test]
async fn me_without_token_is_unauthorized() {
    let app = TestApp::spawn().await;
    let resp = app.client.get(app.url("/api/auth/me")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}
