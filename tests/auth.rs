mod common;

use common::{body, login, TestApp};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_home_is_public() {
    let app = TestApp::spawn().await;

    let response = app.get("/").await;
    assert!(response.status().is_success(), "Home page failed");
    let body = body(response).await;
    assert_eq!(body["featured_products"], json!([]));
    assert_eq!(body["bestseller_products"], json!([]));
    assert_eq!(body["categories"], json!([]));
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/login"))
        .json(&json!({ "username": "admin", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(response).await["error"], "Invalid username or password");
}

#[tokio::test]
async fn test_admin_routes_need_token() {
    let app = TestApp::spawn().await;

    let response = app.get("/admin/category").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .client
        .get(app.url("/admin/category"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.admin_get("/admin/category").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_customer_token_is_not_admin() {
    let app = TestApp::spawn().await;
    app.create_user("JohnDoe").await;

    let token = login(&app.client, &app.address, "JohnDoe", "secret-pass").await;
    let response = app
        .client
        .get(app.url("/admin/product"))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = TestApp::spawn().await;
    app.create_user("JohnDoe").await;

    let response = app
        .admin_post(
            "/admin/user",
            &json!({ "username": "JohnDoe", "password": "another-pass" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let users = body(app.admin_get("/admin/user").await).await;
    let users = users.as_array().expect("Expected a list");
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|user| user.get("password").is_none()));
}
