mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{body_to_vec, TestApp};
use serde_json::Value;

#[tokio::test]
async fn default_admin_can_login_and_fetch_profile() -> Result<()> {
    let app = TestApp::new().await?;

    let token = app.login_token("admin", "admin").await?;
    let response = app.get("/api/auth/me", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    assert_eq!(body["role"], "manager");
    assert_eq!(body["name"], "المدير");
    assert!(body.get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_rejected() -> Result<()> {
    let app = TestApp::new().await?;

    let response = app
        .post_json(
            "/api/auth/login",
            &serde_json::json!({ "username": "admin", "password": "nope" }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let app = TestApp::new().await?;

    let response = app.get("/api/records", None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/api/records", Some("not-a-token")).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
