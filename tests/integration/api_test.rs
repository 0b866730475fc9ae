//! Integration tests for the HTTP surface.

use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::spawn(&[]).await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_command_requires_token() {
    let app = TestApp::spawn(&[]).await;

    let response = app
        .request(
            "POST",
            "/api/devices/pump-1/commands",
            None,
            Some(json!({"command": "gpio", "payload": {"pin": 4, "value": 1}})),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_command_forbidden_for_unauthorized_user() {
    let app = TestApp::spawn(&[]).await;
    let token = app.token_for(Uuid::new_v4());

    let response = app
        .request(
            "POST",
            "/api/devices/pump-1/commands",
            Some(&token),
            Some(json!({"command": "gpio"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_command_rejects_invalid_name() {
    let user = Uuid::new_v4();
    let app = TestApp::spawn(&[user]).await;
    let token = app.token_for(user);

    let response = app
        .request(
            "POST",
            "/api/devices/pump-1/commands",
            Some(&token),
            Some(json!({"command": "gpio/../../etc"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_command_fails_fast_while_broker_down() {
    let user = Uuid::new_v4();
    let app = TestApp::spawn(&[user]).await;
    let token = app.token_for(user);

    let response = app
        .request(
            "POST",
            "/api/devices/pump-1/commands",
            Some(&token),
            Some(json!({"command": "gpio", "payload": {"pin": 4, "value": 1}})),
        )
        .await;

    // The test broker's event loop is never run, so publishing must
    // surface the outage instead of queuing.
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["error"], "SERVICE_UNAVAILABLE");
}
