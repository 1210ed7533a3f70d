//! Password reset flow.

use nb1_integration_tests::{TestPortal, backend_path};
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

const EMAIL: &str = "ana@example.com";
const NEW_PASSWORD: &str = "N3w!Passw0rd";

fn ok_status() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "status": true }))
}

#[tokio::test]
async fn test_full_reset_flow() {
    let portal = TestPortal::start().await;
    portal.mock_public("POST", "api/user/check", ok_status()).await;
    portal
        .mock_public("POST", "api/send-reset-code", ResponseTemplate::new(200))
        .await;
    Mock::given(method("POST"))
        .and(path(backend_path("api/verify-reset-code")))
        .and(body_json(json!({ "email": EMAIL, "code": "482913" })))
        .respond_with(ok_status())
        .mount(&portal.backend)
        .await;
    Mock::given(method("POST"))
        .and(path(backend_path("api/reset/password")))
        .and(body_json(json!({ "email": EMAIL, "newPassword": NEW_PASSWORD })))
        .respond_with(ok_status())
        .expect(1)
        .mount(&portal.backend)
        .await;

    let sent: Value = portal
        .client
        .post(portal.url("/auth/password-reset/request"))
        .json(&json!({ "email": EMAIL }))
        .send()
        .await
        .expect("Reset request failed")
        .json()
        .await
        .expect("Reset body is not JSON");
    assert_eq!(sent["stage"], "code");
    assert_eq!(sent["email"], EMAIL);

    let verified: Value = portal
        .client
        .post(portal.url("/auth/password-reset/verify"))
        .json(&json!({ "code": " 482913 " }))
        .send()
        .await
        .expect("Verify request failed")
        .json()
        .await
        .expect("Verify body is not JSON");
    assert_eq!(verified["stage"], "new_password");

    let resp = portal
        .client
        .post(portal.url("/auth/password-reset/complete"))
        .json(&json!({ "new_password": NEW_PASSWORD, "confirm_password": NEW_PASSWORD }))
        .send()
        .await
        .expect("Complete request failed");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers()["location"],
        "/auth/login?success=password_reset"
    );
}

#[tokio::test]
async fn test_unknown_email_is_reported() {
    let portal = TestPortal::start().await;
    portal
        .mock_public(
            "POST",
            "api/user/check",
            ResponseTemplate::new(200).set_body_json(json!({ "status": false })),
        )
        .await;

    let resp = portal
        .client
        .post(portal.url("/auth/password-reset/request"))
        .json(&json!({ "email": "nobody@example.com" }))
        .send()
        .await
        .expect("Reset request failed");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Error body is not JSON");
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_steps_cannot_be_skipped() {
    let portal = TestPortal::start().await;

    let resp = portal
        .client
        .post(portal.url("/auth/password-reset/verify"))
        .json(&json!({ "code": "482913" }))
        .send()
        .await
        .expect("Verify request failed");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = portal
        .client
        .post(portal.url("/auth/password-reset/complete"))
        .json(&json!({ "new_password": NEW_PASSWORD, "confirm_password": NEW_PASSWORD }))
        .send()
        .await
        .expect("Complete request failed");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(
        portal
            .backend
            .received_requests()
            .await
            .unwrap_or_default()
            .is_empty()
    );
}

#[tokio::test]
async fn test_wrong_code_keeps_flow_open() {
    let portal = TestPortal::start().await;
    portal.mock_public("POST", "api/user/check", ok_status()).await;
    portal
        .mock_public("POST", "api/send-reset-code", ResponseTemplate::new(200))
        .await;
    portal
        .mock_public(
            "POST",
            "api/verify-reset-code",
            ResponseTemplate::new(200).set_body_json(json!({ "status": "false" })),
        )
        .await;

    portal
        .client
        .post(portal.url("/auth/password-reset/request"))
        .json(&json!({ "email": EMAIL }))
        .send()
        .await
        .expect("Reset request failed");

    let resp = portal
        .client
        .post(portal.url("/auth/password-reset/verify"))
        .json(&json!({ "code": "000000" }))
        .send()
        .await
        .expect("Verify request failed");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.expect("Error body is not JSON");
    assert_eq!(body["fields"][0]["field"], "code");
    assert_eq!(body["fields"][0]["violation"], "invalid_code");
}
