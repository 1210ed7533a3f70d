//! Profile edits, billing preferences and help.

use nb1_integration_tests::{TEST_PASSWORD, TEST_TOKEN, TestPortal, backend_path, sample_profile};
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

const EMAIL: &str = "ana@example.com";

async fn logged_in() -> TestPortal {
    let portal = TestPortal::start().await;
    portal.mock_login(sample_profile(EMAIL)).await;
    portal
        .mock_public(
            "POST",
            "api/user/check",
            ResponseTemplate::new(200).set_body_json(json!({ "status": true })),
        )
        .await;
    let resp = portal.login(EMAIL).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    portal
}

fn new_address() -> Value {
    json!({
        "postal_code": "20040-020",
        "country": "Brazil",
        "state": "RJ",
        "city": "Rio de Janeiro",
        "street_address": "Avenida Rio Branco",
        "address_number": "156"
    })
}

#[tokio::test]
async fn test_profile_edit_needs_password_confirmation() {
    let portal = logged_in().await;

    let resp = portal
        .client
        .put(portal.url("/dashboard/profile/address"))
        .json(&new_address())
        .send()
        .await
        .expect("Update request failed");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.expect("Error body is not JSON");
    assert_eq!(body["error"], "reauth_required");
}

#[tokio::test]
async fn test_address_edit_after_reauthentication() {
    let portal = logged_in().await;
    Mock::given(method("PUT"))
        .and(path(backend_path("api/user/profile")))
        .and(body_partial_json(json!({
            "postal_code": "20040020",
            "city": "Rio de Janeiro",
            "address_complement": ""
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": true })))
        .expect(1)
        .mount(&portal.backend)
        .await;

    let resp = portal
        .client
        .post(portal.url("/dashboard/profile/reauthenticate"))
        .json(&json!({ "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("Reauthenticate request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Reauth body is not JSON");
    assert!(body["editable_until"].is_string());

    let view: Value = portal
        .client
        .put(portal.url("/dashboard/profile/address"))
        .json(&new_address())
        .send()
        .await
        .expect("Update request failed")
        .json()
        .await
        .expect("Profile body is not JSON");

    assert_eq!(view["profile"]["city"], "Rio de Janeiro");
    assert_eq!(view["profile"]["postal_code"], "20040020");
    assert!(view["editable_until"].is_string());
}

#[tokio::test]
async fn test_invalid_edit_lists_fields() {
    let portal = logged_in().await;
    portal
        .client
        .post(portal.url("/dashboard/profile/reauthenticate"))
        .json(&json!({ "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("Reauthenticate request failed");

    let resp = portal
        .client
        .put(portal.url("/dashboard/profile/basic"))
        .json(&json!({ "phone": "12", "birth_date": "2999-01-01" }))
        .send()
        .await
        .expect("Update request failed");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.expect("Error body is not JSON");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .expect("fields should be a list")
        .iter()
        .filter_map(|f| f["field"].as_str())
        .collect();
    assert_eq!(fields, ["phone", "dateOfBirth"]);
}

#[tokio::test]
async fn test_financial_preferences_round_trip() {
    let portal = logged_in().await;
    portal
        .mock_authed(
            "PUT",
            "api/user/financial",
            ResponseTemplate::new(200).set_body_json(json!({ "status": true })),
        )
        .await;

    let view: Value = portal
        .client
        .get(portal.url("/dashboard/financial"))
        .send()
        .await
        .expect("Financial request failed")
        .json()
        .await
        .expect("Financial body is not JSON");
    assert_eq!(view["preferences"]["billing_email"], EMAIL);
    assert_eq!(view["preferences"]["preferred_currency"], "USD");

    let view: Value = portal
        .client
        .put(portal.url("/dashboard/financial"))
        .json(&json!({ "preferred_currency": "EUR" }))
        .send()
        .await
        .expect("Financial update failed")
        .json()
        .await
        .expect("Financial body is not JSON");
    assert_eq!(view["preferences"]["preferred_currency"], "EUR");

    let pricing: Value = portal
        .client
        .get(portal.url("/pricing"))
        .send()
        .await
        .expect("Pricing request failed")
        .json()
        .await
        .expect("Pricing body is not JSON");
    assert_eq!(pricing["currency"], "EUR");
}

#[tokio::test]
async fn test_help_page() {
    let portal = logged_in().await;

    let view: Value = portal
        .client
        .get(portal.url("/dashboard/help"))
        .send()
        .await
        .expect("Help request failed")
        .json()
        .await
        .expect("Help body is not JSON");

    assert_eq!(view["support_email"], "support@nb1.ai");
    assert_eq!(view["faq"].as_array().map(Vec::len), Some(3));
    assert_eq!(view["faq"][0]["question"], "Como atualizo meu perfil?");
    assert_eq!(view["nav"][2]["active"], true);
}

#[tokio::test]
async fn test_next_login_must_confirm_password_again() {
    const OTHER_EMAIL: &str = "bob@example.com";
    let portal = TestPortal::start().await;
    for email in [EMAIL, OTHER_EMAIL] {
        let mut body = sample_profile(email);
        body["session_token"] = json!(TEST_TOKEN);
        Mock::given(method("POST"))
            .and(path(backend_path("api/auth/login")))
            .and(body_partial_json(json!({ "email": email })))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&portal.backend)
            .await;
    }
    portal
        .mock_public(
            "POST",
            "api/user/check",
            ResponseTemplate::new(200).set_body_json(json!({ "status": true })),
        )
        .await;
    Mock::given(method("PUT"))
        .and(path(backend_path("api/user/data")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": true })))
        .expect(0)
        .mount(&portal.backend)
        .await;

    assert_eq!(portal.login(EMAIL).await.status(), StatusCode::SEE_OTHER);
    let resp = portal
        .client
        .post(portal.url("/dashboard/profile/reauthenticate"))
        .json(&json!({ "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("Reauthenticate request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(portal.login(OTHER_EMAIL).await.status(), StatusCode::SEE_OTHER);
    let resp = portal
        .client
        .put(portal.url("/dashboard/profile/basic"))
        .json(&json!({
            "phone": "+5511912345678",
            "birth_date": "1985-02-01"
        }))
        .send()
        .await
        .expect("Update request failed");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.expect("Error body is not JSON");
    assert_eq!(body["error"], "reauth_required");
}
