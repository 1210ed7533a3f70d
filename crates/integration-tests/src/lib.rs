//! Integration tests for the NB1 portal.
//!
//! Each test starts the full portal router on an ephemeral port, with the
//! webhook backend and the postal code service replaced by `wiremock`
//! servers.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p nb1-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};

use nb1_portal::config::PortalConfig;
use nb1_portal::state::AppState;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, redirect::Policy};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path prefix of the mocked webhook backend.
pub const WEBHOOK_PREFIX: &str = "/webhook/nb1/";

/// Token the mocked backend hands out at login.
pub const TEST_TOKEN: &str = "tok-7f3c9a";

/// Password accepted by every policy in the portal.
pub const TEST_PASSWORD: &str = "Secr3t!pass";

static NEXT_CLIENT_IP: AtomicU8 = AtomicU8::new(1);

/// A running portal wired to mock upstreams.
pub struct TestPortal {
    pub addr: SocketAddr,
    /// Cookie-keeping client that does not follow redirects.
    pub client: Client,
    pub backend: MockServer,
    pub viacep: MockServer,
}

impl TestPortal {
    /// Start with default settings.
    pub async fn start() -> Self {
        Self::start_with(&[]).await
    }

    /// Start with extra configuration values.
    pub async fn start_with(overrides: &[(&str, &str)]) -> Self {
        let backend = MockServer::start().await;
        let viacep = MockServer::start().await;

        let mut env: HashMap<String, String> = HashMap::from([
            ("PORTAL_BASE_URL".to_owned(), "http://127.0.0.1".to_owned()),
            (
                "WEBHOOK_BASE_URL".to_owned(),
                format!("{}{WEBHOOK_PREFIX}", backend.uri()),
            ),
            ("VIACEP_BASE_URL".to_owned(), format!("{}/ws/", viacep.uri())),
            ("WEBHOOK_TIMEOUT_SECS".to_owned(), "5".to_owned()),
            ("POSTAL_LOOKUP_DEBOUNCE_MS".to_owned(), "20".to_owned()),
        ]);
        for (key, value) in overrides {
            env.insert((*key).to_owned(), (*value).to_owned());
        }

        let config = PortalConfig::from_source(&|key| env.get(key).cloned())
            .expect("Failed to load test configuration");
        let state = AppState::new(config).expect("Failed to build application state");
        let app = nb1_portal::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server error");
        });

        Self {
            addr,
            client: test_client(),
            backend,
            viacep,
        }
    }

    /// Absolute URL for a portal path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Mount a successful backend login for `profile`.
    pub async fn mock_login(&self, profile: Value) {
        let mut body = profile;
        body["session_token"] = json!(TEST_TOKEN);
        Mock::given(method("POST"))
            .and(path(backend_path("api/auth/login")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.backend)
            .await;
    }

    /// Mount a backend answer for an authenticated call.
    pub async fn mock_authed(&self, verb: &str, endpoint: &str, response: ResponseTemplate) {
        Mock::given(method(verb))
            .and(path(backend_path(endpoint)))
            .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
            .respond_with(response)
            .mount(&self.backend)
            .await;
    }

    /// Mount a backend answer for an anonymous call.
    pub async fn mock_public(&self, verb: &str, endpoint: &str, response: ResponseTemplate) {
        Mock::given(method(verb))
            .and(path(backend_path(endpoint)))
            .respond_with(response)
            .mount(&self.backend)
            .await;
    }

    /// Log in through the portal with [`TEST_PASSWORD`].
    pub async fn login(&self, email: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": TEST_PASSWORD }))
            .send()
            .await
            .expect("Login request failed")
    }
}

/// Full backend path for an endpoint.
#[must_use]
pub fn backend_path(endpoint: &str) -> String {
    format!("{WEBHOOK_PREFIX}{endpoint}")
}

/// A profile as the backend returns it.
#[must_use]
pub fn sample_profile(email: &str) -> Value {
    json!({
        "id": 42,
        "full_name": "Ana Souza",
        "email": email,
        "phone": "+5511987654321",
        "birth_date": "1990-04-12",
        "gender": "female",
        "preferred_currency": "USD",
        "preferred_language": "pt",
        "postal_code": "01310930",
        "country": "Brazil",
        "state": "SP",
        "city": "São Paulo",
        "street_address": "Avenida Paulista",
        "address_number": "1578",
        "address_complement": null,
        "hobbies": ["reading"],
        "favorite_movie_styles": [],
        "favorite_series_styles": null,
        "plan_status": "",
        "user_status": "active"
    })
}

/// Client with its own cookie jar and a distinct client IP, so rate limits
/// never leak between tests.
fn test_client() -> Client {
    let octet = NEXT_CLIENT_IP.fetch_add(1, Ordering::Relaxed);
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&format!("10.20.30.{octet}")).expect("Invalid client IP header"),
    );

    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}
