//! Client for the NB1 webhook backend.
//!
//! Every account operation (login, registration, profile edits, password
//! reset, billing preferences) is a JSON call to a path under
//! `WEBHOOK_BASE_URL`. Authenticated calls send the session token as a
//! bearer credential; a `401` from any of them surfaces as
//! [`WebhookError::Unauthorized`] so the caller can expire the session.

mod types;

pub use types::{LoginResponse, StatusMessage};

use nb1_core::{
    AddressUpdate, BasicInfoUpdate, CulturalUpdate, FinancialPreferences, NewAccount,
    SessionToken, UserProfile,
};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::WebhookConfig;
use types::{Credentials, EmailBody, FinancialBody, NewPasswordBody, ProfilePayload, VerifyCodeBody};

/// Errors that can occur when talking to the webhook backend.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the credentials or the session token.
    #[error("unauthorized")]
    Unauthorized,

    /// Backend returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Endpoint path could not be joined onto the base URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Webhook backend client.
#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    base_url: Url,
}

impl WebhookClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &WebhookConfig) -> Result<Self, WebhookError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Exchange e-mail and password for a profile and session token.
    ///
    /// # Errors
    ///
    /// [`WebhookError::Unauthorized`] for wrong credentials, [`WebhookError::Parse`]
    /// when the response lacks the user id, e-mail or token.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserProfile, SessionToken), WebhookError> {
        let request = self
            .request(Method::POST, "api/auth/login", None)?
            .json(&Credentials { email, password });
        let response: LoginResponse = parse(execute(request).await?).await?;

        if response.profile.id.is_empty() || response.profile.email.trim().is_empty() {
            return Err(WebhookError::Parse(
                "login response is missing the user id or e-mail".to_string(),
            ));
        }
        let token = response
            .session_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| WebhookError::Parse("login response has no session token".to_string()))?;

        Ok((response.profile, token))
    }

    /// Create an account. `status: false` is a business rejection (for
    /// example an e-mail already in use), not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn create_user(&self, account: &NewAccount) -> Result<StatusMessage, WebhookError> {
        let request = self
            .request(Method::POST, "api/user/create", None)?
            .json(account);
        parse(execute(request).await?).await
    }

    /// Fetch the profile behind `token`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response holds no profile.
    #[instrument(skip_all)]
    pub async fn fetch_profile(&self, token: &SessionToken) -> Result<UserProfile, WebhookError> {
        let request = self.request(Method::GET, "api/user/data", Some(token))?;
        let payload: ProfilePayload = parse(execute(request).await?).await?;
        payload
            .into_first()
            .ok_or_else(|| WebhookError::Parse("profile response is empty".to_string()))
    }

    /// Update phone and date of birth.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip_all)]
    pub async fn update_basic(
        &self,
        token: &SessionToken,
        update: &BasicInfoUpdate,
    ) -> Result<(), WebhookError> {
        let request = self
            .request(Method::PUT, "api/user/data", Some(token))?
            .json(update);
        execute(request).await.map(drop)
    }

    /// Update the postal address.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip_all)]
    pub async fn update_address(
        &self,
        token: &SessionToken,
        update: &AddressUpdate,
    ) -> Result<(), WebhookError> {
        let request = self
            .request(Method::PUT, "api/user/profile", Some(token))?
            .json(update);
        execute(request).await.map(drop)
    }

    /// Update hobbies and favorite genres.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip_all)]
    pub async fn update_cultural(
        &self,
        token: &SessionToken,
        update: &CulturalUpdate,
    ) -> Result<(), WebhookError> {
        let request = self
            .request(Method::PUT, "api/user/data", Some(token))?
            .json(update);
        execute(request).await.map(drop)
    }

    /// Store billing preferences.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip_all, fields(currency = %preferences.preferred_currency))]
    pub async fn update_financial(
        &self,
        token: &SessionToken,
        preferences: &FinancialPreferences,
    ) -> Result<(), WebhookError> {
        let request = self
            .request(Method::PUT, "api/user/financial", Some(token))?
            .json(&FinancialBody {
                billing_email: &preferences.billing_email,
                preferred_currency: preferences.preferred_currency,
            });
        execute(request).await.map(drop)
    }

    /// Ask whether an account exists for `email`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn check_user(&self, email: &str) -> Result<StatusMessage, WebhookError> {
        let request = self
            .request(Method::POST, "api/user/check", None)?
            .json(&EmailBody { email });
        parse(execute(request).await?).await
    }

    /// Send a password reset code to `email`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn send_reset_code(&self, email: &str) -> Result<StatusMessage, WebhookError> {
        let request = self
            .request(Method::POST, "api/send-reset-code", None)?
            .json(&EmailBody { email });
        parse_or_default(execute(request).await?).await
    }

    /// Check a reset code. `status: true` means the code is valid.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed.
    #[instrument(skip(self, code))]
    pub async fn verify_reset_code(
        &self,
        email: &str,
        code: &str,
    ) -> Result<StatusMessage, WebhookError> {
        let request = self
            .request(Method::POST, "api/verify-reset-code", None)?
            .json(&VerifyCodeBody { email, code });
        parse(execute(request).await?).await
    }

    /// Set a new password after a verified code.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, new_password))]
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<StatusMessage, WebhookError> {
        let request = self
            .request(Method::POST, "api/reset/password", None)?
            .json(&NewPasswordBody {
                email,
                new_password,
            });
        parse_or_default(execute(request).await?).await
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&SessionToken>,
    ) -> Result<RequestBuilder, WebhookError> {
        let url = self.base_url.join(path)?;
        let mut request = self.client.request(method, url);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, token.bearer());
        }
        Ok(request)
    }
}

async fn execute(request: RequestBuilder) -> Result<Response, WebhookError> {
    let response = request.send().await?;
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(WebhookError::Unauthorized);
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(WebhookError::Api {
            status: status.as_u16(),
            message,
        });
    }

    debug!(status = status.as_u16(), url = %response.url(), "Webhook call succeeded");
    Ok(response)
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, WebhookError> {
    response
        .json()
        .await
        .map_err(|e| WebhookError::Parse(e.to_string()))
}

/// Some endpoints answer with an empty body on success.
async fn parse_or_default<T: DeserializeOwned + Default>(
    response: Response,
) -> Result<T, WebhookError> {
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&body).map_err(|e| WebhookError::Parse(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client(server: &MockServer) -> WebhookClient {
        WebhookClient::new(&WebhookConfig {
            base_url: Url::parse(&format!("{}/webhook/nb1/", server.uri())).unwrap(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/nb1/api/auth/login"))
            .and(body_json(json!({"email": "ana@example.com", "password": "Secret1!"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7,
                "email": "ana@example.com",
                "full_name": "Ana",
                "hobbies": null,
                "session_token": "tok_abc"
            })))
            .mount(&server)
            .await;

        let (profile, token) = client(&server)
            .await
            .login("ana@example.com", "Secret1!")
            .await
            .unwrap();
        assert_eq!(profile.id.as_str(), "7");
        assert!(profile.hobbies.is_empty());
        assert_eq!(token.expose(), "tok_abc");
    }

    #[tokio::test]
    async fn test_login_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/nb1/api/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = client(&server).await.login("ana@example.com", "nope").await;
        assert!(matches!(result, Err(WebhookError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_requires_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/nb1/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"email": "ana@example.com"})),
            )
            .mount(&server)
            .await;

        let result = client(&server).await.login("ana@example.com", "x").await;
        assert!(matches!(result, Err(WebhookError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_profile_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/webhook/nb1/api/user/data"))
            .and(header("authorization", "Bearer tok_abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": "u1", "email": "ana@example.com"}])),
            )
            .mount(&server)
            .await;

        let profile = client(&server)
            .await
            .fetch_profile(&SessionToken::new("tok_abc"))
            .await
            .unwrap();
        assert_eq!(profile.id.as_str(), "u1");
    }

    #[tokio::test]
    async fn test_authenticated_call_expired() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/webhook/nb1/api/user/profile"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let update = AddressUpdate {
            postal_code: "01310930".to_string(),
            country: "Brazil".to_string(),
            state: "SP".to_string(),
            city: "São Paulo".to_string(),
            street_address: "Avenida Paulista".to_string(),
            address_number: "1000".to_string(),
            address_complement: String::new(),
        };
        let result = client(&server)
            .await
            .update_address(&SessionToken::new("old"), &update)
            .await;
        assert!(matches!(result, Err(WebhookError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/nb1/api/user/check"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = client(&server).await.check_user("ana@example.com").await;
        match result {
            Err(WebhookError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reset_password_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/nb1/api/reset/password"))
            .and(body_json(json!({"email": "ana@example.com", "newPassword": "Abcdef1!"})))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let reply = client(&server)
            .await
            .reset_password("ana@example.com", "Abcdef1!")
            .await
            .unwrap();
        assert_eq!(reply, StatusMessage::default());
    }
}
