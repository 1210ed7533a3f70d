//! Request and response bodies exchanged with the webhook backend.

use nb1_core::{Currency, SessionToken, UserProfile};
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST api/auth/login`.
#[derive(Debug, Serialize)]
pub(super) struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful login: the profile fields plus the bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(default)]
    pub session_token: Option<SessionToken>,
}

/// The `{status, msg}` envelope most backend endpoints answer with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusMessage {
    #[serde(default, deserialize_with = "truthy")]
    pub status: bool,
    #[serde(default)]
    pub msg: Option<String>,
}

impl StatusMessage {
    /// The backend message, when it sent a non-blank one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.msg.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub(super) struct EmailBody<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct VerifyCodeBody<'a> {
    pub email: &'a str,
    pub code: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NewPasswordBody<'a> {
    pub email: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct FinancialBody<'a> {
    pub billing_email: &'a str,
    pub preferred_currency: Currency,
}

/// `GET api/user/data` returns either one record or a one-element array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ProfilePayload {
    Many(Vec<UserProfile>),
    One(Box<UserProfile>),
}

impl ProfilePayload {
    pub fn into_first(self) -> Option<UserProfile> {
        match self {
            Self::Many(list) => list.into_iter().next(),
            Self::One(profile) => Some(*profile),
        }
    }
}

/// Accepts `true`, `"true"` and `1`.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => s.eq_ignore_ascii_case("true"),
        serde_json::Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    })
}
