//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is built; clients only ever see a
//! short code, a safe message and, for validation failures, the localized
//! per-field errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use nb1_core::{FieldError, ResetError, ValidationError, WizardError};
use serde::Serialize;
use thiserror::Error;

use crate::webhook::WebhookError;

/// Where the browser goes when a login is needed.
pub const LOGIN_PATH: &str = "/auth/login";

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// Webhook backend call failed.
    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// One or more fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Registration wizard rejected a transition.
    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    /// Password reset step called out of order.
    #[error("Password reset error: {0}")]
    Reset(#[from] ResetError),

    /// The backend no longer accepts the session token.
    #[error("Session expired")]
    SessionExpired,

    /// Wrong e-mail or password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Profile edits need a recent password confirmation.
    #[error("Re-authentication required")]
    ReauthRequired,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused the request for a business reason.
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        login_url: Option<&'static str>,
    },

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [FieldError]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_url: Option<&'static str>,
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Webhook(WebhookError::Unauthorized) | Self::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Self::Webhook(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::Wizard(WizardError::Invalid(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Wizard(WizardError::FieldType(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Wizard(_) | Self::Reset(_) | Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::SessionExpired => StatusCode::SEE_OTHER,
            Self::ReauthRequired => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::Webhook(WebhookError::Unauthorized) | Self::SessionExpired => "session_expired",
            Self::Webhook(_) => "upstream_error",
            Self::Session(_) | Self::Internal(_) => "internal_error",
            Self::Validation(_) | Self::Wizard(WizardError::Invalid(_)) => "validation_failed",
            Self::Wizard(_) => "wizard_step",
            Self::Reset(_) => "reset_out_of_order",
            Self::InvalidCredentials => "invalid_credentials",
            Self::ReauthRequired => "reauth_required",
            Self::NotFound(_) => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::BadRequest(_) => "bad_request",
        }
    }

    /// Client-safe message; internal details stay in the logs.
    fn message(&self) -> String {
        match self {
            Self::Webhook(WebhookError::Unauthorized) | Self::SessionExpired => {
                "Session expired, please log in again".to_string()
            }
            Self::Webhook(_) => "External service error".to_string(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Validation(_) | Self::Wizard(WizardError::Invalid(_)) => {
                "Please correct the highlighted fields".to_string()
            }
            Self::NotFound(msg) | Self::BadRequest(msg) | Self::Conflict { message: msg, .. } => {
                msg.clone()
            }
            _ => self.to_string(),
        }
    }

    fn fields(&self) -> Option<&[FieldError]> {
        match self {
            Self::Validation(err) | Self::Wizard(WizardError::Invalid(err)) => {
                Some(err.errors.as_slice())
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let server_side = match &self {
            Self::Webhook(WebhookError::Unauthorized) => false,
            Self::Session(_) | Self::Internal(_) | Self::Webhook(_) => true,
            _ => false,
        };
        if server_side {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        if matches!(self, Self::SessionExpired) {
            return Redirect::to(LOGIN_PATH).into_response();
        }

        let login_url = match &self {
            Self::Conflict { login_url, .. } => *login_url,
            _ => None,
        };
        let body = ErrorBody {
            error: self.code(),
            message: self.message(),
            fields: self.fields(),
            login_url,
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after login.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// ```rust,ignore
/// add_breadcrumb("registration", "Advanced wizard step", Some(&[("step", "address")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
