//! Login and logout.

use axum::{
    Json,
    extract::{Query, State},
    response::Redirect,
};
use nb1_core::{Field, Locale, RegistrationSchema, ValidationError, Violation, validation};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use super::session_locale;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::session_keys;
use crate::state::AppState;
use crate::webhook::WebhookError;

/// Landing page after login.
pub const AFTER_LOGIN_PATH: &str = "/dashboard/profile";

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Local path to return to after login.
    #[serde(default)]
    pub next: Option<String>,
}

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
    pub next: Option<String>,
}

/// Login page view model.
#[derive(Debug, Serialize)]
pub struct LoginView {
    pub locale: Locale,
    pub error: Option<String>,
    pub success: Option<String>,
    pub next: Option<String>,
    pub register_url: &'static str,
    pub password_reset_url: &'static str,
}

/// Display login page.
pub async fn login_page(session: Session, Query(query): Query<MessageQuery>) -> Json<LoginView> {
    Json(LoginView {
        locale: session_locale(&session).await,
        error: query.error,
        success: query.success,
        next: query.next.filter(|n| is_local_path(n)),
        register_url: "/register",
        password_reset_url: "/auth/password-reset/request",
    })
}

/// Handle login.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Redirect> {
    let schema = RegistrationSchema::new(session_locale(&session).await);
    let password = if form.password.is_empty() {
        Err(Violation::Required)
    } else {
        Ok(())
    };
    let email = match (validation::check_email(&form.email), password) {
        (Ok(email), Ok(())) => email,
        (email, password) => {
            let errors = [
                email.err().map(|v| schema.error(Field::Email, v)),
                password.err().map(|v| schema.error(Field::Password, v)),
            ]
            .into_iter()
            .flatten()
            .collect();
            return Err(ValidationError { errors }.into());
        }
    };

    let (profile, token) = match state.webhook().login(email.as_str(), &form.password).await {
        Ok(login) => login,
        Err(WebhookError::Unauthorized) => {
            info!("Login rejected");
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    set_current_user(&session, &token, &profile).await?;
    if let Some(locale) = profile.locale() {
        session.insert(session_keys::LOCALE, locale).await?;
    }
    set_sentry_user(&profile.id, Some(&profile.email));
    info!(user_id = %profile.id, "User logged in");

    let target = form
        .next
        .filter(|n| is_local_path(n))
        .unwrap_or_else(|| AFTER_LOGIN_PATH.to_string());
    Ok(Redirect::to(&target))
}

/// Handle logout.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/auth/login"))
}

/// Only same-site absolute paths are accepted as redirect targets.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}
