//! HTTP route handlers for the portal.
//!
//! Every page of the onboarding flow is a JSON view model; actions answer
//! with either a fresh view model or a redirect.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                                  - Redirect to login or profile
//! PUT    /locale                            - Set display language
//!
//! # Auth (rate limited)
//! GET    /auth/login                        - Login view
//! POST   /auth/login                        - Login action
//! POST   /auth/logout                       - Logout action
//! POST   /auth/password-reset/request       - Send reset code
//! POST   /auth/password-reset/verify        - Check reset code
//! POST   /auth/password-reset/complete      - Set new password
//!
//! # Registration wizard (rate limited)
//! GET    /register                          - Current wizard view
//! DELETE /register                          - Abandon the draft
//! PATCH  /register/fields                   - Set field values
//! PUT    /register/locale                   - Switch wizard language
//! POST   /register/next                     - Advance a step
//! POST   /register/previous                 - Go back a step
//! POST   /register/postal-code              - Type postal code, debounced autofill
//! POST   /register/submit                   - Create the account
//!
//! # Dashboard (requires auth)
//! GET    /dashboard                         - Redirect to profile
//! GET    /dashboard/profile                 - Profile view
//! POST   /dashboard/profile/reauthenticate  - Confirm password before edits
//! PUT    /dashboard/profile/basic           - Edit phone and birth date
//! PUT    /dashboard/profile/address         - Edit address
//! PUT    /dashboard/profile/cultural        - Edit preferences
//! GET    /dashboard/profile/address/lookup/{postal_code}
//! GET    /dashboard/financial               - Billing preferences
//! PUT    /dashboard/financial               - Change preferred currency
//! GET    /dashboard/help                    - FAQ
//!
//! # Pricing
//! GET    /pricing                           - Plan offers
//! GET    /pricing/checkout/{plan}           - Redirect to payment link
//!
//! # Legal
//! GET    /terms-conditions
//! GET    /privacy-policy
//! ```

pub mod auth;
pub mod dashboard;
pub mod legal;
pub mod password_reset;
pub mod pricing;
pub mod register;

use axum::{
    Json, Router,
    response::Redirect,
    routing::{get, patch, post, put},
};
use chrono::{NaiveDate, Utc};
use nb1_core::{Field, Locale, RegistrationSchema, ValidationError, Wizard, validation};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::Result;
use crate::middleware::{OptionalAuth, api_rate_limiter, auth_rate_limiter};
use crate::models::session_keys;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/password-reset/request", post(password_reset::request))
        .route("/password-reset/verify", post(password_reset::verify))
        .route("/password-reset/complete", post(password_reset::complete))
        .layer(auth_rate_limiter())
}

/// Create the registration wizard router.
pub fn register_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(register::show).delete(register::abandon))
        .route("/fields", patch(register::set_fields))
        .route("/locale", put(register::set_locale))
        .route("/next", post(register::next))
        .route("/previous", post(register::previous))
        .route("/postal-code", post(register::postal_code))
        .route("/submit", post(register::submit))
        .layer(api_rate_limiter())
}

/// Create the dashboard router.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/profile", get(dashboard::profile))
        .route("/profile/reauthenticate", post(dashboard::reauthenticate))
        .route("/profile/basic", put(dashboard::update_basic))
        .route("/profile/address", put(dashboard::update_address))
        .route("/profile/cultural", put(dashboard::update_cultural))
        .route(
            "/profile/address/lookup/{postal_code}",
            get(dashboard::lookup_address),
        )
        .route(
            "/financial",
            get(dashboard::financial).put(dashboard::update_financial),
        )
        .route("/help", get(dashboard::help))
}

/// Create the pricing router.
pub fn pricing_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pricing::index))
        .route("/checkout/{plan}", get(pricing::checkout))
}

/// Create all routes for the portal.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/locale", put(set_locale))
        .nest("/auth", auth_routes())
        .nest("/register", register_routes())
        .nest("/dashboard", dashboard_routes())
        .nest("/pricing", pricing_routes())
        .route("/terms-conditions", get(legal::terms))
        .route("/privacy-policy", get(legal::privacy))
}

async fn home(OptionalAuth(user): OptionalAuth) -> Redirect {
    if user.is_some() {
        Redirect::to("/dashboard/profile")
    } else {
        Redirect::to("/auth/login")
    }
}

/// Body of `PUT /locale`.
#[derive(Debug, Deserialize)]
pub struct LocaleForm {
    pub locale: String,
}

#[derive(Debug, Serialize)]
pub struct LocaleView {
    pub locale: Locale,
    pub available: [Locale; 3],
}

/// Switch the display language for every view of this session.
async fn set_locale(session: Session, Json(form): Json<LocaleForm>) -> Result<Json<LocaleView>> {
    let current = session_locale(&session).await;
    let locale: Locale = validation::check_option(&form.locale).map_err(|v| {
        ValidationError {
            errors: vec![RegistrationSchema::new(current).error(Field::Language, v)],
        }
    })?;

    session.insert(session_keys::LOCALE, locale).await?;
    if let Some(mut wizard) = session
        .get::<Wizard>(session_keys::REGISTRATION_DRAFT)
        .await?
    {
        wizard.set_locale(locale);
        session
            .insert(session_keys::REGISTRATION_DRAFT, &wizard)
            .await?;
    }

    Ok(Json(LocaleView {
        locale,
        available: Locale::ALL,
    }))
}

/// Display language of the session, English until chosen.
pub(crate) async fn session_locale(session: &Session) -> Locale {
    session
        .get::<Locale>(session_keys::LOCALE)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Reference date for birth date checks.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
