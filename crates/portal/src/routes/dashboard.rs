//! Logged-in dashboard: profile, billing preferences and help.
//!
//! Profile edits need a password confirmation from the last few minutes
//! (`REAUTH_WINDOW_MINUTES`). Any `401` from the backend expires the
//! session.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use chrono::{DateTime, Utc};
use nb1_core::{
    AddressUpdate, BasicInfoUpdate, Currency, CulturalUpdate, Field, FinancialPreferences,
    Locale, LookupOutcome, MessageKey, RegistrationSchema, UserProfile, ValidationError,
    Violation, validation,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use super::{session_locale, today};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{RequireAuth, expire_on_unauthorized};
use crate::models::session::reauth_is_fresh;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;
use crate::webhook::WebhookError;

/// Support address shown on the help page.
pub const SUPPORT_EMAIL: &str = "support@nb1.ai";

// =============================================================================
// View Models
// =============================================================================

/// Sidebar entry.
#[derive(Debug, Clone, Serialize)]
pub struct NavEntry {
    pub key: &'static str,
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

fn nav(locale: Locale, active: &str) -> Vec<NavEntry> {
    [
        ("profile", MessageKey::NavProfile, "/dashboard/profile"),
        ("financial", MessageKey::NavFinancial, "/dashboard/financial"),
        ("help", MessageKey::NavHelp, "/dashboard/help"),
    ]
    .into_iter()
    .map(|(key, label, href)| NavEntry {
        key,
        label: label.text(locale),
        href,
        active: key == active,
    })
    .collect()
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub locale: Locale,
    pub nav: Vec<NavEntry>,
    pub profile: UserProfile,
    /// Edits are accepted until this instant; `None` means a password
    /// confirmation is needed first.
    pub editable_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ReauthView {
    pub editable_until: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AddressLookupView {
    pub lookup: LookupOutcome,
    pub message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct FinancialView {
    pub locale: Locale,
    pub nav: Vec<NavEntry>,
    pub preferences: FinancialPreferences,
    pub currencies: [Currency; 3],
}

#[derive(Debug, Serialize)]
pub struct FaqEntry {
    pub question: &'static str,
    pub answer: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HelpView {
    pub locale: Locale,
    pub nav: Vec<NavEntry>,
    pub faq: Vec<FaqEntry>,
    pub support_email: &'static str,
}

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ProfileQuery {
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReauthForm {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CurrencyForm {
    pub preferred_currency: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// The cached profile, fetched from the backend when missing or when a
/// refresh is asked for.
async fn load_profile(
    state: &AppState,
    session: &Session,
    user: CurrentUser,
    refresh: bool,
) -> Result<UserProfile> {
    if let Some(profile) = user.profile.filter(|_| !refresh) {
        return Ok(profile);
    }
    let profile =
        expire_on_unauthorized(session, state.webhook().fetch_profile(&user.token).await).await?;
    session.insert(session_keys::USER_DATA, &profile).await?;
    Ok(profile)
}

async fn editable_until(state: &AppState, session: &Session) -> Result<Option<DateTime<Utc>>> {
    let window = state.config().reauth_window;
    let stamp: Option<DateTime<Utc>> = session.get(session_keys::REAUTHENTICATED_AT).await?;
    Ok(stamp
        .filter(|s| reauth_is_fresh(*s, Utc::now(), window))
        .map(|s| s + window))
}

async fn profile_view(state: &AppState, session: &Session, profile: UserProfile) -> Result<ProfileView> {
    let locale = session_locale(session).await;
    Ok(ProfileView {
        locale,
        nav: nav(locale, "profile"),
        profile,
        editable_until: editable_until(state, session).await?,
    })
}

async fn require_reauth(state: &AppState, session: &Session) -> Result<()> {
    match editable_until(state, session).await? {
        Some(_) => Ok(()),
        None => Err(AppError::ReauthRequired),
    }
}

/// Merge a saved edit into the cached profile and render it.
async fn finish_update(
    state: &AppState,
    session: &Session,
    user: CurrentUser,
    apply: impl FnOnce(&mut UserProfile),
) -> Result<Json<ProfileView>> {
    let mut profile = load_profile(state, session, user, false).await?;
    apply(&mut profile);
    session.insert(session_keys::USER_DATA, &profile).await?;
    Ok(Json(profile_view(state, session, profile).await?))
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn index() -> Redirect {
    Redirect::to("/dashboard/profile")
}

/// Profile page.
#[instrument(skip_all)]
pub async fn profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<ProfileView>> {
    let profile = load_profile(&state, &session, user, query.refresh).await?;
    Ok(Json(profile_view(&state, &session, profile).await?))
}

/// Confirm the password before profile edits.
#[instrument(skip_all)]
pub async fn reauthenticate(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(form): Json<ReauthForm>,
) -> Result<Json<ReauthView>> {
    let locale = session_locale(&session).await;
    if form.password.is_empty() {
        return Err(ValidationError {
            errors: vec![RegistrationSchema::new(locale).error(Field::Password, Violation::Required)],
        }
        .into());
    }

    let profile = load_profile(&state, &session, user, false).await?;
    let check = state.webhook().check_user(&profile.email).await?;
    if !check.status {
        return Err(AppError::NotFound(
            MessageKey::EmailNotFound.text(locale).to_string(),
        ));
    }

    let (fresh, token) = match state.webhook().login(&profile.email, &form.password).await {
        Ok(login) => login,
        Err(WebhookError::Unauthorized) => return Err(AppError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };

    let now = Utc::now();
    session.insert(session_keys::SESSION_TOKEN, &token).await?;
    session.insert(session_keys::USER_DATA, &fresh).await?;
    session.insert(session_keys::REAUTHENTICATED_AT, now).await?;
    add_breadcrumb("profile", "Re-authenticated for profile edits", None);
    info!(user_id = %fresh.id, "Password confirmed for profile edits");

    Ok(Json(ReauthView {
        editable_until: now + state.config().reauth_window,
    }))
}

/// Edit phone and birth date.
#[instrument(skip_all)]
pub async fn update_basic(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(update): Json<BasicInfoUpdate>,
) -> Result<Json<ProfileView>> {
    require_reauth(&state, &session).await?;
    let schema = RegistrationSchema::new(session_locale(&session).await);
    let update = update.validate(schema, today())?;

    expire_on_unauthorized(
        &session,
        state.webhook().update_basic(&user.token, &update).await,
    )
    .await?;
    add_breadcrumb("profile", "Updated basic info", None);
    finish_update(&state, &session, user, |p| update.apply_to(p)).await
}

/// Edit the postal address.
#[instrument(skip_all)]
pub async fn update_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(update): Json<AddressUpdate>,
) -> Result<Json<ProfileView>> {
    require_reauth(&state, &session).await?;
    let schema = RegistrationSchema::new(session_locale(&session).await);
    let update = update.validate(schema)?;

    expire_on_unauthorized(
        &session,
        state.webhook().update_address(&user.token, &update).await,
    )
    .await?;
    add_breadcrumb("profile", "Updated address", None);
    finish_update(&state, &session, user, |p| update.apply_to(p)).await
}

/// Edit hobbies and favorite genres.
#[instrument(skip_all)]
pub async fn update_cultural(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(update): Json<CulturalUpdate>,
) -> Result<Json<ProfileView>> {
    require_reauth(&state, &session).await?;
    let schema = RegistrationSchema::new(session_locale(&session).await);
    let update = update.validate(schema)?;

    expire_on_unauthorized(
        &session,
        state.webhook().update_cultural(&user.token, &update).await,
    )
    .await?;
    add_breadcrumb("profile", "Updated cultural preferences", None);
    finish_update(&state, &session, user, |p| update.apply_to(p)).await
}

/// Address suggestion for the edit form.
pub async fn lookup_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_user): RequireAuth,
    Path(postal_code): Path<String>,
) -> Result<Json<AddressLookupView>> {
    let locale = session_locale(&session).await;
    let code = validation::check_postal_code(&postal_code).map_err(|v| ValidationError {
        errors: vec![RegistrationSchema::new(locale).error(Field::PostalCode, v)],
    })?;

    let lookup = state.autofill().resolve(&code).await;
    let message = match lookup {
        LookupOutcome::Found(_) => None,
        LookupOutcome::NotFound => Some(MessageKey::InvalidPostalCode.text(locale)),
        LookupOutcome::Unavailable => Some(MessageKey::AddressLookupError.text(locale)),
    };
    Ok(Json(AddressLookupView { lookup, message }))
}

/// Billing preferences.
pub async fn financial(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Json<FinancialView>> {
    let profile = load_profile(&state, &session, user, false).await?;
    let cached: Option<FinancialPreferences> = session.get(session_keys::FINANCIAL_DATA).await?;
    let preferences =
        FinancialPreferences::resolve(&profile, cached.map(|c| c.preferred_currency));
    financial_view(&session, preferences).await
}

/// Change the preferred billing currency.
#[instrument(skip_all)]
pub async fn update_financial(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(form): Json<CurrencyForm>,
) -> Result<Json<FinancialView>> {
    let locale = session_locale(&session).await;
    let preferred_currency: Currency =
        validation::check_option(&form.preferred_currency).map_err(|v| ValidationError {
            errors: vec![RegistrationSchema::new(locale).error(Field::PreferredCurrency, v)],
        })?;

    let token = user.token.clone();
    let profile = load_profile(&state, &session, user, false).await?;
    let preferences = FinancialPreferences {
        billing_email: profile.email,
        preferred_currency,
    };

    expire_on_unauthorized(
        &session,
        state.webhook().update_financial(&token, &preferences).await,
    )
    .await?;
    session
        .insert(session_keys::FINANCIAL_DATA, &preferences)
        .await?;
    add_breadcrumb(
        "financial",
        "Changed preferred currency",
        Some(&[("currency", preferred_currency.code())][..]),
    );

    financial_view(&session, preferences).await
}

async fn financial_view(
    session: &Session,
    preferences: FinancialPreferences,
) -> Result<Json<FinancialView>> {
    let locale = session_locale(session).await;
    Ok(Json(FinancialView {
        locale,
        nav: nav(locale, "financial"),
        preferences,
        currencies: Currency::ALL,
    }))
}

/// Help page.
pub async fn help(session: Session, RequireAuth(_user): RequireAuth) -> Json<HelpView> {
    let locale = session_locale(&session).await;
    Json(HelpView {
        locale,
        nav: nav(locale, "help"),
        faq: faq(locale),
        support_email: SUPPORT_EMAIL,
    })
}

fn faq(locale: Locale) -> Vec<FaqEntry> {
    [
        (MessageKey::FaqProfileQuestion, MessageKey::FaqProfileAnswer),
        (MessageKey::FaqPaymentQuestion, MessageKey::FaqPaymentAnswer),
        (MessageKey::FaqSupportQuestion, MessageKey::FaqSupportAnswer),
    ]
    .into_iter()
    .map(|(question, answer)| FaqEntry {
        question: question.text(locale),
        answer: answer.text(locale),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_marks_active_entry() {
        let entries = nav(Locale::Pt, "financial");
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().filter(|e| e.active).all(|e| e.key == "financial"));
        assert_eq!(entries[0].label, MessageKey::NavProfile.text(Locale::Pt));
    }

    #[test]
    fn test_faq_follows_locale() {
        for locale in Locale::ALL {
            assert!(faq(locale).iter().any(|e| e.answer.contains(SUPPORT_EMAIL)));
        }
        assert_eq!(faq(Locale::Es)[0].question, "¿Cómo actualizo mi perfil?");
    }
}
