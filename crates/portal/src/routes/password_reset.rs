//! Password reset: e-mail, then code, then new password.
//!
//! The stage lives in the session so a client cannot set a password without
//! having verified a code for the same e-mail.

use axum::{Json, extract::State, response::Redirect};
use nb1_core::{
    Field, MessageKey, PasswordResetFlow, RegistrationSchema, ResetStage, ValidationError,
    Violation, validation,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use super::session_locale;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session_keys;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RequestForm {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteForm {
    pub new_password: String,
    pub confirm_password: String,
}

/// Where the reset flow stands.
#[derive(Debug, Serialize)]
pub struct ResetView {
    pub stage: ResetStage,
    pub email: Option<String>,
    pub message: Option<String>,
}

async fn load_flow(session: &Session) -> Result<PasswordResetFlow> {
    Ok(session
        .get(session_keys::PASSWORD_RESET)
        .await?
        .unwrap_or_default())
}

fn single_error(schema: RegistrationSchema, field: Field, violation: Violation) -> AppError {
    ValidationError {
        errors: vec![schema.error(field, violation)],
    }
    .into()
}

/// Send a reset code when the e-mail belongs to an account.
#[instrument(skip(state, session, form))]
pub async fn request(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RequestForm>,
) -> Result<Json<ResetView>> {
    let locale = session_locale(&session).await;
    let schema = RegistrationSchema::new(locale);
    let email =
        validation::check_email(&form.email).map_err(|v| single_error(schema, Field::Email, v))?;

    let check = state.webhook().check_user(email.as_str()).await?;
    if !check.status {
        let message = check
            .message()
            .map_or_else(|| MessageKey::EmailNotFound.text(locale).to_string(), String::from);
        return Err(AppError::NotFound(message));
    }

    let sent = state.webhook().send_reset_code(email.as_str()).await?;

    let mut flow = load_flow(&session).await?;
    flow.code_sent(email);
    session.insert(session_keys::PASSWORD_RESET, &flow).await?;
    add_breadcrumb("password_reset", "Reset code sent", None);
    info!("Password reset code sent");

    Ok(Json(ResetView {
        stage: flow.stage(),
        email: flow.email().map(|e| e.as_str().to_owned()),
        message: sent.message().map(String::from),
    }))
}

/// Check the code the user received.
#[instrument(skip(state, session, form))]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<VerifyForm>,
) -> Result<Json<ResetView>> {
    let schema = RegistrationSchema::new(session_locale(&session).await);
    let mut flow = load_flow(&session).await?;
    let email = flow.email_at(ResetStage::Code)?.clone();

    let code = form.code.trim();
    if code.is_empty() {
        return Err(single_error(schema, Field::Code, Violation::Required));
    }

    let verified = state.webhook().verify_reset_code(email.as_str(), code).await?;
    if !verified.status {
        return Err(single_error(schema, Field::Code, Violation::InvalidCode));
    }

    flow.code_verified()?;
    session.insert(session_keys::PASSWORD_RESET, &flow).await?;
    add_breadcrumb("password_reset", "Reset code verified", None);

    Ok(Json(ResetView {
        stage: flow.stage(),
        email: Some(email.into_inner()),
        message: verified.message().map(String::from),
    }))
}

/// Set the new password and end the flow.
#[instrument(skip(state, session, form))]
pub async fn complete(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CompleteForm>,
) -> Result<Redirect> {
    let schema = RegistrationSchema::new(session_locale(&session).await);
    let flow = load_flow(&session).await?;
    let email = flow.email_at(ResetStage::NewPassword)?;

    ValidationError::check(schema.validate_new_password(&form.new_password, &form.confirm_password))?;

    state
        .webhook()
        .reset_password(email.as_str(), &form.new_password)
        .await?;

    session
        .remove::<PasswordResetFlow>(session_keys::PASSWORD_RESET)
        .await?;
    add_breadcrumb("password_reset", "Password changed", None);
    info!("Password reset completed");

    Ok(Redirect::to("/auth/login?success=password_reset"))
}
