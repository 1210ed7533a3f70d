//! Registration wizard.
//!
//! The [`Wizard`] lives in the session under `registration_draft`. Every
//! handler loads it, applies one transition, stores it back and answers
//! with a fresh [`WizardView`].

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use nb1_core::{
    Field, FieldValue, Locale, ValidationError, Wizard, WizardError, WizardView, validation,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use super::{LocaleForm, session_locale, today};
use crate::error::{AppError, LOGIN_PATH, Result, add_breadcrumb};
use crate::lookup::AutofillResult;
use crate::models::{JustRegistered, session_keys};
use crate::state::AppState;

/// Body of `POST /register/postal-code`.
#[derive(Debug, Deserialize)]
pub struct PostalCodeForm {
    pub postal_code: String,
}

/// Answer for a lookup that lost to a newer keystroke.
#[derive(Debug, Serialize)]
pub struct SupersededView {
    pub status: &'static str,
}

async fn load_wizard(session: &Session) -> Result<Wizard> {
    match session.get::<Wizard>(session_keys::REGISTRATION_DRAFT).await? {
        Some(wizard) => Ok(wizard),
        None => Ok(Wizard::new(session_locale(session).await)),
    }
}

async fn save_wizard(session: &Session, wizard: &Wizard) -> Result<()> {
    session
        .insert(session_keys::REGISTRATION_DRAFT, wizard)
        .await?;
    Ok(())
}

/// Current wizard view, starting a draft if there is none.
pub async fn show(session: Session) -> Result<Json<WizardView>> {
    let wizard = load_wizard(&session).await?;
    save_wizard(&session, &wizard).await?;
    Ok(Json(wizard.view(today())))
}

/// Discard the draft.
pub async fn abandon(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    if let Some(wizard) = session
        .remove::<Wizard>(session_keys::REGISTRATION_DRAFT)
        .await?
    {
        // A lookup still waiting re-reads the store, so the removal must be
        // there before it wakes.
        session.save().await?;
        state.autofill().supersede(wizard.id()).await;
        add_breadcrumb("registration", "Draft abandoned", None);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Set one or more field values, keyed by field name.
pub async fn set_fields(
    session: Session,
    Json(fields): Json<BTreeMap<Field, FieldValue>>,
) -> Result<Json<WizardView>> {
    let mut wizard = load_wizard(&session).await?;
    let before = wizard.locale();
    for (field, value) in fields {
        wizard.set_field(field, value)?;
    }
    if wizard.locale() != before {
        session.insert(session_keys::LOCALE, wizard.locale()).await?;
    }
    save_wizard(&session, &wizard).await?;
    Ok(Json(wizard.view(today())))
}

/// Switch the wizard language without touching any value.
pub async fn set_locale(
    session: Session,
    Json(form): Json<LocaleForm>,
) -> Result<Json<WizardView>> {
    let mut wizard = load_wizard(&session).await?;
    let locale: Locale = validation::check_option(&form.locale).map_err(|v| {
        AppError::from(ValidationError {
            errors: vec![wizard.schema().error(Field::Language, v)],
        })
    })?;

    wizard.set_locale(locale);
    session.insert(session_keys::LOCALE, locale).await?;
    save_wizard(&session, &wizard).await?;
    Ok(Json(wizard.view(today())))
}

/// Advance one step. A rejected step answers 422 with the step's errors
/// now visible in the view.
pub async fn next(session: Session) -> Result<(StatusCode, Json<WizardView>)> {
    let mut wizard = load_wizard(&session).await?;
    let today = today();

    let status = match wizard.next(today) {
        Ok(step) => {
            let index = step.index().to_string();
            add_breadcrumb(
                "registration",
                "Advanced wizard step",
                Some(&[("step", index.as_str())][..]),
            );
            StatusCode::OK
        }
        Err(WizardError::Invalid(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        Err(e) => return Err(e.into()),
    };

    save_wizard(&session, &wizard).await?;
    Ok((status, Json(wizard.view(today))))
}

/// Go back one step.
pub async fn previous(session: Session) -> Result<Json<WizardView>> {
    let mut wizard = load_wizard(&session).await?;
    wizard.previous();
    save_wizard(&session, &wizard).await?;
    Ok(Json(wizard.view(today())))
}

/// Store typed postal code digits and, once eight are present, look the
/// address up after the debounce window.
#[instrument(skip(state, session, form))]
pub async fn postal_code(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<PostalCodeForm>,
) -> Result<Response> {
    let mut wizard = load_wizard(&session).await?;
    let draft_id = wizard.id();
    let code = wizard.set_postal_code(&form.postal_code);
    save_wizard(&session, &wizard).await?;
    // Typed digits are stored before the debounce wait.
    session.save().await?;

    let Some(code) = code else {
        state.autofill().supersede(draft_id).await;
        return Ok(Json(wizard.view(today())).into_response());
    };

    let result = state.autofill().debounced(draft_id, &code).await;
    // The session was loaded before the wait; other requests may have
    // written it since. Everything below works on the stored record.
    session.load().await?;

    let outcome = match result {
        AutofillResult::Completed(outcome) => outcome,
        AutofillResult::Superseded => return Ok(superseded()),
    };

    let Some(mut wizard) = session
        .get::<Wizard>(session_keys::REGISTRATION_DRAFT)
        .await?
        .filter(|w| w.id() == draft_id)
    else {
        warn!(postal_code = %code, "Dropping lookup result for a discarded draft");
        return Ok(superseded());
    };

    if wizard.apply_address_lookup(&code, &outcome) {
        save_wizard(&session, &wizard).await?;
        session.save().await?;
    } else {
        warn!(postal_code = %code, "Dropping lookup result for a changed postal code");
    }
    Ok(Json(wizard.view(today())).into_response())
}

fn superseded() -> Response {
    (
        StatusCode::ACCEPTED,
        Json(SupersededView {
            status: "superseded",
        }),
    )
        .into_response()
}

/// Validate every step and create the account.
#[instrument(skip(state, session))]
pub async fn submit(State(state): State<AppState>, session: Session) -> Result<Response> {
    let mut wizard = load_wizard(&session).await?;
    let today = today();

    let account = match wizard.submit(today) {
        Ok(account) => account,
        Err(WizardError::Invalid(_)) => {
            save_wizard(&session, &wizard).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(wizard.view(today))).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    // A late autofill must not write the draft back over the result.
    state.autofill().supersede(wizard.id()).await;
    let reply = state.webhook().create_user(&account).await?;
    if !reply.status {
        info!("Backend refused the registration");
        return Err(AppError::Conflict {
            message: reply
                .message()
                .unwrap_or("An account with this email already exists")
                .to_string(),
            login_url: Some(LOGIN_PATH),
        });
    }

    session
        .remove::<Wizard>(session_keys::REGISTRATION_DRAFT)
        .await?;
    session
        .insert(
            session_keys::JUST_REGISTERED,
            JustRegistered::new(account.email.clone(), Utc::now()),
        )
        .await?;
    add_breadcrumb("registration", "Account created", None);
    info!("Account created");

    Ok(Redirect::to("/pricing").into_response())
}
