//! Authentication extractors and session helpers.
//!
//! A user is logged in when the session holds a bearer token. The cached
//! profile is optional; handlers that need it fetch it on demand.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use nb1_core::{Locale, SessionToken, UserProfile};
use tower_sessions::Session;
use tracing::{info, warn};

use crate::error::{AppError, LOGIN_PATH, clear_sentry_user};
use crate::models::{CurrentUser, session_keys};
use crate::webhook::WebhookError;

/// Extractor that requires a logged-in user.
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     user.profile.map(|p| p.full_name).unwrap_or_default()
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection for [`RequireAuth`].
pub enum AuthRejection {
    /// No token in the session.
    RedirectToLogin,
    /// The session layer is missing.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

async fn load_current_user(session: &Session) -> Option<CurrentUser> {
    let token: SessionToken = session
        .get(session_keys::SESSION_TOKEN)
        .await
        .ok()
        .flatten()
        .filter(|t: &SessionToken| !t.is_empty())?;
    let profile = session
        .get::<UserProfile>(session_keys::USER_DATA)
        .await
        .ok()
        .flatten();
    Some(CurrentUser { token, profile })
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        load_current_user(session)
            .await
            .map(Self)
            .ok_or(AuthRejection::RedirectToLogin)
    }
}

/// Extractor that optionally gets the current user.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => load_current_user(session).await,
            None => None,
        };
        Ok(Self(user))
    }
}

/// Store a fresh login.
///
/// The session id is cycled and everything a previous login left behind is
/// dropped. Only the display language carries over.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    token: &SessionToken,
    profile: &UserProfile,
) -> Result<(), tower_sessions::session::Error> {
    let locale = session.get::<Locale>(session_keys::LOCALE).await?;
    session.cycle_id().await?;
    session.clear().await;
    if let Some(locale) = locale {
        session.insert(session_keys::LOCALE, locale).await?;
    }
    session.insert(session_keys::SESSION_TOKEN, token).await?;
    session.insert(session_keys::USER_DATA, profile).await
}

/// Drop everything tied to the login (logout or expiry).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

/// Convert a webhook failure on an authenticated call into an [`AppError`].
///
/// A `401` means the backend no longer accepts the token, so the whole
/// session is flushed and the client is sent to the login page.
pub async fn expire_on_unauthorized<T>(
    session: &Session,
    result: Result<T, WebhookError>,
) -> Result<T, AppError> {
    match result {
        Ok(value) => Ok(value),
        Err(WebhookError::Unauthorized) => {
            info!("Backend rejected session token, expiring session");
            if let Err(e) = clear_current_user(session).await {
                warn!(error = %e, "Failed to flush expired session");
            }
            clear_sentry_user();
            Err(AppError::SessionExpired)
        }
        Err(e) => Err(AppError::Webhook(e)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn profile() -> UserProfile {
        UserProfile {
            email: "ana@example.com".to_string(),
            ..UserProfile::default()
        }
    }

    #[tokio::test]
    async fn test_set_and_load_user() {
        let session = session();
        set_current_user(&session, &SessionToken::new("tok"), &profile())
            .await
            .unwrap();

        let user = load_current_user(&session).await.unwrap();
        assert_eq!(user.token.expose(), "tok");
        assert_eq!(user.profile.unwrap().email, "ana@example.com");
    }

    #[tokio::test]
    async fn test_new_login_drops_previous_login_state() {
        let session = session();
        set_current_user(&session, &SessionToken::new("tok-a"), &profile())
            .await
            .unwrap();
        session.insert(session_keys::LOCALE, Locale::Pt).await.unwrap();
        session
            .insert(session_keys::REAUTHENTICATED_AT, chrono::Utc::now())
            .await
            .unwrap();
        session
            .insert(session_keys::FINANCIAL_DATA, "EUR")
            .await
            .unwrap();

        let bob = UserProfile {
            email: "bob@example.com".to_string(),
            ..UserProfile::default()
        };
        set_current_user(&session, &SessionToken::new("tok-b"), &bob)
            .await
            .unwrap();

        let user = load_current_user(&session).await.unwrap();
        assert_eq!(user.token.expose(), "tok-b");
        assert_eq!(user.profile.unwrap().email, "bob@example.com");
        for key in [
            session_keys::REAUTHENTICATED_AT,
            session_keys::FINANCIAL_DATA,
            session_keys::JUST_REGISTERED,
            session_keys::PASSWORD_RESET,
        ] {
            assert!(session.get_value(key).await.unwrap().is_none(), "{key} kept");
        }
        assert_eq!(
            session.get::<Locale>(session_keys::LOCALE).await.unwrap(),
            Some(Locale::Pt)
        );
    }

    #[tokio::test]
    async fn test_unauthorized_flushes_session() {
        let session = session();
        set_current_user(&session, &SessionToken::new("tok"), &profile())
            .await
            .unwrap();

        let result: Result<(), AppError> =
            expire_on_unauthorized(&session, Err(WebhookError::Unauthorized)).await;

        assert!(matches!(result, Err(AppError::SessionExpired)));
        assert!(load_current_user(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_other_errors_keep_session() {
        let session = session();
        set_current_user(&session, &SessionToken::new("tok"), &profile())
            .await
            .unwrap();

        let result: Result<(), AppError> = expire_on_unauthorized(
            &session,
            Err(WebhookError::Api {
                status: 500,
                message: String::new(),
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::Webhook(_))));
        assert!(load_current_user(&session).await.is_some());
    }
}
