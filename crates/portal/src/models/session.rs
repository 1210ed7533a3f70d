//! Session-related types.

use chrono::{DateTime, TimeDelta, Utc};
use nb1_core::{Email, SessionToken, UserProfile};
use serde::{Deserialize, Serialize};

/// The logged-in user as seen by a handler.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Bearer credential for the webhook backend.
    pub token: SessionToken,
    /// Profile cached at login or on the last fetch.
    pub profile: Option<UserProfile>,
}

/// Marker left in the session after a successful registration.
///
/// Lets the new user open a checkout link before ever logging in, for a
/// bounded time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JustRegistered {
    pub email: Email,
    pub registered_at: DateTime<Utc>,
}

impl JustRegistered {
    #[must_use]
    pub const fn new(email: Email, registered_at: DateTime<Utc>) -> Self {
        Self {
            email,
            registered_at,
        }
    }

    /// Whether `now` is within `grace` of the registration.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, grace: TimeDelta) -> bool {
        now >= self.registered_at && now - self.registered_at <= grace
    }
}

/// Whether a re-authentication stamp still allows profile edits.
#[must_use]
pub fn reauth_is_fresh(stamp: DateTime<Utc>, now: DateTime<Utc>, window: TimeDelta) -> bool {
    now >= stamp && now - stamp <= window
}

/// Session keys.
pub mod keys {
    /// Bearer token returned by the login call.
    pub const SESSION_TOKEN: &str = "session_token";

    /// Cached [`nb1_core::UserProfile`].
    pub const USER_DATA: &str = "user_data";

    /// Cached [`nb1_core::FinancialPreferences`].
    pub const FINANCIAL_DATA: &str = "financial_data";

    /// In-progress [`nb1_core::Wizard`].
    pub const REGISTRATION_DRAFT: &str = "registration_draft";

    /// [`super::JustRegistered`] marker.
    pub const JUST_REGISTERED: &str = "just_registered";

    /// In-progress [`nb1_core::PasswordResetFlow`].
    pub const PASSWORD_RESET: &str = "password_reset";

    /// Time of the last password confirmation on the profile page.
    pub const REAUTHENTICATED_AT: &str = "reauthenticated_at";

    /// Display language.
    pub const LOCALE: &str = "locale";
}
