//! Password reset stages.
//!
//! The flow is e-mail, then code, then new password. The portal keeps a
//! [`PasswordResetFlow`] in the session so a client cannot jump straight to
//! setting a password.

use serde::{Deserialize, Serialize};

use crate::types::Email;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetStage {
    /// Waiting for the account e-mail.
    #[default]
    Email,
    /// Code sent; waiting for the user to enter it.
    Code,
    /// Code verified; waiting for the new password.
    NewPassword,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResetError {
    #[error("password reset is at the {actual:?} stage, expected {expected:?}")]
    OutOfOrder {
        expected: ResetStage,
        actual: ResetStage,
    },
}

/// Progress of one password reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetFlow {
    stage: ResetStage,
    email: Option<Email>,
}

impl PasswordResetFlow {
    #[must_use]
    pub const fn stage(&self) -> ResetStage {
        self.stage
    }

    #[must_use]
    pub const fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    /// The e-mail being reset, provided the flow is at `stage`.
    ///
    /// # Errors
    ///
    /// [`ResetError::OutOfOrder`] at any other stage.
    pub fn email_at(&self, stage: ResetStage) -> Result<&Email, ResetError> {
        match (&self.email, self.stage == stage) {
            (Some(email), true) => Ok(email),
            _ => Err(ResetError::OutOfOrder {
                expected: stage,
                actual: self.stage,
            }),
        }
    }

    /// A code was sent to `email`. Always allowed; restarts the flow.
    pub fn code_sent(&mut self, email: Email) {
        self.email = Some(email);
        self.stage = ResetStage::Code;
    }

    /// The code was accepted.
    ///
    /// # Errors
    ///
    /// [`ResetError::OutOfOrder`] unless a code was sent.
    pub fn code_verified(&mut self) -> Result<(), ResetError> {
        self.email_at(ResetStage::Code)?;
        self.stage = ResetStage::NewPassword;
        Ok(())
    }
}
