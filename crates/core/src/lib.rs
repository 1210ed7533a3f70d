//! NB1 Core - Domain library for the NB1 onboarding portal.
//!
//! This crate holds everything about the portal that does not touch the
//! network:
//! - value types for the fields users type in (e-mail, postal code, phone,
//!   passwords, locale, currency)
//! - the locale-aware registration schema and its localized messages
//! - the three-step registration wizard
//! - the password reset flow and the pricing catalog
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no HTTP
//! clients, no sessions, no clocks except where a caller passes one in. The
//! `portal` crate stores these values in the user's session and drives them
//! from its route handlers.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for e-mails, ids, credentials and codes
//! - [`i18n`] - Message keys and their `en`/`es`/`pt` texts
//! - [`catalog`] - Fixed option lists for the cultural step
//! - [`validation`] - Field rules and the locale-bound schema
//! - [`profile`] - User profile, profile edits and address suggestions
//! - [`wizard`] - Registration draft and step state machine
//! - [`reset`] - Password reset stages
//! - [`pricing`] - Plans and their prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod i18n;
pub mod pricing;
pub mod profile;
pub mod reset;
pub mod types;
pub mod validation;
pub mod wizard;

pub use i18n::MessageKey;
pub use pricing::{Plan, PlanOffer, UnknownPlan};
pub use profile::{
    AddressSuggestion, AddressUpdate, BasicInfoUpdate, CulturalUpdate, FinancialPreferences,
    LookupOutcome, UserProfile,
};
pub use reset::{PasswordResetFlow, ResetError, ResetStage};
pub use types::*;
pub use validation::{Field, FieldError, RegistrationSchema, ValidationError, Violation};
pub use wizard::{
    FieldValue, NewAccount, RegistrationDraft, Step, SubmitAction, Wizard, WizardError, WizardView,
};
