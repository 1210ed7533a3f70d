//! Core types for the NB1 portal.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod locale;
pub mod password;
pub mod phone;
pub mod postal_code;
pub mod price;
pub mod status;

pub use credential::{Password, SessionToken};
pub use email::{Email, EmailError};
pub use id::{DraftId, UserId};
pub use locale::{Locale, UnknownLocale};
pub use password::{MIN_PASSWORD_LENGTH, PasswordPolicy, PasswordViolation};
pub use phone::{Phone, PhoneCountry, PhoneError};
pub use postal_code::{PostalCode, PostalCodeError, digits_only};
pub use price::{Currency, Price, UnknownCurrency};
pub use status::{PlanStatus, UserStatus};
