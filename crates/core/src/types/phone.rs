//! Phone numbers with a country dial code.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::postal_code::digits_only;

/// Country selected in the phone input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhoneCountry {
    #[default]
    Br,
    Us,
    Es,
}

impl PhoneCountry {
    /// International dial code without the leading `+`.
    #[must_use]
    pub const fn dial_code(self) -> &'static str {
        match self {
            Self::Br => "55",
            Self::Us => "1",
            Self::Es => "34",
        }
    }
}

impl FromStr for PhoneCountry {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "br" => Ok(Self::Br),
            "us" => Ok(Self::Us),
            "es" => Ok(Self::Es),
            _ => Err(PhoneError::UnknownCountry),
        }
    }
}

/// Errors that can occur when parsing a [`Phone`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhoneError {
    #[error("phone number cannot be empty")]
    Empty,
    #[error("phone number must have between {min} and {max} digits")]
    Length { min: usize, max: usize },
    #[error("unsupported phone country")]
    UnknownCountry,
}

/// A phone number in `+<dial code><digits>` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    pub const MIN_DIGITS: usize = 8;
    pub const MAX_DIGITS: usize = 13;

    /// Parse user input for the given country.
    ///
    /// Formatting characters are dropped. When the input already starts with
    /// the country's dial code (`+55 11 ...`), it is not added twice.
    ///
    /// # Errors
    ///
    /// Returns an error when the input has no digits or a national number
    /// outside 8-13 digits.
    pub fn parse(country: PhoneCountry, input: &str) -> Result<Self, PhoneError> {
        let mut digits = digits_only(input);
        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        let dial = country.dial_code();
        if input.trim_start().starts_with('+') && digits.starts_with(dial) {
            digits.drain(..dial.len());
        }

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len()) {
            return Err(PhoneError::Length {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(format!("+{dial}{digits}")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
