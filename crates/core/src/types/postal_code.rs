//! Brazilian postal code (CEP).

use core::fmt;

use serde::{Deserialize, Serialize};

/// A postal code made of exactly eight digits.
///
/// Input separators (`01310-930`, `01.310-930`) are stripped before
/// validation, so the stored value is always the bare digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostalCode(String);

/// Errors that can occur when parsing a [`PostalCode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostalCodeError {
    /// No digits were entered.
    #[error("postal code cannot be empty")]
    Empty,
    /// Wrong number of digits.
    #[error("postal code must have {expected} digits (got {actual})")]
    Length {
        /// Required digit count.
        expected: usize,
        /// Digits found in the input.
        actual: usize,
    },
}

impl PostalCode {
    /// Number of digits in a CEP.
    pub const DIGITS: usize = 8;

    /// Parse a postal code, ignoring any non-digit characters.
    ///
    /// # Errors
    ///
    /// Returns an error when the input has no digits or not exactly eight.
    pub fn parse(input: &str) -> Result<Self, PostalCodeError> {
        let digits = digits_only(input);
        match digits.len() {
            0 => Err(PostalCodeError::Empty),
            Self::DIGITS => Ok(Self(digits)),
            actual => Err(PostalCodeError::Length {
                expected: Self::DIGITS,
                actual,
            }),
        }
    }

    /// The eight digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strip everything but ASCII digits.
#[must_use]
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_separators() {
        assert_eq!(
            PostalCode::parse("01310-930").map(|p| p.as_str().to_owned()),
            Ok("01310930".to_owned())
        );
        assert!(PostalCode::parse("01.310-930").is_ok());
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            PostalCode::parse("0131"),
            Err(PostalCodeError::Length {
                expected: 8,
                actual: 4
            })
        );
        assert_eq!(PostalCode::parse("abc"), Err(PostalCodeError::Empty));
    }
}
