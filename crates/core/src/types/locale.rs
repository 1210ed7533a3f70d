//! Display languages supported by the portal.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A display language.
///
/// The active locale decides the wording of every validation message and
/// button label; it never changes whether a value is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Spanish.
    Es,
    /// Brazilian Portuguese.
    Pt,
}

/// Error returned for an unsupported language code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale: {0}")]
pub struct UnknownLocale(pub String);

impl Locale {
    /// All supported locales, in selector order.
    pub const ALL: [Self; 3] = [Self::En, Self::Es, Self::Pt];

    /// Two-letter language code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Pt => "pt",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            "pt" | "pt-br" => Ok(Self::Pt),
            other => Err(UnknownLocale(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!("en".parse(), Ok(Locale::En));
        assert_eq!(" ES ".parse(), Ok(Locale::Es));
        assert_eq!("pt-BR".parse(), Ok(Locale::Pt));
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_default_is_english() {
        assert_eq!(Locale::default(), Locale::En);
    }
}
