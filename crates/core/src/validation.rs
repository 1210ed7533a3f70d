//! Field rules and the locale-bound registration schema.
//!
//! Whether a value passes never depends on the locale. The locale only picks
//! the wording of the [`FieldError::message`], so the schema is rebuilt
//! whenever the display language changes while rule outcomes stay put.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::i18n::MessageKey;
use crate::types::{
    Currency, Email, Locale, PasswordPolicy, PasswordViolation, Phone, PhoneCountry, PhoneError,
    PostalCode, PostalCodeError,
};
use crate::wizard::RegistrationDraft;

/// Accepted values of the gender select.
pub const GENDERS: [&str; 3] = ["male", "female", "other"];

/// Earliest accepted year of birth.
pub const MIN_BIRTH_YEAR: i32 = 1900;

/// A user-editable field.
///
/// Serialized names are the keys clients send in `PATCH /register/fields`
/// and find in `fields` of a 422 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    FullName,
    Email,
    PhoneCountry,
    Phone,
    Password,
    ConfirmPassword,
    DateOfBirth,
    Gender,
    Language,
    PreferredCurrency,
    PostalCode,
    Country,
    State,
    City,
    Address,
    Number,
    AddressComplement,
    Hobbies,
    FavoriteMovieGenres,
    FavoriteSeriesGenres,
    Code,
}

impl Field {
    /// Whether the field holds a multi-select list rather than text.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(
            self,
            Self::Hobbies | Self::FavoriteMovieGenres | Self::FavoriteSeriesGenres
        )
    }

    /// Message shown when the field is left empty.
    #[must_use]
    pub const fn required_key(self) -> MessageKey {
        match self {
            Self::FullName => MessageKey::FullNameRequired,
            Self::Email => MessageKey::InvalidEmail,
            Self::PhoneCountry | Self::Phone => MessageKey::PhoneRequired,
            Self::Password | Self::ConfirmPassword => MessageKey::PasswordRequired,
            Self::DateOfBirth => MessageKey::DateOfBirthRequired,
            Self::Gender => MessageKey::GenderRequired,
            Self::Language => MessageKey::LanguageRequired,
            Self::PreferredCurrency => MessageKey::CurrencyRequired,
            Self::PostalCode => MessageKey::PostalCodeRequired,
            Self::Country => MessageKey::CountryRequired,
            Self::State => MessageKey::StateRequired,
            Self::City => MessageKey::CityRequired,
            Self::Address => MessageKey::StreetRequired,
            Self::Number => MessageKey::NumberRequired,
            Self::Code => MessageKey::CodeRequired,
            Self::AddressComplement
            | Self::Hobbies
            | Self::FavoriteMovieGenres
            | Self::FavoriteSeriesGenres => MessageKey::UnknownOption,
        }
    }

    /// Catalog backing a multi-select field.
    #[must_use]
    pub const fn catalog(self) -> Option<Catalog> {
        match self {
            Self::Hobbies => Some(Catalog::Hobbies),
            Self::FavoriteMovieGenres => Some(Catalog::MovieGenres),
            Self::FavoriteSeriesGenres => Some(Catalog::SeriesGenres),
            _ => None,
        }
    }
}

/// The rule a value broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    Required,
    InvalidEmail,
    InvalidPhone,
    Password(PasswordViolation),
    Mismatch,
    InvalidDate,
    InvalidPostalCode,
    UnknownOption,
    InvalidCode,
}

impl Violation {
    /// Message key for this violation on `field`.
    #[must_use]
    pub const fn message_key(self, field: Field) -> MessageKey {
        match self {
            Self::Required => field.required_key(),
            Self::InvalidEmail => MessageKey::InvalidEmail,
            Self::InvalidPhone => MessageKey::InvalidPhone,
            Self::Password(PasswordViolation::TooShort) => MessageKey::PasswordTooShort,
            Self::Password(PasswordViolation::Complexity) => MessageKey::PasswordComplexity,
            Self::Password(PasswordViolation::MissingUppercase) => {
                MessageKey::PasswordMissingUppercase
            }
            Self::Password(PasswordViolation::MissingLowercase) => {
                MessageKey::PasswordMissingLowercase
            }
            Self::Password(PasswordViolation::MissingSpecial) => MessageKey::PasswordMissingSpecial,
            Self::Mismatch => MessageKey::PasswordsDontMatch,
            Self::InvalidDate => MessageKey::InvalidDateOfBirth,
            Self::InvalidPostalCode => MessageKey::InvalidPostalCode,
            Self::UnknownOption => MessageKey::UnknownOption,
            Self::InvalidCode => MessageKey::InvalidCode,
        }
    }
}

/// A failed field with its localized message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    pub violation: Violation,
    pub message: &'static str,
}

/// One or more fields failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed for {count} field(s)", count = .errors.len())]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// `Ok` when `errors` is empty.
    ///
    /// # Errors
    ///
    /// Returns the collected errors otherwise.
    pub fn check(errors: Vec<FieldError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self { errors })
        }
    }

    /// The fields that failed, in error order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.errors.iter().map(|e| e.field)
    }
}

/// Validation rules bound to a display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistrationSchema {
    locale: Locale,
}

impl RegistrationSchema {
    #[must_use]
    pub const fn new(locale: Locale) -> Self {
        Self { locale }
    }

    #[must_use]
    pub const fn locale(self) -> Locale {
        self.locale
    }

    /// Build a localized error.
    #[must_use]
    pub const fn error(self, field: Field, violation: Violation) -> FieldError {
        FieldError {
            field,
            violation,
            message: violation.message_key(field).text(self.locale),
        }
    }

    /// Validate the given fields of a draft.
    #[must_use]
    pub fn validate(
        self,
        draft: &RegistrationDraft,
        fields: &[Field],
        today: NaiveDate,
    ) -> Vec<FieldError> {
        fields
            .iter()
            .filter_map(|&field| {
                check_draft_field(draft, field, today).map(|v| self.error(field, v))
            })
            .collect()
    }

    /// Validate a new password for the reset flow.
    #[must_use]
    pub fn validate_new_password(self, password: &str, confirm: &str) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if password.is_empty() {
            errors.push(self.error(Field::Password, Violation::Required));
        } else if let Err(v) = PasswordPolicy::Reset.check(password) {
            errors.push(self.error(Field::Password, Violation::Password(v)));
        }
        if password != confirm {
            errors.push(self.error(Field::ConfirmPassword, Violation::Mismatch));
        }
        errors
    }
}

/// Check one field of a draft.
fn check_draft_field(draft: &RegistrationDraft, field: Field, today: NaiveDate) -> Option<Violation> {
    let outcome = match field {
        Field::FullName => required(&draft.full_name).map(drop),
        Field::Email => check_email(&draft.email).map(drop),
        Field::Phone => check_phone(draft.phone_country, &draft.phone).map(drop),
        Field::Password => {
            if draft.password.is_empty() {
                Err(Violation::Required)
            } else {
                PasswordPolicy::Registration
                    .check(draft.password.expose())
                    .map_err(Violation::Password)
            }
        }
        Field::ConfirmPassword => {
            if draft.confirm_password.is_empty() {
                Err(Violation::Required)
            } else if draft.confirm_password == draft.password {
                Ok(())
            } else {
                Err(Violation::Mismatch)
            }
        }
        Field::DateOfBirth => check_birth_date(&draft.date_of_birth, today).map(drop),
        Field::Gender => check_gender(&draft.gender).map(drop),
        Field::Language => check_option::<Locale>(&draft.language).map(drop),
        Field::PreferredCurrency => check_option::<Currency>(&draft.preferred_currency).map(drop),
        Field::PostalCode => check_postal_code(&draft.postal_code).map(drop),
        Field::Country => required(&draft.country).map(drop),
        Field::State => required(&draft.state).map(drop),
        Field::City => required(&draft.city).map(drop),
        Field::Address => required(&draft.address).map(drop),
        Field::Number => required(&draft.number).map(drop),
        Field::Hobbies => check_selection(Catalog::Hobbies, &draft.hobbies).map(drop),
        Field::FavoriteMovieGenres => {
            check_selection(Catalog::MovieGenres, &draft.favorite_movie_genres).map(drop)
        }
        Field::FavoriteSeriesGenres => {
            check_selection(Catalog::SeriesGenres, &draft.favorite_series_genres).map(drop)
        }
        Field::PhoneCountry | Field::AddressComplement | Field::Code => Ok(()),
    };
    outcome.err()
}

/// Trimmed non-empty text.
///
/// # Errors
///
/// [`Violation::Required`] when blank.
pub fn required(value: &str) -> Result<&str, Violation> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Violation::Required)
    } else {
        Ok(trimmed)
    }
}

/// # Errors
///
/// [`Violation::Required`] when blank, [`Violation::InvalidEmail`] otherwise.
pub fn check_email(value: &str) -> Result<Email, Violation> {
    let value = required(value)?;
    Email::parse(value).map_err(|_| Violation::InvalidEmail)
}

/// # Errors
///
/// [`Violation::Required`] when blank, [`Violation::InvalidPhone`] when the
/// digit count is out of range.
pub fn check_phone(country: PhoneCountry, value: &str) -> Result<Phone, Violation> {
    Phone::parse(country, value).map_err(|e| match e {
        PhoneError::Empty => Violation::Required,
        PhoneError::Length { .. } | PhoneError::UnknownCountry => Violation::InvalidPhone,
    })
}

/// ISO date, not in the future, born in [`MIN_BIRTH_YEAR`] or later.
///
/// # Errors
///
/// [`Violation::Required`] when blank, [`Violation::InvalidDate`] otherwise.
pub fn check_birth_date(value: &str, today: NaiveDate) -> Result<NaiveDate, Violation> {
    let value = required(value)?;
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| Violation::InvalidDate)?;
    if date > today || date.year() < MIN_BIRTH_YEAR {
        return Err(Violation::InvalidDate);
    }
    Ok(date)
}

/// # Errors
///
/// [`Violation::Required`] when blank, [`Violation::InvalidPostalCode`] when
/// not eight digits.
pub fn check_postal_code(value: &str) -> Result<PostalCode, Violation> {
    PostalCode::parse(value).map_err(|e| match e {
        PostalCodeError::Empty => Violation::Required,
        PostalCodeError::Length { .. } => Violation::InvalidPostalCode,
    })
}

/// # Errors
///
/// [`Violation::Required`] when blank, [`Violation::UnknownOption`] when not
/// one of [`GENDERS`].
pub fn check_gender(value: &str) -> Result<&'static str, Violation> {
    let value = required(value)?;
    GENDERS
        .iter()
        .copied()
        .find(|g| g.eq_ignore_ascii_case(value))
        .ok_or(Violation::UnknownOption)
}

/// Parse a select value.
///
/// # Errors
///
/// [`Violation::Required`] when blank, [`Violation::UnknownOption`] when it
/// does not parse.
pub fn check_option<T: std::str::FromStr>(value: &str) -> Result<T, Violation> {
    required(value)?.parse().map_err(|_| Violation::UnknownOption)
}

/// # Errors
///
/// [`Violation::UnknownOption`] when a value is not in the catalog.
pub fn check_selection(catalog: Catalog, values: &[String]) -> Result<Vec<String>, Violation> {
    catalog
        .normalize(values)
        .map_err(|_| Violation::UnknownOption)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_birth_date_bounds() {
        assert!(check_birth_date("1990-04-12", today()).is_ok());
        assert_eq!(check_birth_date("", today()), Err(Violation::Required));
        assert_eq!(
            check_birth_date("2030-01-01", today()),
            Err(Violation::InvalidDate)
        );
        assert_eq!(
            check_birth_date("1899-12-31", today()),
            Err(Violation::InvalidDate)
        );
        assert_eq!(
            check_birth_date("12/04/1990", today()),
            Err(Violation::InvalidDate)
        );
    }

    #[test]
    fn test_postal_code_violations() {
        assert_eq!(check_postal_code(""), Err(Violation::Required));
        assert_eq!(check_postal_code("123"), Err(Violation::InvalidPostalCode));
        assert!(check_postal_code("01310-930").is_ok());
    }

    #[test]
    fn test_messages_follow_locale_not_outcome() {
        let en = RegistrationSchema::new(Locale::En).error(Field::City, Violation::Required);
        let pt = RegistrationSchema::new(Locale::Pt).error(Field::City, Violation::Required);
        assert_eq!(en.violation, pt.violation);
        assert_eq!(en.message, "City is required");
        assert_eq!(pt.message, "A cidade é obrigatória");
    }

    #[test]
    fn test_reset_password_rules() {
        let schema = RegistrationSchema::new(Locale::En);
        assert!(schema.validate_new_password("Reset#pass", "Reset#pass").is_empty());

        let errors = schema.validate_new_password("reset#pass", "other");
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec![Field::Password, Field::ConfirmPassword]);
        assert_eq!(
            errors[0].violation,
            Violation::Password(PasswordViolation::MissingUppercase)
        );
    }

    #[test]
    fn test_gender_and_options() {
        assert_eq!(check_gender("Female"), Ok("female"));
        assert_eq!(check_gender("robot"), Err(Violation::UnknownOption));
        assert_eq!(check_option::<Currency>("eur"), Ok(Currency::EUR));
        assert_eq!(check_option::<Locale>(""), Err(Violation::Required));
    }

    #[test]
    fn test_validation_error_check() {
        assert!(ValidationError::check(Vec::new()).is_ok());
        let err = ValidationError::check(vec![
            RegistrationSchema::default().error(Field::Email, Violation::InvalidEmail),
        ])
        .unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), vec![Field::Email]);
        assert_eq!(err.to_string(), "validation failed for 1 field(s)");
    }
}
