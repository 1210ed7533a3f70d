//! User profile as cached in the session, and the edits a user can make.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::Catalog;
use crate::types::{Currency, Locale, PhoneCountry, PlanStatus, UserId, UserStatus};
use crate::validation::{
    Field, FieldError, RegistrationSchema, ValidationError, Violation, check_birth_date,
    check_phone, check_postal_code, check_selection, required,
};

/// Profile snapshot returned by the webhook backend.
///
/// The backend omits or nulls fields freely; every missing value reads as
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    #[serde(deserialize_with = "id_or_number")]
    pub id: UserId,
    #[serde(deserialize_with = "null_default")]
    pub full_name: String,
    #[serde(deserialize_with = "null_default")]
    pub email: String,
    #[serde(deserialize_with = "null_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_default")]
    pub birth_date: String,
    #[serde(deserialize_with = "null_default")]
    pub gender: String,
    #[serde(deserialize_with = "null_default")]
    pub preferred_currency: String,
    #[serde(deserialize_with = "null_default")]
    pub preferred_language: String,
    #[serde(deserialize_with = "null_default")]
    pub postal_code: String,
    #[serde(deserialize_with = "null_default")]
    pub country: String,
    #[serde(deserialize_with = "null_default")]
    pub state: String,
    #[serde(deserialize_with = "null_default")]
    pub city: String,
    #[serde(deserialize_with = "null_default")]
    pub street_address: String,
    #[serde(deserialize_with = "null_default")]
    pub address_number: String,
    #[serde(deserialize_with = "null_default")]
    pub address_complement: String,
    #[serde(deserialize_with = "null_default")]
    pub hobbies: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub favorite_movie_styles: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub favorite_series_styles: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub plan_status: PlanStatus,
    #[serde(deserialize_with = "null_default")]
    pub user_status: UserStatus,
}

impl UserProfile {
    /// Preferred currency, when the stored value is a supported code.
    #[must_use]
    pub fn currency(&self) -> Option<Currency> {
        self.preferred_currency.parse().ok()
    }

    /// Preferred display language, when set.
    #[must_use]
    pub fn locale(&self) -> Option<Locale> {
        self.preferred_language.parse().ok()
    }
}

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn id_or_number<'de, D>(deserializer: D) -> Result<UserId, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(UserId::default()),
        Value::String(s) => Ok(UserId::new(s)),
        Value::Number(n) => Ok(UserId::new(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {other}"
        ))),
    }
}

fn into_result<T>(value: T, errors: Vec<FieldError>) -> Result<T, ValidationError> {
    ValidationError::check(errors).map(|()| value)
}

/// Phone and birth date edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicInfoUpdate {
    #[serde(default, skip_serializing)]
    pub phone_country: PhoneCountry,
    pub phone: String,
    pub birth_date: String,
}

impl BasicInfoUpdate {
    /// Validate and normalize the edit.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(
        &self,
        schema: RegistrationSchema,
        today: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();
        let phone = check_phone(self.phone_country, &self.phone)
            .map_err(|v| errors.push(schema.error(Field::Phone, v)))
            .ok();
        let birth_date = check_birth_date(&self.birth_date, today)
            .map_err(|v| errors.push(schema.error(Field::DateOfBirth, v)))
            .ok();

        let normalized = Self {
            phone_country: self.phone_country,
            phone: phone.map(crate::types::Phone::into_inner).unwrap_or_default(),
            birth_date: birth_date.map(|d| d.to_string()).unwrap_or_default(),
        };
        into_result(normalized, errors)
    }

    pub fn apply_to(&self, profile: &mut UserProfile) {
        profile.phone.clone_from(&self.phone);
        profile.birth_date.clone_from(&self.birth_date);
    }
}

/// Address edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressUpdate {
    pub postal_code: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub street_address: String,
    pub address_number: String,
    #[serde(default)]
    pub address_complement: String,
}

impl AddressUpdate {
    /// Validate and normalize the edit. The complement is optional.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self, schema: RegistrationSchema) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();
        let postal_code = match check_postal_code(&self.postal_code) {
            Ok(code) => code.as_str().to_owned(),
            Err(v) => {
                errors.push(schema.error(Field::PostalCode, v));
                String::new()
            }
        };
        let mut text = |field: Field, value: &str| match required(value) {
            Ok(v) => v.to_owned(),
            Err(v) => {
                errors.push(schema.error(field, v));
                String::new()
            }
        };

        let normalized = Self {
            postal_code,
            country: text(Field::Country, &self.country),
            state: text(Field::State, &self.state),
            city: text(Field::City, &self.city),
            street_address: text(Field::Address, &self.street_address),
            address_number: text(Field::Number, &self.address_number),
            address_complement: self.address_complement.trim().to_owned(),
        };
        into_result(normalized, errors)
    }

    pub fn apply_to(&self, profile: &mut UserProfile) {
        profile.postal_code.clone_from(&self.postal_code);
        profile.country.clone_from(&self.country);
        profile.state.clone_from(&self.state);
        profile.city.clone_from(&self.city);
        profile.street_address.clone_from(&self.street_address);
        profile.address_number.clone_from(&self.address_number);
        profile.address_complement.clone_from(&self.address_complement);
    }
}

/// Cultural preferences edit. Empty lists are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CulturalUpdate {
    pub hobbies: Vec<String>,
    pub favorite_movie_styles: Vec<String>,
    pub favorite_series_styles: Vec<String>,
}

impl CulturalUpdate {
    /// Drop duplicates and reject values outside the catalogs.
    ///
    /// # Errors
    ///
    /// Returns every list with an unknown value.
    pub fn validate(&self, schema: RegistrationSchema) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();
        let mut list = |field: Field, catalog: Catalog, values: &[String]| {
            check_selection(catalog, values).unwrap_or_else(|v: Violation| {
                errors.push(schema.error(field, v));
                Vec::new()
            })
        };

        let normalized = Self {
            hobbies: list(Field::Hobbies, Catalog::Hobbies, &self.hobbies),
            favorite_movie_styles: list(
                Field::FavoriteMovieGenres,
                Catalog::MovieGenres,
                &self.favorite_movie_styles,
            ),
            favorite_series_styles: list(
                Field::FavoriteSeriesGenres,
                Catalog::SeriesGenres,
                &self.favorite_series_styles,
            ),
        };
        into_result(normalized, errors)
    }

    pub fn apply_to(&self, profile: &mut UserProfile) {
        profile.hobbies.clone_from(&self.hobbies);
        profile.favorite_movie_styles.clone_from(&self.favorite_movie_styles);
        profile.favorite_series_styles.clone_from(&self.favorite_series_styles);
    }
}

/// Billing preferences shown on the financial page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialPreferences {
    /// Always the profile e-mail; not editable.
    pub billing_email: String,
    pub preferred_currency: Currency,
}

impl FinancialPreferences {
    /// Preferences derived from a profile: cached choice first, then the
    /// profile's currency, then BRL.
    #[must_use]
    pub fn resolve(profile: &UserProfile, cached: Option<Currency>) -> Self {
        Self {
            billing_email: profile.email.clone(),
            preferred_currency: cached.or_else(|| profile.currency()).unwrap_or_default(),
        }
    }
}

/// Address fields derived from a postal code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSuggestion {
    pub postal_code: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub street: String,
}

/// Result of a postal code lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "address", rename_all = "snake_case")]
pub enum LookupOutcome {
    Found(AddressSuggestion),
    /// The code is well-formed but no provider knows it.
    NotFound,
    /// Every provider failed.
    Unavailable,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_profile_tolerates_missing_and_null_fields() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"id": 42, "email": "ana@example.com", "phone": null, "hobbies": null, "plan_status": "active"}"#,
        )
        .unwrap();
        assert_eq!(profile.id.as_str(), "42");
        assert_eq!(profile.phone, "");
        assert!(profile.hobbies.is_empty());
        assert!(profile.plan_status.is_active());
        assert_eq!(profile.full_name, "");
    }

    #[test]
    fn test_basic_update_normalizes() {
        let update = BasicInfoUpdate {
            phone_country: PhoneCountry::Br,
            phone: "(11) 98765-4321".to_owned(),
            birth_date: "1990-04-12".to_owned(),
        };
        let normalized = update.validate(RegistrationSchema::default(), today()).unwrap();
        assert_eq!(normalized.phone, "+5511987654321");

        let json = serde_json::to_value(&normalized).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"phone": "+5511987654321", "birth_date": "1990-04-12"})
        );
    }

    #[test]
    fn test_address_update_reports_every_missing_field() {
        let update = AddressUpdate {
            postal_code: "0131".to_owned(),
            country: "Brazil".to_owned(),
            state: String::new(),
            city: " ".to_owned(),
            street_address: "Av. Paulista".to_owned(),
            address_number: "1578".to_owned(),
            address_complement: String::new(),
        };
        let err = update.validate(RegistrationSchema::default()).unwrap_err();
        assert_eq!(
            err.fields().collect::<Vec<_>>(),
            vec![Field::PostalCode, Field::State, Field::City]
        );
    }

    #[test]
    fn test_cultural_update_applies() {
        let update = CulturalUpdate {
            hobbies: vec!["chess".to_owned(), "chess".to_owned()],
            favorite_movie_styles: vec!["drama".to_owned()],
            favorite_series_styles: Vec::new(),
        };
        let normalized = update.validate(RegistrationSchema::default()).unwrap();
        let mut profile = UserProfile::default();
        normalized.apply_to(&mut profile);
        assert_eq!(profile.hobbies, vec!["chess".to_owned()]);
        assert_eq!(profile.favorite_movie_styles, vec!["drama".to_owned()]);
    }

    #[test]
    fn test_financial_preferences_resolution() {
        let mut profile = UserProfile {
            email: "ana@example.com".to_owned(),
            ..UserProfile::default()
        };
        assert_eq!(
            FinancialPreferences::resolve(&profile, None).preferred_currency,
            Currency::BRL
        );
        profile.preferred_currency = "USD".to_owned();
        assert_eq!(
            FinancialPreferences::resolve(&profile, None).preferred_currency,
            Currency::USD
        );
        assert_eq!(
            FinancialPreferences::resolve(&profile, Some(Currency::EUR)).preferred_currency,
            Currency::EUR
        );
    }

    #[test]
    fn test_lookup_outcome_wire_shape() {
        let json = serde_json::to_value(LookupOutcome::NotFound).unwrap();
        assert_eq!(json, serde_json::json!({"status": "not_found"}));
    }
}
