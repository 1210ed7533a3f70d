//! The three-step registration wizard.
//!
//! A [`Wizard`] owns one registration attempt: the field values typed so
//! far, the current step, which fields the user has touched and the active
//! display language. It is a plain value; the portal keeps it in the user's
//! session and calls one transition per request.
//!
//! Step validity is never stored. Every read evaluates the current step's
//! fields against a schema built from the current locale, so it always
//! agrees with the latest values.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::i18n::MessageKey;
use crate::profile::LookupOutcome;
use crate::types::{
    Currency, DraftId, Email, Locale, Password, PhoneCountry, PostalCode, digits_only,
};
use crate::validation::{
    Field, FieldError, RegistrationSchema, ValidationError, Violation, check_birth_date,
    check_email, check_gender, check_option, check_phone, check_selection,
};

/// A page of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Basic,
    Address,
    /// Optional; may be submitted empty.
    Cultural,
}

impl Step {
    pub const ALL: [Self; 3] = [Self::Basic, Self::Address, Self::Cultural];

    /// Zero-based position.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Basic => 0,
            Self::Address => 1,
            Self::Cultural => 2,
        }
    }

    /// Fields shown on this step, in display order.
    #[must_use]
    pub const fn fields(self) -> &'static [Field] {
        match self {
            Self::Basic => &[
                Field::FullName,
                Field::Email,
                Field::Phone,
                Field::Password,
                Field::ConfirmPassword,
                Field::DateOfBirth,
                Field::Gender,
                Field::Language,
                Field::PreferredCurrency,
            ],
            Self::Address => &[
                Field::PostalCode,
                Field::Country,
                Field::State,
                Field::City,
                Field::Address,
                Field::Number,
                Field::AddressComplement,
            ],
            Self::Cultural => &[
                Field::Hobbies,
                Field::FavoriteMovieGenres,
                Field::FavoriteSeriesGenres,
            ],
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Basic => Some(Self::Address),
            Self::Address => Some(Self::Cultural),
            Self::Cultural => None,
        }
    }

    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Basic => None,
            Self::Address => Some(Self::Basic),
            Self::Cultural => Some(Self::Address),
        }
    }

    #[must_use]
    pub const fn is_last(self) -> bool {
        self.next().is_none()
    }
}

/// Raw field values of one registration attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationDraft {
    pub full_name: String,
    pub email: String,
    pub phone_country: PhoneCountry,
    pub phone: String,
    pub password: Password,
    pub confirm_password: Password,
    pub date_of_birth: String,
    pub gender: String,
    pub language: String,
    pub preferred_currency: String,
    pub postal_code: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub address: String,
    pub number: String,
    pub address_complement: String,
    pub hobbies: Vec<String>,
    pub favorite_movie_genres: Vec<String>,
    pub favorite_series_genres: Vec<String>,
}

/// A value for [`Wizard::set_field`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl RegistrationDraft {
    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        Some(match field {
            Field::FullName => &mut self.full_name,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
            Field::DateOfBirth => &mut self.date_of_birth,
            Field::Gender => &mut self.gender,
            Field::Language => &mut self.language,
            Field::PreferredCurrency => &mut self.preferred_currency,
            Field::PostalCode => &mut self.postal_code,
            Field::Country => &mut self.country,
            Field::State => &mut self.state,
            Field::City => &mut self.city,
            Field::Address => &mut self.address,
            Field::Number => &mut self.number,
            Field::AddressComplement => &mut self.address_complement,
            _ => return None,
        })
    }

    fn list_mut(&mut self, field: Field) -> Option<&mut Vec<String>> {
        match field {
            Field::Hobbies => Some(&mut self.hobbies),
            Field::FavoriteMovieGenres => Some(&mut self.favorite_movie_genres),
            Field::FavoriteSeriesGenres => Some(&mut self.favorite_series_genres),
            _ => None,
        }
    }

    /// Whether any cultural preference was selected.
    #[must_use]
    pub fn has_cultural_selection(&self) -> bool {
        !(self.hobbies.is_empty()
            && self.favorite_movie_genres.is_empty()
            && self.favorite_series_genres.is_empty())
    }
}

/// Label of the terminal action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitAction {
    Submit,
    Skip,
}

/// Errors from wizard transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("already on the last step")]
    LastStep,
    #[error("submit is only available on the last step")]
    NotLastStep,
    #[error("field {0:?} does not accept this kind of value")]
    FieldType(Field),
}

/// Account creation payload for `api/user/create`.
///
/// Keys are camelCase except the two the backend reads in snake case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub full_name: String,
    pub email: Email,
    pub phone: String,
    pub password: Password,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub language: Locale,
    #[serde(rename = "preferred_currency")]
    pub preferred_currency: Currency,
    pub postal_code: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub address: String,
    pub number: String,
    #[serde(rename = "address_complement")]
    pub address_complement: String,
    pub hobbies: Vec<String>,
    pub favorite_movie_genres: Vec<String>,
    pub favorite_series_genres: Vec<String>,
}

/// State of one registration attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wizard {
    id: DraftId,
    step: Step,
    locale: Locale,
    draft: RegistrationDraft,
    touched: BTreeSet<Field>,
    banner: Option<MessageKey>,
}

impl Wizard {
    /// Start an empty draft in `locale`.
    #[must_use]
    pub fn new(locale: Locale) -> Self {
        Self {
            id: DraftId::generate(),
            step: Step::Basic,
            locale,
            draft: RegistrationDraft {
                language: locale.code().to_owned(),
                preferred_currency: Currency::default().code().to_owned(),
                ..RegistrationDraft::default()
            },
            touched: BTreeSet::new(),
            banner: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> DraftId {
        self.id
    }

    #[must_use]
    pub const fn step(&self) -> Step {
        self.step
    }

    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    #[must_use]
    pub const fn draft(&self) -> &RegistrationDraft {
        &self.draft
    }

    #[must_use]
    pub const fn banner(&self) -> Option<MessageKey> {
        self.banner
    }

    #[must_use]
    pub fn is_touched(&self, field: Field) -> bool {
        self.touched.contains(&field)
    }

    /// Schema for the active locale.
    #[must_use]
    pub const fn schema(&self) -> RegistrationSchema {
        RegistrationSchema::new(self.locale)
    }

    /// Set one field and mark it touched.
    ///
    /// Setting `language` to a supported code also switches the locale.
    /// A postal code is stored as its digits and clears the lookup banner.
    ///
    /// # Errors
    ///
    /// [`WizardError::FieldType`] when a list is sent for a text field or
    /// the other way round, or the field is not part of the wizard.
    pub fn set_field(&mut self, field: Field, value: FieldValue) -> Result<(), WizardError> {
        match (field, value) {
            (Field::PostalCode, FieldValue::Text(text)) => {
                self.set_postal_code(&text);
                return Ok(());
            }
            (Field::Password, FieldValue::Text(text)) => self.draft.password = Password::new(text),
            (Field::ConfirmPassword, FieldValue::Text(text)) => {
                self.draft.confirm_password = Password::new(text);
            }
            (Field::PhoneCountry, FieldValue::Text(text)) => {
                self.draft.phone_country = text.parse().map_err(|_| WizardError::FieldType(field))?;
            }
            (Field::Language, FieldValue::Text(text)) => {
                if let Ok(locale) = text.parse::<Locale>() {
                    self.set_locale(locale);
                }
                self.draft.language = text;
            }
            (_, FieldValue::Text(text)) => {
                *self
                    .draft
                    .text_mut(field)
                    .ok_or(WizardError::FieldType(field))? = text;
            }
            (_, FieldValue::List(values)) => {
                *self
                    .draft
                    .list_mut(field)
                    .ok_or(WizardError::FieldType(field))? = values;
            }
        }
        self.touched.insert(field);
        Ok(())
    }

    /// Store typed postal code digits and return the code when it is
    /// complete enough to look up.
    pub fn set_postal_code(&mut self, input: &str) -> Option<PostalCode> {
        self.draft.postal_code = digits_only(input);
        self.touched.insert(Field::PostalCode);
        self.banner = None;
        PostalCode::parse(&self.draft.postal_code).ok()
    }

    /// Switch the display language. Field values are untouched.
    pub const fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Errors of the current step's fields.
    #[must_use]
    pub fn errors(&self, today: NaiveDate) -> Vec<FieldError> {
        self.schema().validate(&self.draft, self.step.fields(), today)
    }

    /// Whether `Next` (or `Submit` on the last step) would be accepted.
    #[must_use]
    pub fn can_advance(&self, today: NaiveDate) -> bool {
        if self.step.is_last() {
            let schema = self.schema();
            Step::ALL
                .iter()
                .all(|s| schema.validate(&self.draft, s.fields(), today).is_empty())
        } else {
            self.errors(today).is_empty()
        }
    }

    /// Advance one step when the current step is valid.
    ///
    /// # Errors
    ///
    /// [`WizardError::Invalid`] with the step's errors, after marking the
    /// step's fields touched. [`WizardError::LastStep`] on the last step.
    pub fn next(&mut self, today: NaiveDate) -> Result<Step, WizardError> {
        let next = self.step.next().ok_or(WizardError::LastStep)?;
        let errors = self.errors(today);
        if let Err(err) = ValidationError::check(errors) {
            self.touched.extend(self.step.fields());
            return Err(err.into());
        }
        self.step = next;
        Ok(next)
    }

    /// Go back one step. Saturates at the first step and keeps all values.
    pub fn previous(&mut self) -> Step {
        if let Some(prev) = self.step.previous() {
            self.step = prev;
        }
        self.step
    }

    #[must_use]
    pub fn submit_action(&self) -> SubmitAction {
        if self.draft.has_cultural_selection() {
            SubmitAction::Submit
        } else {
            SubmitAction::Skip
        }
    }

    /// Validate every step and build the account payload.
    ///
    /// On failure the offending fields are marked touched and the wizard
    /// moves back to the first step that has an error.
    ///
    /// # Errors
    ///
    /// [`WizardError::NotLastStep`] before the last step,
    /// [`WizardError::Invalid`] when any step fails.
    pub fn submit(&mut self, today: NaiveDate) -> Result<NewAccount, WizardError> {
        if !self.step.is_last() {
            return Err(WizardError::NotLastStep);
        }

        let schema = self.schema();
        for step in Step::ALL {
            let errors = schema.validate(&self.draft, step.fields(), today);
            if let Err(err) = ValidationError::check(errors) {
                self.touched.extend(err.fields());
                self.step = step;
                return Err(err.into());
            }
        }

        self.build_account(today)
    }

    fn build_account(&self, today: NaiveDate) -> Result<NewAccount, WizardError> {
        let schema = self.schema();
        let invalid = |field: Field| {
            move |v: Violation| {
                WizardError::from(ValidationError {
                    errors: vec![schema.error(field, v)],
                })
            }
        };
        let d = &self.draft;

        Ok(NewAccount {
            full_name: d.full_name.trim().to_owned(),
            email: check_email(&d.email).map_err(invalid(Field::Email))?,
            phone: check_phone(d.phone_country, &d.phone)
                .map_err(invalid(Field::Phone))?
                .into_inner(),
            password: d.password.clone(),
            date_of_birth: check_birth_date(&d.date_of_birth, today)
                .map_err(invalid(Field::DateOfBirth))?,
            gender: check_gender(&d.gender)
                .map_err(invalid(Field::Gender))?
                .to_owned(),
            language: check_option(&d.language).map_err(invalid(Field::Language))?,
            preferred_currency: check_option(&d.preferred_currency)
                .map_err(invalid(Field::PreferredCurrency))?,
            postal_code: digits_only(&d.postal_code),
            country: d.country.trim().to_owned(),
            state: d.state.trim().to_owned(),
            city: d.city.trim().to_owned(),
            address: d.address.trim().to_owned(),
            number: d.number.trim().to_owned(),
            address_complement: d.address_complement.trim().to_owned(),
            hobbies: check_selection(Catalog::Hobbies, &d.hobbies)
                .map_err(invalid(Field::Hobbies))?,
            favorite_movie_genres: check_selection(Catalog::MovieGenres, &d.favorite_movie_genres)
                .map_err(invalid(Field::FavoriteMovieGenres))?,
            favorite_series_genres: check_selection(
                Catalog::SeriesGenres,
                &d.favorite_series_genres,
            )
            .map_err(invalid(Field::FavoriteSeriesGenres))?,
        })
    }

    /// Apply a lookup result for `postal_code`.
    ///
    /// Results for a code that is no longer in the draft are dropped and
    /// `false` is returned. A hit overwrites the derived fields it has
    /// values for; a miss only sets the banner, leaving typed text alone.
    pub fn apply_address_lookup(&mut self, postal_code: &PostalCode, outcome: &LookupOutcome) -> bool {
        if self.draft.postal_code != postal_code.as_str() {
            return false;
        }

        match outcome {
            LookupOutcome::Found(found) => {
                let updates = [
                    (Field::Country, &found.country),
                    (Field::State, &found.state),
                    (Field::City, &found.city),
                    (Field::Address, &found.street),
                ];
                for (field, value) in updates {
                    if value.trim().is_empty() {
                        continue;
                    }
                    if let Some(slot) = self.draft.text_mut(field) {
                        slot.clone_from(value);
                        self.touched.insert(field);
                    }
                }
                self.banner = None;
            }
            LookupOutcome::NotFound => self.banner = Some(MessageKey::InvalidPostalCode),
            LookupOutcome::Unavailable => self.banner = Some(MessageKey::AddressLookupError),
        }
        true
    }

    /// Snapshot for the client.
    #[must_use]
    pub fn view(&self, today: NaiveDate) -> WizardView {
        let schema = self.schema();
        let errors = schema
            .validate(&self.draft, self.step.fields(), today)
            .into_iter()
            .filter(|e| self.touched.contains(&e.field))
            .collect();

        WizardView {
            draft_id: self.id,
            step: self.step,
            step_index: self.step.index(),
            total_steps: Step::ALL.len(),
            locale: self.locale,
            values: DraftValues::from(&self.draft),
            touched: self.touched.iter().copied().collect(),
            errors,
            can_advance: self.can_advance(today),
            can_go_back: self.step.previous().is_some(),
            is_last_step: self.step.is_last(),
            submit_action: self.submit_action(),
            labels: WizardLabels {
                next: MessageKey::Next.text(self.locale),
                previous: MessageKey::Previous.text(self.locale),
                submit: match self.submit_action() {
                    SubmitAction::Submit => MessageKey::Submit,
                    SubmitAction::Skip => MessageKey::Skip,
                }
                .text(self.locale),
            },
            banner: self.banner.map(|key| Banner {
                key,
                message: key.text(self.locale),
            }),
        }
    }
}

/// Field values as echoed back to the client. Passwords are never echoed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftValues {
    pub full_name: String,
    pub email: String,
    pub phone_country: PhoneCountry,
    pub phone: String,
    pub password_set: bool,
    pub date_of_birth: String,
    pub gender: String,
    pub language: String,
    pub preferred_currency: String,
    pub postal_code: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub address: String,
    pub number: String,
    pub address_complement: String,
    pub hobbies: Vec<String>,
    pub favorite_movie_genres: Vec<String>,
    pub favorite_series_genres: Vec<String>,
}

impl From<&RegistrationDraft> for DraftValues {
    fn from(d: &RegistrationDraft) -> Self {
        Self {
            full_name: d.full_name.clone(),
            email: d.email.clone(),
            phone_country: d.phone_country,
            phone: d.phone.clone(),
            password_set: !d.password.is_empty(),
            date_of_birth: d.date_of_birth.clone(),
            gender: d.gender.clone(),
            language: d.language.clone(),
            preferred_currency: d.preferred_currency.clone(),
            postal_code: d.postal_code.clone(),
            country: d.country.clone(),
            state: d.state.clone(),
            city: d.city.clone(),
            address: d.address.clone(),
            number: d.number.clone(),
            address_complement: d.address_complement.clone(),
            hobbies: d.hobbies.clone(),
            favorite_movie_genres: d.favorite_movie_genres.clone(),
            favorite_series_genres: d.favorite_series_genres.clone(),
        }
    }
}

/// Localized button labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardLabels {
    pub next: &'static str,
    pub previous: &'static str,
    pub submit: &'static str,
}

/// Lookup banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub key: MessageKey,
    pub message: &'static str,
}

/// What the client renders for the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardView {
    pub draft_id: DraftId,
    pub step: Step,
    pub step_index: usize,
    pub total_steps: usize,
    pub locale: Locale,
    pub values: DraftValues,
    pub touched: Vec<Field>,
    /// Errors of touched fields on the current step.
    pub errors: Vec<FieldError>,
    pub can_advance: bool,
    pub can_go_back: bool,
    pub is_last_step: bool,
    pub submit_action: SubmitAction,
    pub labels: WizardLabels,
    pub banner: Option<Banner>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::profile::AddressSuggestion;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn text(value: &str) -> FieldValue {
        FieldValue::Text(value.to_owned())
    }

    fn fill_basic(wizard: &mut Wizard) {
        for (field, value) in [
            (Field::FullName, "Ana Souza"),
            (Field::Email, "Ana@Example.com"),
            (Field::Phone, "(11) 98765-4321"),
            (Field::Password, "Secr3t!pass"),
            (Field::ConfirmPassword, "Secr3t!pass"),
            (Field::DateOfBirth, "1990-04-12"),
            (Field::Gender, "female"),
        ] {
            wizard.set_field(field, text(value)).unwrap();
        }
    }

    fn fill_address(wizard: &mut Wizard) {
        for (field, value) in [
            (Field::PostalCode, "01310-930"),
            (Field::Country, "Brazil"),
            (Field::State, "SP"),
            (Field::City, "São Paulo"),
            (Field::Address, "Avenida Paulista"),
            (Field::Number, "1578"),
        ] {
            wizard.set_field(field, text(value)).unwrap();
        }
    }

    fn wizard_on_cultural() -> Wizard {
        let mut wizard = Wizard::new(Locale::En);
        fill_basic(&mut wizard);
        wizard.next(today()).unwrap();
        fill_address(&mut wizard);
        wizard.next(today()).unwrap();
        wizard
    }

    #[test]
    fn test_empty_required_fields_block_next() {
        let mut wizard = Wizard::new(Locale::En);
        assert!(!wizard.can_advance(today()));

        let err = wizard.next(today()).unwrap_err();
        let WizardError::Invalid(err) = err else {
            panic!("expected validation error");
        };
        assert!(err.fields().any(|f| f == Field::FullName));
        assert_eq!(wizard.step(), Step::Basic);
        assert!(wizard.is_touched(Field::FullName));
        assert!(!wizard.view(today()).errors.is_empty());
    }

    #[test]
    fn test_each_missing_basic_field_blocks_next() {
        for missing in [Field::FullName, Field::Email, Field::Phone, Field::DateOfBirth, Field::Gender] {
            let mut wizard = Wizard::new(Locale::En);
            fill_basic(&mut wizard);
            wizard.set_field(missing, text("")).unwrap();
            assert!(!wizard.can_advance(today()), "{missing:?} left empty");
        }
    }

    #[test]
    fn test_password_mismatch_blocks_next() {
        let mut wizard = Wizard::new(Locale::En);
        fill_basic(&mut wizard);
        wizard.set_field(Field::ConfirmPassword, text("Other!pass1")).unwrap();
        let errors = wizard.errors(today());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Passwords don't match");
    }

    #[test]
    fn test_address_step_requires_fields_but_not_complement() {
        let mut wizard = Wizard::new(Locale::En);
        fill_basic(&mut wizard);
        wizard.next(today()).unwrap();
        assert!(wizard.next(today()).is_err());

        fill_address(&mut wizard);
        assert!(wizard.draft().address_complement.is_empty());
        assert_eq!(wizard.next(today()).unwrap(), Step::Cultural);
    }

    #[test]
    fn test_previous_keeps_values_and_saturates() {
        let mut wizard = wizard_on_cultural();
        assert_eq!(wizard.previous(), Step::Address);
        assert_eq!(wizard.previous(), Step::Basic);
        assert_eq!(wizard.previous(), Step::Basic);
        assert_eq!(wizard.draft().city, "São Paulo");
        assert_eq!(wizard.draft().full_name, "Ana Souza");
    }

    #[test]
    fn test_locale_change_keeps_values_and_changes_messages() {
        let mut wizard = Wizard::new(Locale::En);
        wizard.set_field(Field::FullName, text("Ana")).unwrap();
        let _ = wizard.next(today());
        let before = wizard.view(today());

        wizard.set_locale(Locale::Pt);
        let after = wizard.view(today());

        assert_eq!(before.values, after.values);
        assert_eq!(before.can_advance, after.can_advance);
        assert_eq!(
            before.errors.iter().map(|e| e.violation).collect::<Vec<_>>(),
            after.errors.iter().map(|e| e.violation).collect::<Vec<_>>()
        );
        assert_ne!(before.errors, after.errors);
        assert_eq!(after.labels.next, "Próximo");
    }

    #[test]
    fn test_language_field_switches_locale() {
        let mut wizard = Wizard::new(Locale::En);
        wizard.set_field(Field::Language, text("es")).unwrap();
        assert_eq!(wizard.locale(), Locale::Es);
        assert_eq!(wizard.draft().language, "es");
    }

    #[test]
    fn test_empty_cultural_step_is_a_skip() {
        let mut wizard = wizard_on_cultural();
        assert_eq!(wizard.submit_action(), SubmitAction::Skip);
        assert_eq!(wizard.view(today()).labels.submit, "Skip");

        let account = wizard.submit(today()).unwrap();
        assert!(account.hobbies.is_empty());
        assert_eq!(account.email.as_str(), "ana@example.com");
        assert_eq!(account.phone, "+5511987654321");
    }

    #[test]
    fn test_cultural_selection_switches_label() {
        let mut wizard = wizard_on_cultural();
        wizard
            .set_field(Field::Hobbies, FieldValue::List(vec!["chess".to_owned()]))
            .unwrap();
        assert_eq!(wizard.submit_action(), SubmitAction::Submit);
        assert_eq!(wizard.submit(today()).unwrap().hobbies, vec!["chess".to_owned()]);
    }

    #[test]
    fn test_submit_before_last_step_is_rejected() {
        let mut wizard = Wizard::new(Locale::En);
        assert_eq!(wizard.submit(today()), Err(WizardError::NotLastStep));
    }

    #[test]
    fn test_submit_revalidates_earlier_steps() {
        let mut wizard = wizard_on_cultural();
        wizard.set_field(Field::Email, text("not-an-email")).unwrap();
        assert!(matches!(wizard.submit(today()), Err(WizardError::Invalid(_))));
        assert_eq!(wizard.step(), Step::Basic);
    }

    #[test]
    fn test_account_payload_keys() {
        let mut wizard = wizard_on_cultural();
        let json = serde_json::to_value(wizard.submit(today()).unwrap()).unwrap();
        assert_eq!(json["fullName"], "Ana Souza");
        assert_eq!(json["dateOfBirth"], "1990-04-12");
        assert_eq!(json["postalCode"], "01310930");
        assert_eq!(json["preferred_currency"], "BRL");
        assert_eq!(json["address_complement"], "");
        assert_eq!(json["password"], "Secr3t!pass");
        assert!(json.get("confirmPassword").is_none());
    }

    #[test]
    fn test_lookup_hit_fills_derived_fields() {
        let mut wizard = Wizard::new(Locale::En);
        let code = wizard.set_postal_code("01310-930").unwrap();
        let outcome = LookupOutcome::Found(AddressSuggestion {
            postal_code: "01310930".to_owned(),
            country: "Brazil".to_owned(),
            state: "SP".to_owned(),
            city: "São Paulo".to_owned(),
            street: "Avenida Paulista".to_owned(),
        });

        assert!(wizard.apply_address_lookup(&code, &outcome));
        assert_eq!(wizard.draft().state, "SP");
        assert_eq!(wizard.draft().city, "São Paulo");
        assert_eq!(wizard.draft().address, "Avenida Paulista");
        assert!(wizard.is_touched(Field::City));
        assert!(wizard.banner().is_none());
    }

    #[test]
    fn test_lookup_miss_keeps_typed_values() {
        let mut wizard = Wizard::new(Locale::En);
        wizard.set_field(Field::City, text("Campinas")).unwrap();
        wizard.set_field(Field::Address, text("Rua A")).unwrap();
        let code = wizard.set_postal_code("00000000").unwrap();

        assert!(wizard.apply_address_lookup(&code, &LookupOutcome::NotFound));
        assert_eq!(wizard.draft().city, "Campinas");
        assert_eq!(wizard.draft().address, "Rua A");
        assert_eq!(wizard.draft().postal_code, "00000000");
        assert_eq!(wizard.banner(), Some(MessageKey::InvalidPostalCode));

        assert!(wizard.apply_address_lookup(&code, &LookupOutcome::Unavailable));
        assert_eq!(wizard.draft().city, "Campinas");
        assert_eq!(wizard.banner(), Some(MessageKey::AddressLookupError));
    }

    #[test]
    fn test_stale_lookup_is_ignored() {
        let mut wizard = Wizard::new(Locale::En);
        let old = wizard.set_postal_code("01310930").unwrap();
        wizard.set_postal_code("2004002");
        assert!(!wizard.apply_address_lookup(&old, &LookupOutcome::NotFound));
        assert!(wizard.banner().is_none());
    }

    #[test]
    fn test_wrong_value_kind_is_rejected() {
        let mut wizard = Wizard::new(Locale::En);
        assert_eq!(
            wizard.set_field(Field::Hobbies, text("chess")),
            Err(WizardError::FieldType(Field::Hobbies))
        );
        assert_eq!(
            wizard.set_field(Field::Code, text("1234")),
            Err(WizardError::FieldType(Field::Code))
        );
    }

    #[test]
    fn test_view_never_echoes_password() {
        let mut wizard = Wizard::new(Locale::En);
        fill_basic(&mut wizard);
        let json = serde_json::to_string(&wizard.view(today())).unwrap();
        assert!(!json.contains("Secr3t!pass"));
        assert!(json.contains("\"passwordSet\":true"));
    }
}
