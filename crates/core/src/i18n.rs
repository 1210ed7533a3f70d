//! Localized validation messages, wizard labels and dashboard help text.

use serde::{Deserialize, Serialize};

use crate::types::Locale;

/// Identifier of a message the portal can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKey {
    FullNameRequired,
    InvalidEmail,
    PhoneRequired,
    InvalidPhone,
    PasswordRequired,
    PasswordTooShort,
    PasswordComplexity,
    PasswordMissingUppercase,
    PasswordMissingLowercase,
    PasswordMissingSpecial,
    PasswordsDontMatch,
    DateOfBirthRequired,
    InvalidDateOfBirth,
    GenderRequired,
    LanguageRequired,
    CurrencyRequired,
    PostalCodeRequired,
    InvalidPostalCode,
    AddressLookupError,
    CountryRequired,
    StateRequired,
    CityRequired,
    StreetRequired,
    NumberRequired,
    UnknownOption,
    CodeRequired,
    InvalidCode,
    EmailNotFound,
    Next,
    Previous,
    Submit,
    Skip,
    NavProfile,
    NavFinancial,
    NavHelp,
    FaqProfileQuestion,
    FaqProfileAnswer,
    FaqPaymentQuestion,
    FaqPaymentAnswer,
    FaqSupportQuestion,
    FaqSupportAnswer,
}

impl MessageKey {
    /// Translations in `[en, es, pt]` order.
    const fn texts(self) -> [&'static str; 3] {
        match self {
            Self::FullNameRequired => [
                "Full name is required",
                "El nombre completo es obligatorio",
                "O nome completo é obrigatório",
            ],
            Self::InvalidEmail => [
                "Invalid email address",
                "Correo electrónico no válido",
                "Endereço de e-mail inválido",
            ],
            Self::PhoneRequired => [
                "Phone is required",
                "El teléfono es obligatorio",
                "O telefone é obrigatório",
            ],
            Self::InvalidPhone => [
                "Enter a valid phone number",
                "Introduce un número de teléfono válido",
                "Informe um número de telefone válido",
            ],
            Self::PasswordRequired => [
                "Password is required",
                "La contraseña es obligatoria",
                "A senha é obrigatória",
            ],
            Self::PasswordTooShort => [
                "Password must be at least 8 characters",
                "La contraseña debe tener al menos 8 caracteres",
                "A senha deve ter pelo menos 8 caracteres",
            ],
            Self::PasswordComplexity => [
                "Password must contain at least one uppercase letter, one lowercase letter, one number and one special character",
                "La contraseña debe contener al menos una letra mayúscula, una minúscula, un número y un carácter especial",
                "A senha deve conter pelo menos uma letra maiúscula, uma minúscula, um número e um caractere especial",
            ],
            Self::PasswordMissingUppercase => [
                "Password must contain at least one uppercase letter",
                "La contraseña debe contener al menos una letra mayúscula",
                "A senha deve conter pelo menos uma letra maiúscula",
            ],
            Self::PasswordMissingLowercase => [
                "Password must contain at least one lowercase letter",
                "La contraseña debe contener al menos una letra minúscula",
                "A senha deve conter pelo menos uma letra minúscula",
            ],
            Self::PasswordMissingSpecial => [
                "Password must contain at least one special character (!@#$%^&*)",
                "La contraseña debe contener al menos un carácter especial (!@#$%^&*)",
                "A senha deve conter pelo menos um caractere especial (!@#$%^&*)",
            ],
            Self::PasswordsDontMatch => [
                "Passwords don't match",
                "Las contraseñas no coinciden",
                "As senhas não coincidem",
            ],
            Self::DateOfBirthRequired => [
                "Date of birth is required",
                "La fecha de nacimiento es obligatoria",
                "A data de nascimento é obrigatória",
            ],
            Self::InvalidDateOfBirth => [
                "Enter a valid date of birth",
                "Introduce una fecha de nacimiento válida",
                "Informe uma data de nascimento válida",
            ],
            Self::GenderRequired => [
                "Select a gender",
                "Selecciona un género",
                "Selecione um gênero",
            ],
            Self::LanguageRequired => [
                "Select a language",
                "Selecciona un idioma",
                "Selecione um idioma",
            ],
            Self::CurrencyRequired => [
                "Preferred currency is required",
                "La moneda preferida es obligatoria",
                "A moeda preferida é obrigatória",
            ],
            Self::PostalCodeRequired => [
                "Postal code is required",
                "El código postal es obligatorio",
                "O CEP é obrigatório",
            ],
            Self::InvalidPostalCode => [
                "Invalid postal code",
                "Código postal no válido",
                "CEP inválido",
            ],
            Self::AddressLookupError => [
                "We could not look up this address. Please fill it in manually.",
                "No pudimos buscar esta dirección. Complétala manualmente.",
                "Não foi possível buscar este endereço. Preencha manualmente.",
            ],
            Self::CountryRequired => [
                "Country is required",
                "El país es obligatorio",
                "O país é obrigatório",
            ],
            Self::StateRequired => [
                "State is required",
                "La provincia es obligatoria",
                "O estado é obrigatório",
            ],
            Self::CityRequired => [
                "City is required",
                "La ciudad es obligatoria",
                "A cidade é obrigatória",
            ],
            Self::StreetRequired => [
                "Street address is required",
                "La dirección es obligatoria",
                "O endereço é obrigatório",
            ],
            Self::NumberRequired => [
                "Number is required",
                "El número es obligatorio",
                "O número é obrigatório",
            ],
            Self::UnknownOption => [
                "Select options from the list",
                "Selecciona opciones de la lista",
                "Selecione opções da lista",
            ],
            Self::CodeRequired => [
                "Enter the code sent to your email",
                "Introduce el código enviado a tu correo",
                "Informe o código enviado para o seu e-mail",
            ],
            Self::InvalidCode => [
                "Invalid code. Please check and try again.",
                "Código no válido. Revísalo e inténtalo de nuevo.",
                "Código inválido. Verifique e tente novamente.",
            ],
            Self::EmailNotFound => [
                "Email not found. Please check and try again.",
                "Correo no encontrado. Revísalo e inténtalo de nuevo.",
                "E-mail não encontrado. Verifique e tente novamente.",
            ],
            Self::Next => ["Next", "Siguiente", "Próximo"],
            Self::Previous => ["Previous", "Anterior", "Anterior"],
            Self::Submit => ["Submit", "Enviar", "Enviar"],
            Self::Skip => ["Skip", "Omitir", "Pular"],
            Self::NavProfile => ["Profile", "Perfil", "Perfil"],
            Self::NavFinancial => ["Financial", "Finanzas", "Financeiro"],
            Self::NavHelp => ["Help", "Ayuda", "Ajuda"],
            Self::FaqProfileQuestion => [
                "How do I update my profile?",
                "¿Cómo actualizo mi perfil?",
                "Como atualizo meu perfil?",
            ],
            Self::FaqProfileAnswer => [
                "You can update your profile information in the Profile tab. \
                 Click on the edit button to make changes.",
                "Puedes actualizar tu información en la pestaña Perfil. \
                 Haz clic en el botón de editar para hacer cambios.",
                "Você pode atualizar suas informações na aba Perfil. \
                 Clique no botão de editar para fazer alterações.",
            ],
            Self::FaqPaymentQuestion => [
                "How do I update my payment method?",
                "¿Cómo actualizo mi método de pago?",
                "Como atualizo minha forma de pagamento?",
            ],
            Self::FaqPaymentAnswer => [
                "Go to the Financial tab and enter your new card information. \
                 We use secure encryption to protect your data.",
                "Ve a la pestaña Finanzas e introduce los datos de tu nueva tarjeta. \
                 Usamos cifrado seguro para proteger tus datos.",
                "Acesse a aba Financeiro e informe os dados do novo cartão. \
                 Usamos criptografia segura para proteger seus dados.",
            ],
            Self::FaqSupportQuestion => [
                "Need help or have questions?",
                "¿Necesitas ayuda o tienes preguntas?",
                "Precisa de ajuda ou tem dúvidas?",
            ],
            Self::FaqSupportAnswer => [
                "Our support team is available 24/7 to assist you. \
                 You can reach us anytime via email at support@nb1.ai",
                "Nuestro equipo de soporte está disponible 24/7 para ayudarte. \
                 Puedes escribirnos en cualquier momento a support@nb1.ai",
                "Nossa equipe de suporte está disponível 24/7 para ajudar. \
                 Fale conosco a qualquer momento pelo e-mail support@nb1.ai",
            ],
        }
    }

    /// The message text in the given locale.
    #[must_use]
    pub const fn text(self, locale: Locale) -> &'static str {
        let [en, es, pt] = self.texts();
        match locale {
            Locale::En => en,
            Locale::Es => es,
            Locale::Pt => pt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_per_locale() {
        assert_eq!(MessageKey::Next.text(Locale::En), "Next");
        assert_eq!(MessageKey::Next.text(Locale::Pt), "Próximo");
        assert_eq!(MessageKey::Skip.text(Locale::Es), "Omitir");
    }

    #[test]
    fn test_serializes_as_catalog_id() {
        assert_eq!(
            serde_json::to_string(&MessageKey::InvalidPostalCode).ok().as_deref(),
            Some("\"invalidPostalCode\"")
        );
    }
}
