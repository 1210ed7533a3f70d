//! Static legal documents.

use axum::Json;
use serde::Serialize;

/// A legal document outline.
#[derive(Debug, Clone, Serialize)]
pub struct LegalDocument {
    pub title: &'static str,
    pub path: &'static str,
    pub sections: Vec<LegalSection>,
    pub effective_as_of: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegalSection {
    pub heading: &'static str,
    pub subsections: &'static [&'static str],
}

const TERMS_SECTIONS: &[&str] = &[
    "1. Terms",
    "2. Use License",
    "3. Disclaimer",
    "4. Limitations",
    "5. Accuracy of materials",
    "6. Links",
    "7. Modifications",
    "8. Governing Law",
];

const COOKIE_SECTIONS: &[&str] = &[
    "What Are Cookies",
    "How We Use Cookies",
    "Disabling Cookies",
    "The Cookies We Set",
    "Third Party Cookies",
    "User's Responsibilities",
    "More Information",
];

#[must_use]
pub fn terms_document() -> LegalDocument {
    LegalDocument {
        title: "Terms of Service",
        path: "/terms-conditions",
        sections: vec![LegalSection {
            heading: "1. Terms of Service",
            subsections: TERMS_SECTIONS,
        }],
        effective_as_of: None,
    }
}

#[must_use]
pub fn privacy_document() -> LegalDocument {
    LegalDocument {
        title: "Privacy Policy",
        path: "/privacy-policy",
        sections: vec![
            LegalSection {
                heading: "Privacy Policy",
                subsections: &[],
            },
            LegalSection {
                heading: "Cookie Policy for NB1",
                subsections: COOKIE_SECTIONS,
            },
        ],
        effective_as_of: Some("2025-02-14T19:59:00"),
    }
}

pub async fn terms() -> Json<LegalDocument> {
    Json(terms_document())
}

pub async fn privacy() -> Json<LegalDocument> {
    Json(privacy_document())
}
