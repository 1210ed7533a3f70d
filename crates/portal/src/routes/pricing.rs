//! Plan offers and the checkout handoff.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use chrono::Utc;
use nb1_core::{Currency, FinancialPreferences, Locale, Plan, PlanOffer, pricing, validation};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use super::session_locale;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::models::{CurrentUser, JustRegistered, session_keys};
use crate::state::AppState;

/// Selling points listed under every plan.
pub const FEATURES: [&str; 4] = [
    "Advanced AI automation",
    "Unlimited automated tasks",
    "Priority support",
    "Custom workflows",
];

#[derive(Debug, Default, Deserialize)]
pub struct CurrencyQuery {
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PricingView {
    pub locale: Locale,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub currency: Currency,
    pub currencies: [Currency; 3],
    pub plans: Vec<PlanOffer>,
    pub features: [&'static str; 4],
    pub logged_in: bool,
    pub just_registered: bool,
}

/// Currency from the query, then the cached preference, then the profile,
/// then BRL.
async fn pick_currency(
    session: &Session,
    user: Option<&CurrentUser>,
    query: CurrencyQuery,
) -> Result<Currency> {
    if let Some(code) = query.currency.filter(|c| !c.trim().is_empty()) {
        return validation::check_option(&code)
            .map_err(|_| AppError::BadRequest(format!("Unknown currency: {code}")));
    }

    let cached: Option<FinancialPreferences> = session.get(session_keys::FINANCIAL_DATA).await?;
    Ok(cached
        .map(|c| c.preferred_currency)
        .or_else(|| user.and_then(|u| u.profile.as_ref()).and_then(|p| p.currency()))
        .unwrap_or_default())
}

/// Registration marker, dropped once it has expired.
async fn fresh_registration(state: &AppState, session: &Session) -> Result<Option<JustRegistered>> {
    let Some(marker) = session
        .get::<JustRegistered>(session_keys::JUST_REGISTERED)
        .await?
    else {
        return Ok(None);
    };
    if marker.is_fresh(Utc::now(), state.config().registration_grace) {
        return Ok(Some(marker));
    }
    session
        .remove::<JustRegistered>(session_keys::JUST_REGISTERED)
        .await?;
    Ok(None)
}

/// Pricing page.
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<PricingView>> {
    let currency = pick_currency(&session, user.as_ref(), query).await?;
    let just_registered = fresh_registration(&state, &session).await?.is_some();

    Ok(Json(PricingView {
        locale: session_locale(&session).await,
        title: "Choose Your Personal Plan",
        subtitle: "Select a plan that works best for you",
        currency,
        currencies: Currency::ALL,
        plans: pricing::catalog(currency),
        features: FEATURES,
        logged_in: user.is_some(),
        just_registered,
    }))
}

/// Redirect to the payment link for `plan`.
///
/// Needs a logged-in session or a registration within the grace window.
#[instrument(skip(state, session, user, query))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(plan): Path<String>,
    Query(query): Query<CurrencyQuery>,
) -> Result<Redirect> {
    let plan: Plan = plan
        .parse()
        .map_err(|e: nb1_core::UnknownPlan| AppError::NotFound(e.to_string()))?;
    let currency = pick_currency(&session, user.as_ref(), query).await?;

    let email = match (&user, fresh_registration(&state, &session).await?) {
        (Some(user), _) => Some(user.profile.as_ref().map(|p| p.email.clone())),
        (None, Some(marker)) => Some(Some(marker.email.into_inner())),
        (None, None) => None,
    };
    let Some(email) = email else {
        info!("Checkout without a session, sending to login");
        return Ok(Redirect::to("/auth/login?next=/pricing"));
    };

    let mut link = state
        .config()
        .checkout
        .link(plan, currency)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("No payment link for the {plan} plan")))?;
    if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
        link.query_pairs_mut().append_pair("prefilled_email", &email);
    }

    add_breadcrumb(
        "checkout",
        "Redirected to payment",
        Some(&[("plan", plan.slug()), ("currency", currency.code())][..]),
    );
    Ok(Redirect::to(link.as_str()))
}
