//! NB1 Portal library.
//!
//! Registration, login, profile editing, pricing and checkout handoff for
//! NB1. Everything user-facing is a JSON view model; account data lives in
//! the webhook backend and is only cached in the session.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod lookup;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod webhook;

use axum::{
    Json, Router,
    extract::State,
    middleware::from_fn,
    routing::get,
};
use serde::Serialize;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use middleware::{create_session_layer, request_id_middleware, security_headers_middleware};
use state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct Readiness {
    status: &'static str,
    geocoding_fallback: bool,
}

/// Readiness health check endpoint.
///
/// The portal keeps no local storage, so readiness only reports which
/// lookup providers are configured.
async fn readiness(State(state): State<AppState>) -> Json<Readiness> {
    Json(Readiness {
        status: "ready",
        geocoding_fallback: state.config().lookup.geocoding_api_key.is_some(),
    })
}
