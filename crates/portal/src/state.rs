//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::PortalConfig;
use crate::lookup::{AddressAutofill, LookupError, LookupService};
use crate::webhook::{WebhookClient, WebhookError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("webhook client: {0}")]
    Webhook(#[from] WebhookError),
    #[error("address lookup: {0}")]
    Lookup(#[from] LookupError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    webhook: WebhookClient,
    autofill: AddressAutofill<LookupService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: PortalConfig) -> Result<Self, StateError> {
        let webhook = WebhookClient::new(&config.webhook)?;
        let autofill = AddressAutofill::new(LookupService::new(&config.lookup)?, config.lookup.debounce);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                webhook,
                autofill,
            }),
        })
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get a reference to the webhook backend client.
    #[must_use]
    pub fn webhook(&self) -> &WebhookClient {
        &self.inner.webhook
    }

    /// Get a reference to the postal code autofill.
    #[must_use]
    pub fn autofill(&self) -> &AddressAutofill<LookupService> {
        &self.inner.autofill
    }
}
