//! Postal code to address lookup.
//!
//! [`ViaCepClient`] answers for Brazilian CEPs. When a geocoding API key is
//! configured, [`GeocodingClient`] is asked whenever ViaCEP does not know a
//! code or fails. [`LookupService`] chains the two, and
//! [`AddressAutofill`] adds caching and per-draft debouncing on top.

mod autofill;
mod geocoding;
mod viacep;

pub use autofill::{AddressAutofill, AutofillResult};
pub use geocoding::GeocodingClient;
pub use viacep::ViaCepClient;

use std::future::Future;

use nb1_core::{AddressSuggestion, PostalCode};
use thiserror::Error;
use tracing::warn;

use crate::config::LookupConfig;

/// Errors that can occur when querying an address provider.
#[derive(Debug, Error)]
pub enum LookupError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Something that can turn a postal code into an address.
///
/// `Ok(None)` means the code is unknown to the provider.
pub trait AddressLookup: Send + Sync + 'static {
    fn lookup(
        &self,
        code: &PostalCode,
    ) -> impl Future<Output = Result<Option<AddressSuggestion>, LookupError>> + Send;
}

/// ViaCEP with an optional geocoding fallback.
#[derive(Clone)]
pub struct LookupService {
    viacep: ViaCepClient,
    geocoding: Option<GeocodingClient>,
}

impl LookupService {
    /// Build the provider chain from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client fails to build.
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        let viacep = ViaCepClient::new(config.viacep_base_url.clone(), config.timeout)?;
        let geocoding = config
            .geocoding_api_key
            .clone()
            .map(|key| GeocodingClient::new(config.geocoding_base_url.clone(), key, config.timeout))
            .transpose()?;
        Ok(Self { viacep, geocoding })
    }
}

impl AddressLookup for LookupService {
    async fn lookup(&self, code: &PostalCode) -> Result<Option<AddressSuggestion>, LookupError> {
        let primary = self.viacep.lookup(code).await;
        let Some(geocoding) = &self.geocoding else {
            return primary;
        };

        match primary {
            Ok(Some(found)) => Ok(Some(found)),
            Ok(None) => geocoding.lookup(code).await,
            Err(e) => {
                warn!(error = %e, postal_code = %code, "ViaCEP failed, trying geocoding");
                geocoding.lookup(code).await
            }
        }
    }
}
