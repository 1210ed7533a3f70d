//! Geocoding fallback (`GET {base}json?components=postal_code:..|country:BR&key=..`).

use std::time::Duration;

use nb1_core::{AddressSuggestion, PostalCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{AddressLookup, LookupError};

#[derive(Clone)]
pub struct GeocodingClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl GeocodeResult {
    fn component(&self, kind: &str) -> Option<&AddressComponent> {
        self.address_components
            .iter()
            .find(|c| c.types.iter().any(|t| t == kind))
    }

    fn suggestion(&self, code: &PostalCode) -> AddressSuggestion {
        let long = |kind: &str| self.component(kind).map(|c| c.long_name.clone());
        AddressSuggestion {
            postal_code: code.as_str().to_owned(),
            country: long("country").unwrap_or_default(),
            state: self
                .component("administrative_area_level_1")
                .map(|c| c.short_name.clone())
                .unwrap_or_default(),
            city: long("administrative_area_level_2")
                .or_else(|| long("locality"))
                .unwrap_or_default(),
            street: long("route").unwrap_or_default(),
        }
    }
}

impl GeocodingClient {
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: Url, api_key: SecretString, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

impl AddressLookup for GeocodingClient {
    #[instrument(skip(self), fields(postal_code = %code))]
    async fn lookup(&self, code: &PostalCode) -> Result<Option<AddressSuggestion>, LookupError> {
        let mut url = self.base_url.join("json")?;
        url.query_pairs_mut()
            .append_pair(
                "components",
                &format!("postal_code:{}|country:BR", code.as_str()),
            )
            .append_pair("key", self.api_key.expose_secret());

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LookupError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        match body.status.as_str() {
            "OK" => Ok(body
                .results
                .into_iter()
                .next()
                .map(|result| result.suggestion(code))),
            "ZERO_RESULTS" => {
                debug!("Geocoding has no result for this code");
                Ok(None)
            }
            other => Err(LookupError::Api {
                status: status.as_u16(),
                message: body.error_message.unwrap_or_else(|| other.to_owned()),
            }),
        }
    }
}
