//! ViaCEP client (`GET {base}/{cep}/json/`).

use std::time::Duration;

use nb1_core::{AddressSuggestion, PostalCode, digits_only};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};
use tracing::{debug, instrument};
use url::Url;

use super::{AddressLookup, LookupError};

#[derive(Clone)]
pub struct ViaCepClient {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ViaCepAddress {
    #[serde(deserialize_with = "erro_flag")]
    erro: bool,
    cep: String,
    logradouro: String,
    localidade: String,
    uf: String,
}

impl ViaCepClient {
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }
}

impl AddressLookup for ViaCepClient {
    #[instrument(skip(self), fields(postal_code = %code))]
    async fn lookup(&self, code: &PostalCode) -> Result<Option<AddressSuggestion>, LookupError> {
        let url = self.base_url.join(&format!("{}/json/", code.as_str()))?;
        let response = self.client.get(url).send().await?;
        let status = response.status();

        // ViaCEP answers 400 for codes it considers malformed.
        if status == StatusCode::BAD_REQUEST {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LookupError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let address: ViaCepAddress = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        if address.erro {
            debug!("ViaCEP does not know this code");
            return Ok(None);
        }

        Ok(Some(AddressSuggestion {
            postal_code: if address.cep.is_empty() {
                code.as_str().to_owned()
            } else {
                digits_only(&address.cep)
            },
            country: "Brazil".to_owned(),
            state: address.uf,
            city: address.localidade,
            street: address.logradouro,
        }))
    }
}

/// `erro` arrives as `true` or as the string `"true"`.
fn erro_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client(server: &MockServer) -> ViaCepClient {
        ViaCepClient::new(
            Url::parse(&format!("{}/ws/", server.uri())).unwrap(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ws/01310930/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cep": "01310-930",
                "logradouro": "Avenida Paulista",
                "bairro": "Bela Vista",
                "localidade": "São Paulo",
                "uf": "SP"
            })))
            .mount(&server)
            .await;

        let code = PostalCode::parse("01310-930").unwrap();
        let found = client(&server).await.lookup(&code).await.unwrap().unwrap();
        assert_eq!(
            found,
            AddressSuggestion {
                postal_code: "01310930".to_string(),
                country: "Brazil".to_string(),
                state: "SP".to_string(),
                city: "São Paulo".to_string(),
                street: "Avenida Paulista".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_bad_request_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ws/99999999/json/"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let code = PostalCode::parse("99999999").unwrap();
        assert_eq!(client(&server).await.lookup(&code).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let code = PostalCode::parse("01310930").unwrap();
        let result = client(&server).await.lookup(&code).await;
        assert!(matches!(result, Err(LookupError::Api { status: 503, .. })));
    }
}
