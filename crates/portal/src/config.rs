//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PORTAL_BASE_URL` - Public URL for the portal
//!
//! ## Optional
//! - `PORTAL_HOST` - Bind address (default: 127.0.0.1)
//! - `PORTAL_PORT` - Listen port (default: 3000)
//! - `WEBHOOK_BASE_URL` - Webhook backend root (default: production n8n host)
//! - `WEBHOOK_TIMEOUT_SECS` - Outbound request timeout (default: 15)
//! - `VIACEP_BASE_URL` - Postal code service (default: <https://viacep.com.br/ws/>)
//! - `GEOCODING_BASE_URL` - Geocoding service (default: Google Geocoding API)
//! - `GEOCODING_API_KEY` - Enables the geocoding fallback (high entropy)
//! - `POSTAL_LOOKUP_DEBOUNCE_MS` - Debounce window for postal code input (default: 500)
//! - `REGISTRATION_GRACE_MINUTES` - Checkout without login after sign-up (default: 15)
//! - `REAUTH_WINDOW_MINUTES` - Password confirmation lifetime for edits (default: 10)
//! - `CHECKOUT_URL_{MONTHLY|ANNUAL}_{BRL|USD|EUR}` - Payment links per plan and currency
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `LOG_FORMAT` - `json` for structured logs (read by the binary)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use nb1_core::{Currency, Plan};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_WEBHOOK_BASE_URL: &str = "https://n8n-blue.up.railway.app/webhook/nb1/";
const DEFAULT_VIACEP_BASE_URL: &str = "https://viacep.com.br/ws/";
const DEFAULT_GEOCODING_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/";
const DEFAULT_MONTHLY_BRL_LINK: &str = "https://buy.stripe.com/28og0i8wreXocdqaEE";
const DEFAULT_ANNUAL_BRL_LINK: &str = "https://buy.stripe.com/3cs9BUdQLbLca5i7st";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Portal application configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the portal
    pub base_url: Url,
    pub webhook: WebhookConfig,
    pub lookup: LookupConfig,
    /// How long a fresh registration may open checkout without logging in
    pub registration_grace: TimeDelta,
    /// How long a password confirmation unlocks profile edits
    pub reauth_window: TimeDelta,
    pub checkout: CheckoutLinks,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

/// Webhook backend configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Root URL; endpoint paths are joined onto it.
    pub base_url: Url,
    pub timeout: Duration,
}

/// Postal code lookup configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct LookupConfig {
    pub viacep_base_url: Url,
    pub geocoding_base_url: Url,
    /// Geocoding is only consulted when a key is configured
    pub geocoding_api_key: Option<SecretString>,
    pub debounce: Duration,
    pub timeout: Duration,
}

impl std::fmt::Debug for LookupConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupConfig")
            .field("viacep_base_url", &self.viacep_base_url.as_str())
            .field("geocoding_base_url", &self.geocoding_base_url.as_str())
            .field(
                "geocoding_api_key",
                &self.geocoding_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("debounce", &self.debounce)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Payment links keyed by plan and currency.
#[derive(Debug, Clone, Default)]
pub struct CheckoutLinks {
    links: HashMap<(Plan, Currency), Url>,
}

impl CheckoutLinks {
    /// Link for `plan` in `currency`, falling back to the BRL link.
    #[must_use]
    pub fn link(&self, plan: Plan, currency: Currency) -> Option<&Url> {
        self.links
            .get(&(plan, currency))
            .or_else(|| self.links.get(&(plan, Currency::BRL)))
    }

    pub fn insert(&mut self, plan: Plan, currency: Currency, url: Url) {
        self.links.insert((plan, currency), url);
    }
}

/// Where configuration values come from.
type Source<'a> = &'a dyn Fn(&str) -> Option<String>;

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_source(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_source(env: Source<'_>) -> Result<Self, ConfigError> {
        let host = parse_env(env, "PORTAL_HOST", "127.0.0.1")?;
        let port = parse_env(env, "PORTAL_PORT", "3000")?;
        let base_url = parse_url(env, "PORTAL_BASE_URL", None)?;
        let timeout = Duration::from_secs(parse_env(env, "WEBHOOK_TIMEOUT_SECS", "15")?);

        let webhook = WebhookConfig {
            base_url: with_trailing_slash(parse_url(
                env,
                "WEBHOOK_BASE_URL",
                Some(DEFAULT_WEBHOOK_BASE_URL),
            )?),
            timeout,
        };

        let lookup = LookupConfig {
            viacep_base_url: with_trailing_slash(parse_url(
                env,
                "VIACEP_BASE_URL",
                Some(DEFAULT_VIACEP_BASE_URL),
            )?),
            geocoding_base_url: with_trailing_slash(parse_url(
                env,
                "GEOCODING_BASE_URL",
                Some(DEFAULT_GEOCODING_BASE_URL),
            )?),
            geocoding_api_key: get_optional_validated_secret(env, "GEOCODING_API_KEY")?,
            debounce: Duration::from_millis(parse_env(env, "POSTAL_LOOKUP_DEBOUNCE_MS", "500")?),
            timeout,
        };

        Ok(Self {
            host,
            port,
            base_url,
            webhook,
            lookup,
            registration_grace: TimeDelta::minutes(parse_env(
                env,
                "REGISTRATION_GRACE_MINUTES",
                "15",
            )?),
            reauth_window: TimeDelta::minutes(parse_env(env, "REAUTH_WINDOW_MINUTES", "10")?),
            checkout: CheckoutLinks::from_source(env)?,
            sentry_dsn: get_optional_env(env, "SENTRY_DSN"),
            sentry_environment: get_optional_env(env, "SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

impl CheckoutLinks {
    fn from_source(env: Source<'_>) -> Result<Self, ConfigError> {
        let mut links = Self::default();
        for plan in Plan::ALL {
            for currency in Currency::ALL {
                let key = format!(
                    "CHECKOUT_URL_{}_{}",
                    plan.slug().to_ascii_uppercase(),
                    currency.code()
                );
                let default = match (plan, currency) {
                    (Plan::Monthly, Currency::BRL) => Some(DEFAULT_MONTHLY_BRL_LINK),
                    (Plan::Annual, Currency::BRL) => Some(DEFAULT_ANNUAL_BRL_LINK),
                    _ => None,
                };
                if get_optional_env(env, &key).is_some() || default.is_some() {
                    links.insert(plan, currency, parse_url(env, &key, default)?);
                }
            }
        }
        Ok(links)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(env: Source<'_>, key: &str) -> Result<String, ConfigError> {
    get_optional_env(env, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(env: Source<'_>, key: &str) -> Option<String> {
    env(key).filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, using `default` when unset.
fn parse_env<T>(env: Source<'_>, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(env, key)
        .as_deref()
        .unwrap_or(default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a URL variable; required when `default` is `None`.
fn parse_url(env: Source<'_>, key: &str, default: Option<&str>) -> Result<Url, ConfigError> {
    let value = match default {
        Some(default) => get_optional_env(env, key).unwrap_or_else(|| default.to_string()),
        None => get_required_env(env, key)?,
    };
    Url::parse(value.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Endpoint paths are joined onto base URLs, which only appends when the
/// base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate an optional secret.
fn get_optional_validated_secret(
    env: Source<'_>,
    key: &str,
) -> Result<Option<SecretString>, ConfigError> {
    get_optional_env(env, key)
        .map(|value| {
            validate_secret_strength(&value, key)?;
            Ok(SecretString::from(value))
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<PortalConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        PortalConfig::from_source(&|key| map.get(key).cloned())
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("AIzaSyB3xY9mK2nL5pQ7rT0uW4zC6dE8fG1hJ", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_base_url_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "PORTAL_BASE_URL"));
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("PORTAL_BASE_URL", "https://app.nb1.ai")]).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(
            config.webhook.base_url.as_str(),
            "https://n8n-blue.up.railway.app/webhook/nb1/"
        );
        assert_eq!(config.webhook.timeout, Duration::from_secs(15));
        assert_eq!(config.lookup.debounce, Duration::from_millis(500));
        assert!(config.lookup.geocoding_api_key.is_none());
        assert_eq!(config.registration_grace, TimeDelta::minutes(15));
        assert_eq!(config.reauth_window, TimeDelta::minutes(10));
        assert!(config.is_secure());
    }

    #[test]
    fn test_base_urls_get_trailing_slash() {
        let config = load(&[
            ("PORTAL_BASE_URL", "http://localhost:3000"),
            ("WEBHOOK_BASE_URL", "http://127.0.0.1:9000/webhook/nb1"),
        ])
        .unwrap();
        assert_eq!(
            config.webhook.base_url.join("api/auth/login").unwrap().as_str(),
            "http://127.0.0.1:9000/webhook/nb1/api/auth/login"
        );
        assert!(!config.is_secure());
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[
            ("PORTAL_BASE_URL", "http://localhost:3000"),
            ("PORTAL_PORT", "http"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "PORTAL_PORT"));
    }

    #[test]
    fn test_checkout_links_fall_back_to_brl() {
        let config = load(&[
            ("PORTAL_BASE_URL", "http://localhost:3000"),
            ("CHECKOUT_URL_MONTHLY_USD", "https://buy.stripe.com/usd_monthly"),
        ])
        .unwrap();

        assert_eq!(
            config
                .checkout
                .link(Plan::Monthly, Currency::USD)
                .map(Url::as_str),
            Some("https://buy.stripe.com/usd_monthly")
        );
        assert_eq!(
            config
                .checkout
                .link(Plan::Annual, Currency::EUR)
                .map(Url::as_str),
            Some(DEFAULT_ANNUAL_BRL_LINK)
        );
    }

    #[test]
    fn test_lookup_config_debug_redacts_key() {
        let config = load(&[
            ("PORTAL_BASE_URL", "http://localhost:3000"),
            ("GEOCODING_API_KEY", "AIzaSyB3xY9mK2nL5pQ7rT0uW4zC6dE8fG1hJ"),
        ])
        .unwrap();
        let debug_output = format!("{:?}", config.lookup);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AIzaSy"));
    }
}
