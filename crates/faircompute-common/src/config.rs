//! Marketplace configuration resolved from environment variables.
//!
//! Every value has a production and a local variant, picked by a single
//! discriminator variable (`NEXT_PUBLIC_VERCEL_ENV`). Resolution happens once,
//! when a [`FairConfig`] is built, and the result is handed to the client
//! explicitly. Missing variables resolve to an empty string.
//!
//! ## Example
//!
//! ```
//! use faircompute_common::{Environment, FairConfig};
//!
//! let config = FairConfig::from_lookup(|name| match name {
//!     "NEXT_PUBLIC_LOCAL_FAIR_API_URL" => Some("http://localhost:8000".to_string()),
//!     _ => None,
//! });
//!
//! assert_eq!(config.environment(), Environment::Local);
//! assert_eq!(config.api_url(), "http://localhost:8000");
//! assert_eq!(config.stripe_price_id(), "");
//! ```

use std::fmt;

use secrecy::SecretString;

/// Name of the variable selecting the deployment environment.
pub const ENVIRONMENT_VAR: &str = "NEXT_PUBLIC_VERCEL_ENV";

const PROD_API_URL: &str = "NEXT_PUBLIC_PROD_FAIR_API_URL";
const LOCAL_API_URL: &str = "NEXT_PUBLIC_LOCAL_FAIR_API_URL";
const PROD_PROVIDER_PUB_KEY: &str = "NEXT_PUBLIC_PROD_FAIR_PROVIDER_PUB_KEY";
const LOCAL_PROVIDER_PUB_KEY: &str = "NEXT_PUBLIC_LOCAL_FAIR_PROVIDER_PUB_KEY";
const PROD_STRIPE_PUBLISHABLE_KEY: &str = "NEXT_PUBLIC_PROD_STRIPE_PUBLISHABLE_KEY";
const LOCAL_STRIPE_PUBLISHABLE_KEY: &str = "NEXT_PUBLIC_LOCAL_STRIPE_PUBLISHABLE_KEY";
const PROD_STRIPE_SECRET_KEY: &str = "PROD_STRIPE_SECRET_KEY";
const LOCAL_STRIPE_SECRET_KEY: &str = "LOCAL_STRIPE_SECRET_KEY";
const PROD_STRIPE_PRICE_ID: &str = "PROD_STRIPE_PRICE_ID";
const PREVIEW_STRIPE_PRICE_ID: &str = "PREVIEW_STRIPE_PRICE_ID";
const LOCAL_STRIPE_PRICE_ID: &str = "LOCAL_STRIPE_PRICE_ID";
const OMNISEND_API_KEY: &str = "NEXT_PUBLIC_OMNISEND_API_KEY";

/// Deployment environment the configuration was resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    /// Live marketplace.
    Production,
    /// Preview deployments. Only the Stripe price id has a preview variant;
    /// everything else falls back to the local values.
    Preview,
    /// Local development, and any unrecognised discriminator.
    #[default]
    Local,
}

impl Environment {
    /// Maps the discriminator value onto an environment.
    ///
    /// `"production"` and `"preview"` are recognised; anything else, including
    /// an unset variable, selects [`Environment::Local`].
    #[must_use]
    pub fn from_discriminator(value: Option<&str>) -> Self {
        match value {
            Some("production") => Self::Production,
            Some("preview") => Self::Preview,
            _ => Self::Local,
        }
    }

    /// Returns the discriminator string for this environment.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Preview => "preview",
            Self::Local => "local",
        }
    }

    /// Returns `true` for [`Environment::Production`].
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stripe checkout settings.
#[derive(Clone)]
pub struct StripeConfig {
    /// Publishable key, safe to expose to browsers.
    pub publishable_key: String,
    /// Secret key for server-side calls.
    pub secret_key: SecretString,
    /// Price identifier used when creating checkout sessions.
    pub price_id: String,
}

impl fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeConfig")
            .field("publishable_key", &self.publishable_key)
            .field("secret_key", &"[REDACTED]")
            .field("price_id", &self.price_id)
            .finish()
    }
}

/// Configuration for the marketplace client and its integrations.
///
/// # Security
///
/// The provider key, the Stripe secret key and the Omnisend key are stored as
/// `SecretString` and never appear in `Debug` output.
#[derive(Clone)]
pub struct FairConfig {
    environment: Environment,
    api_url: String,
    provider_pub_key: SecretString,
    stripe: StripeConfig,
    omnisend_api_key: SecretString,
}

impl fmt::Debug for FairConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FairConfig")
            .field("environment", &self.environment)
            .field("api_url", &self.api_url)
            .field("provider_pub_key", &"[REDACTED]")
            .field("stripe", &self.stripe)
            .field("omnisend_api_key", &"[REDACTED]")
            .finish()
    }
}

impl FairConfig {
    /// Resolves the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves the configuration against an arbitrary variable source.
    ///
    /// # Arguments
    ///
    /// * `lookup` - Returns the value of a variable, or `None` when unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::from_discriminator(lookup(ENVIRONMENT_VAR).as_deref());
        let read = |name: &str| lookup(name).unwrap_or_default();
        let by_env = |prod: &str, local: &str| {
            if environment.is_production() {
                read(prod)
            } else {
                read(local)
            }
        };

        let price_id = match environment {
            Environment::Production => read(PROD_STRIPE_PRICE_ID),
            Environment::Preview => read(PREVIEW_STRIPE_PRICE_ID),
            Environment::Local => read(LOCAL_STRIPE_PRICE_ID),
        };

        let config = Self {
            environment,
            api_url: by_env(PROD_API_URL, LOCAL_API_URL),
            provider_pub_key: SecretString::from(by_env(
                PROD_PROVIDER_PUB_KEY,
                LOCAL_PROVIDER_PUB_KEY,
            )),
            stripe: StripeConfig {
                publishable_key: by_env(PROD_STRIPE_PUBLISHABLE_KEY, LOCAL_STRIPE_PUBLISHABLE_KEY),
                secret_key: SecretString::from(by_env(
                    PROD_STRIPE_SECRET_KEY,
                    LOCAL_STRIPE_SECRET_KEY,
                )),
                price_id,
            },
            omnisend_api_key: SecretString::from(read(OMNISEND_API_KEY)),
        };

        if config.api_url.is_empty() {
            log::warn!("No API URL configured for the {environment} environment");
        }

        config
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Overrides the provider public key.
    #[must_use]
    pub fn with_provider_pub_key(mut self, key: impl Into<String>) -> Self {
        self.provider_pub_key = SecretString::from(key.into());
        self
    }

    /// The environment this configuration was resolved for.
    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    /// Base URL of the marketplace API.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Provider public key sent as `X-API-Key`.
    #[must_use]
    pub const fn provider_pub_key(&self) -> &SecretString {
        &self.provider_pub_key
    }

    /// Stripe settings.
    #[must_use]
    pub const fn stripe(&self) -> &StripeConfig {
        &self.stripe
    }

    /// Stripe publishable key.
    #[must_use]
    pub fn stripe_publishable_key(&self) -> &str {
        &self.stripe.publishable_key
    }

    /// Stripe secret key.
    #[must_use]
    pub const fn stripe_secret_key(&self) -> &SecretString {
        &self.stripe.secret_key
    }

    /// Stripe price id.
    #[must_use]
    pub fn stripe_price_id(&self) -> &str {
        &self.stripe.price_id
    }

    /// Omnisend marketing API key. Identical in every environment.
    #[must_use]
    pub const fn omnisend_api_key(&self) -> &SecretString {
        &self.omnisend_api_key
    }
}

impl Default for FairConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
