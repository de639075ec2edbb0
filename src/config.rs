//! Application configuration sourced from environment variables.
//!
//! Every setting can also be passed as a command line flag, which takes
//! precedence over the environment.

use std::fmt;

use crate::{Error, transaction::AmountPolicy};

/// The environment tag for local development.
pub const DEV_ENVIRONMENT: &str = "dev";

/// The KDF salt used when running locally without `APP_KDF_SALT`.
///
/// Only accepted when `APP_ENV` is [DEV_ENVIRONMENT].
pub const DEV_KDF_SALT: &str = "budget-tracker-development-salt";

/// Settings for the application and the database.
#[derive(clap::Args, Clone)]
pub struct Config {
    /// Connection string for the SQLite database, e.g. "sqlite:///./budget_tracker.db".
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:///./budget_tracker.db"
    )]
    pub database_url: String,

    /// The deployment environment, "dev" for local development.
    #[arg(long, env = "APP_ENV", default_value = DEV_ENVIRONMENT)]
    pub app_env: String,

    /// The master secret used to derive the key that encrypts access tokens.
    #[arg(long, env = "APP_SECRET_KEY", hide_env_values = true)]
    pub app_secret_key: Option<String>,

    /// The salt for deriving the access token key. Must be unique per deployment.
    #[arg(long, env = "APP_KDF_SALT", hide_env_values = true)]
    pub app_kdf_salt: Option<String>,

    /// Which transaction amounts are accepted.
    #[arg(long, value_enum, env = "AMOUNT_POLICY", default_value = "signed")]
    pub amount_policy: AmountPolicy,

    #[command(flatten)]
    pub plaid: PlaidConfig,
}

impl Config {
    /// Whether the application is running in the development environment.
    pub fn is_development(&self) -> bool {
        self.app_env == DEV_ENVIRONMENT
    }

    /// The file path of the SQLite database with any `sqlite://` scheme removed.
    pub fn database_path(&self) -> &str {
        let url = self.database_url.as_str();

        url.strip_prefix("sqlite:///")
            .or_else(|| url.strip_prefix("sqlite://"))
            .unwrap_or(url)
    }

    /// The salt for deriving the access token key.
    ///
    /// Falls back to [DEV_KDF_SALT] in the development environment.
    ///
    /// # Errors
    /// Outside of development, returns [Error::MissingKdfSalt] if no salt is
    /// configured and [Error::DevelopmentKdfSalt] if the development salt is
    /// configured.
    pub fn kdf_salt(&self) -> Result<Vec<u8>, Error> {
        let salt = self
            .app_kdf_salt
            .as_deref()
            .filter(|salt| !salt.is_empty());

        match salt {
            Some(salt) if salt == DEV_KDF_SALT && !self.is_development() => {
                Err(Error::DevelopmentKdfSalt(self.app_env.clone()))
            }
            Some(salt) => Ok(salt.as_bytes().to_vec()),
            None if self.is_development() => {
                tracing::warn!(
                    "APP_KDF_SALT is not set, using the development salt. \
                    Set APP_KDF_SALT before deploying."
                );
                Ok(DEV_KDF_SALT.as_bytes().to_vec())
            }
            None => Err(Error::MissingKdfSalt(self.app_env.clone())),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("app_env", &self.app_env)
            .field("app_secret_key", &redact(&self.app_secret_key))
            .field("app_kdf_salt", &redact(&self.app_kdf_salt))
            .field("amount_policy", &self.amount_policy)
            .field("plaid", &self.plaid)
            .finish()
    }
}

/// Settings for the Plaid bank-data aggregation API.
#[derive(clap::Args, Clone)]
pub struct PlaidConfig {
    /// The Plaid client ID.
    #[arg(long = "plaid-client-id", env = "PLAID_CLIENT_ID", default_value = "")]
    pub client_id: String,

    /// The Plaid API secret.
    #[arg(
        long = "plaid-secret",
        env = "PLAID_SECRET",
        default_value = "",
        hide_env_values = true
    )]
    pub secret: String,

    /// The Plaid environment, e.g. "sandbox" or "production".
    #[arg(long = "plaid-env", env = "PLAID_ENV", default_value = "sandbox")]
    pub environment: String,

    /// Where Plaid Link redirects to after linking an account.
    #[arg(
        long = "plaid-redirect-uri",
        env = "PLAID_REDIRECT_URI",
        default_value = "http://localhost:8501"
    )]
    pub redirect_uri: String,

    /// Comma separated Plaid products, e.g. "transactions,auth".
    #[arg(
        long = "plaid-products",
        env = "PLAID_PRODUCTS",
        value_delimiter = ',',
        default_value = "transactions"
    )]
    pub products: Vec<String>,

    /// Comma separated country codes, e.g. "US,CA".
    #[arg(
        long = "plaid-country-codes",
        env = "PLAID_COUNTRY_CODES",
        value_delimiter = ',',
        default_value = "US,CA"
    )]
    pub country_codes: Vec<String>,

    /// The URL Plaid sends webhook events to.
    #[arg(
        long = "plaid-webhook-url",
        env = "PLAID_WEBHOOK_URL",
        default_value = "http://localhost:8000/plaid/webhook"
    )]
    pub webhook_url: String,
}

impl PlaidConfig {
    /// Whether both the client ID and secret have been provided.
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.secret.is_empty()
    }
}

impl fmt::Debug for PlaidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaidConfig")
            .field("client_id", &self.client_id)
            .field("secret", &redact(&Some(&self.secret).filter(|s| !s.is_empty())))
            .field("environment", &self.environment)
            .field("redirect_uri", &self.redirect_uri)
            .field("products", &self.products)
            .field("country_codes", &self.country_codes)
            .field("webhook_url", &self.webhook_url)
            .finish()
    }
}

fn redact<T>(value: &Option<T>) -> Option<&'static str> {
    value.as_ref().map(|_| "********")
}

#[cfg(test)]
impl Config {
    /// A development configuration with a throwaway secret and an in-memory database.
    pub(crate) fn for_tests() -> Self {
        Self {
            database_url: "sqlite://:memory:".to_owned(),
            app_env: DEV_ENVIRONMENT.to_owned(),
            app_secret_key: Some("test secret, do not use".to_owned()),
            app_kdf_salt: Some("test salt".to_owned()),
            amount_policy: AmountPolicy::Signed,
            plaid: PlaidConfig {
                client_id: String::new(),
                secret: String::new(),
                environment: "sandbox".to_owned(),
                redirect_uri: "http://localhost:8501".to_owned(),
                products: vec!["transactions".to_owned()],
                country_codes: vec!["US".to_owned(), "CA".to_owned()],
                webhook_url: "http://localhost:8000/plaid/webhook".to_owned(),
            },
        }
    }
}
