//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    config::{Config, PlaidConfig},
    db::initialize,
    secret::TokenCipher,
    transaction::AmountPolicy,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// Encrypts access tokens before they are stored and decrypts them when read.
    pub token_cipher: Arc<TokenCipher>,

    /// Which transaction amounts are accepted.
    pub amount_policy: AmountPolicy,

    /// Settings for the Plaid API.
    pub plaid: Arc<PlaidConfig>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function derives the token key from `config` and initializes the
    /// database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the secret key or KDF salt are not valid for the
    /// configured environment, or if the database cannot be initialized.
    pub fn new(db_connection: Connection, config: &Config) -> Result<Self, Error> {
        let token_cipher = TokenCipher::from_config(config)?;

        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            token_cipher: Arc::new(token_cipher),
            amount_policy: config.amount_policy,
            plaid: Arc::new(config.plaid.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{Error, config::Config, transaction::AmountPolicy};

    use super::AppState;

    #[test]
    fn creates_state_from_config() {
        let config = Config::for_tests();

        let state = AppState::new(Connection::open_in_memory().unwrap(), &config)
            .expect("Could not create app state");

        assert_eq!(state.amount_policy, AmountPolicy::Signed);
        assert_eq!(state.plaid.environment, "sandbox");
        let ciphertext = state.token_cipher.encrypt(b"access-sandbox-123");
        assert_eq!(
            state.token_cipher.decrypt(&ciphertext),
            Ok(b"access-sandbox-123".to_vec())
        );
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        let config = Config {
            app_secret_key: Some("changeme".to_owned()),
            ..Config::for_tests()
        };

        let result = AppState::new(Connection::open_in_memory().unwrap(), &config);

        assert!(matches!(result, Err(Error::PlaceholderSecret)));
    }

    #[test]
    fn missing_salt_outside_development_is_rejected() {
        let config = Config {
            app_env: "production".to_owned(),
            app_kdf_salt: None,
            ..Config::for_tests()
        };

        let result = AppState::new(Connection::open_in_memory().unwrap(), &config);

        assert!(matches!(result, Err(Error::MissingKdfSalt(env)) if env == "production"));
    }
}
