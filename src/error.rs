//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;

use crate::{alert::Alert, error_page::ErrorPage};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The application secret is empty or still set to the placeholder value.
    ///
    /// This is a configuration error and the server must not start.
    #[error("APP_SECRET_KEY must be set to a secure value")]
    PlaceholderSecret,

    /// No KDF salt was configured for a deployment other than development.
    ///
    /// The string is the configured environment tag.
    #[error("APP_KDF_SALT must be set when APP_ENV is \"{0}\"")]
    MissingKdfSalt(String),

    /// The development KDF salt was configured for a deployment other than
    /// development.
    ///
    /// Distinct deployments must derive distinct keys, so the shared
    /// development salt is only accepted when APP_ENV is "dev".
    #[error("the development KDF salt cannot be used when APP_ENV is \"{0}\"")]
    DevelopmentKdfSalt(String),

    /// The derived key could not be turned into a token cipher.
    #[error("the derived key was rejected by the token cipher")]
    InvalidCipherKey,

    /// A stored token could not be decrypted with the current key.
    ///
    /// Either the token was tampered with, or it was encrypted with a key
    /// derived from a different secret or salt.
    #[error("could not decrypt the stored token")]
    TokenDecryption,

    /// A transaction form was submitted without a merchant, amount or account.
    #[error("missing required fields")]
    MissingRequiredFields,

    /// A transaction was created with an amount of zero.
    #[error("the transaction amount cannot be zero")]
    ZeroAmount,

    /// A transaction was created with an amount that is zero or negative while
    /// only positive amounts are allowed.
    #[error("the transaction amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// A transaction amount has more than two decimal places, or more than
    /// eight digits before the decimal point.
    #[error("the transaction amount {0} is outside the supported range")]
    AmountOutOfRange(Decimal),

    /// A category rule pattern is not a valid regular expression.
    #[error("invalid rule pattern \"{pattern}\": {reason}")]
    InvalidPattern {
        /// The pattern that failed to compile.
        pattern: String,
        /// The reason given by the regex compiler.
        reason: String,
    },

    /// An empty string was used as a category rule pattern.
    #[error("rule pattern cannot be empty")]
    EmptyRulePattern,

    /// An empty string was used as a category rule category.
    #[error("rule category cannot be empty")]
    EmptyRuleCategory,

    /// The specified external transaction ID already exists in the database.
    ///
    /// External IDs come from the aggregation feed and uniquely identify a
    /// transaction. Rejecting duplicates avoids recording the same transaction
    /// twice when a feed is replayed.
    #[error("the external transaction ID already exists in the database")]
    DuplicateExternalId,

    /// An institution, item or account with the same Plaid ID already exists.
    #[error("the Plaid ID already exists in the database")]
    DuplicatePlaidId,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a rule that does not exist
    #[error("tried to delete a rule that is not in the database")]
    DeleteMissingRule,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067
                    && desc.ends_with("transactions.external_txn_id") =>
            {
                Error::DuplicateExternalId
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains(".plaid_") =>
            {
                Error::DuplicatePlaidId
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => ErrorPage::not_found().into_response(),
            Error::DatabaseLockError => ErrorPage::internal_generic().into_response(),
            Error::TokenDecryption => ErrorPage::internal(
                "Could not read linked account credentials",
                "The stored credentials could not be decrypted. Check that APP_SECRET_KEY \
                    and APP_KDF_SALT match the values used when the account was linked.",
            )
            .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                ErrorPage::internal_generic().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::MissingRequiredFields => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Please fill in all required fields.".to_owned(),
                    details: "A transaction needs a merchant, a non-zero amount and an account."
                        .to_owned(),
                },
            ),
            Error::ZeroAmount => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: "The amount cannot be zero. Use a positive amount for income and \
                        a negative amount for an expense."
                        .to_owned(),
                },
            ),
            Error::NonPositiveAmount(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!("The amount must be positive, got {amount}."),
                },
            ),
            Error::AmountOutOfRange(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!(
                        "{amount} is not a valid amount. Amounts can have at most two decimal \
                        places and must be less than 100,000,000."
                    ),
                },
            ),
            Error::InvalidPattern { pattern, reason } => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid rule pattern".to_owned(),
                    details: format!("\"{pattern}\" is not a valid regular expression: {reason}"),
                },
            ),
            Error::EmptyRulePattern => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid rule".to_owned(),
                    details: "The rule pattern cannot be empty.".to_owned(),
                },
            ),
            Error::EmptyRuleCategory => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid rule".to_owned(),
                    details: "The rule category cannot be empty.".to_owned(),
                },
            ),
            Error::DuplicateExternalId => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Duplicate transaction".to_owned(),
                    details: "A transaction with the same external ID has already been recorded."
                        .to_owned(),
                },
            ),
            Error::DeleteMissingRule => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete rule".to_owned(),
                    details: "The rule could not be found. \
                    Try refreshing the page to see if the rule has already been deleted."
                        .to_owned(),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use crate::Error;

    #[test]
    fn maps_duplicate_external_id() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute(
                "CREATE TABLE transactions (id INTEGER PRIMARY KEY, external_txn_id TEXT UNIQUE)",
                (),
            )
            .unwrap();
        connection
            .execute("INSERT INTO transactions (external_txn_id) VALUES ('abc')", ())
            .unwrap();

        let error: Error = connection
            .execute("INSERT INTO transactions (external_txn_id) VALUES ('abc')", ())
            .unwrap_err()
            .into();

        assert_eq!(error, Error::DuplicateExternalId);
    }

    #[test]
    fn maps_no_rows_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        for error in [
            Error::MissingRequiredFields,
            Error::ZeroAmount,
            Error::AmountOutOfRange(Decimal::new(1, 3)),
            Error::EmptyRulePattern,
            Error::EmptyRuleCategory,
        ] {
            let response = error.into_alert_response();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn duplicate_external_id_is_a_conflict() {
        let response = Error::DuplicateExternalId.into_alert_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
