//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    alert::Alert,
    rule::{MatchRule, classify, default_rules, get_active_category_rules},
    transaction::core::{AmountPolicy, Transaction, create_transaction},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Which amounts are accepted.
    pub amount_policy: AmountPolicy,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            amount_policy: state.amount_policy,
        }
    }
}

/// The form data for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// The date when the transaction ocurred.
    pub date: Option<Date>,
    /// Who the money was paid to or received from.
    pub merchant: Option<String>,
    /// The value of the transaction in dollars.
    pub amount: Option<Decimal>,
    /// The name of the account, e.g. "checking".
    pub account: Option<String>,
    /// The category, assigned by category rules when left blank.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A route handler for creating a new transaction.
///
/// Responds with an alert with the ID and category of the new transaction.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let merchant = form.merchant.as_deref().map(str::trim).unwrap_or_default();
    let account = form.account.as_deref().map(str::trim).unwrap_or_default();
    let amount = form.amount.unwrap_or_default();

    let Some(date) = form.date else {
        tracing::debug!("Rejected transaction without a date: {form:?}");
        return Error::MissingRequiredFields.into_alert_response();
    };

    if merchant.is_empty() || account.is_empty() || amount.is_zero() {
        tracing::debug!("Rejected transaction with missing fields: {form:?}");
        return Error::MissingRequiredFields.into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let category = match form
        .category
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty())
    {
        Some(category) => category.to_owned(),
        None => {
            let stored_rules = match get_active_category_rules(&connection) {
                Ok(rules) => rules,
                Err(error) => {
                    tracing::error!("could not get category rules: {error}");
                    return error.into_alert_response();
                }
            };

            let rules: Vec<MatchRule> = stored_rules
                .iter()
                .map(MatchRule::from)
                .chain(default_rules())
                .collect();

            classify(merchant, &rules)
        }
    };

    let builder = Transaction::build(date, amount, merchant, account)
        .category(Some(category))
        .description(form.description);

    let transaction = match create_transaction(builder, state.amount_policy, &connection) {
        Ok(transaction) => transaction,
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            return error.into_alert_response();
        }
    };

    let category = transaction.category.unwrap_or_default();
    tracing::info!("Created transaction {} in category {category}", transaction.id);

    (
        StatusCode::OK,
        Alert::Success {
            message: "Transaction added!".to_owned(),
            details: format!("ID: {}, Category: {category}", transaction.id),
        },
    )
        .into_response()
}
