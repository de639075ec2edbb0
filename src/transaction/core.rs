//! Defines the core data models and database queries for transactions.

use std::str::FromStr;

use rusqlite::{Connection, Row, types::Type};
use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::{Error, database_id::TransactionId};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the transaction happened.
    pub date: Date,
    /// The amount of money spent or earned in this transaction.
    ///
    /// Positive amounts are income, negative amounts are expenses.
    pub amount: Decimal,
    /// Who the money was paid to or received from, in title case.
    pub merchant: String,
    /// Free text notes about the transaction.
    pub description: Option<String>,
    /// The category of the transaction, e.g. "Groceries".
    pub category: Option<String>,
    /// The name of the account the transaction was made with, e.g. "checking".
    pub account: String,
    /// The transaction ID from the bank data feed, used to skip duplicates.
    pub external_txn_id: Option<String>,
    /// The Plaid ID of the linked account the transaction came from.
    pub plaid_account_id: Option<String>,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// The merchant is trimmed and converted to title case.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(date: Date, amount: Decimal, merchant: &str, account: &str) -> TransactionBuilder {
        TransactionBuilder {
            date,
            amount,
            merchant: title_case(merchant),
            account: account.trim().to_owned(),
            description: None,
            category: None,
            external_txn_id: None,
            plaid_account_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use rust_decimal::Decimal;
/// use time::macros::date;
///
/// use crate::transaction::Transaction;
///
/// let transaction = Transaction::build(
///         date!(2025-01-15),
///         Decimal::new(-4599, 2),
///         "starbucks downtown",
///         "checking",
///     )
///     .category(Some("Dining".to_owned()));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The date when the transaction occurred.
    pub date: Date,

    /// The monetary amount of the transaction.
    ///
    /// Positive values represent income, negative values represent expenses.
    ///
    /// # Examples
    /// - `150.00` - Salary deposit
    /// - `-45.99` - Coffee shop purchase
    pub amount: Decimal,

    /// The merchant, already trimmed and in title case.
    pub merchant: String,

    /// The name of the account, e.g. "checking", "savings" or "credit_card".
    pub account: String,

    /// Optional notes.
    pub description: Option<String>,

    /// The category, e.g. "Groceries". Assigned by category rules when not
    /// given by the user.
    pub category: Option<String>,

    /// Unique identifier from the bank data feed.
    ///
    /// The database enforces uniqueness on this field, so replaying a feed
    /// fails with [Error::DuplicateExternalId] instead of recording the same
    /// transaction twice.
    pub external_txn_id: Option<String>,

    /// The Plaid ID of the linked account.
    pub plaid_account_id: Option<String>,
}

impl TransactionBuilder {
    /// Set the description for the transaction. Blank descriptions are stored as `None`.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|description| !description.trim().is_empty());
        self
    }

    /// Set the category for the transaction. The category is trimmed and
    /// blank categories are stored as `None`.
    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = category
            .map(|category| category.trim().to_owned())
            .filter(|category| !category.is_empty());
        self
    }

    /// Set the external ID for the transaction.
    pub fn external_txn_id(mut self, external_txn_id: Option<String>) -> Self {
        self.external_txn_id = external_txn_id;
        self
    }

    /// Set the linked account for the transaction.
    pub fn plaid_account_id(mut self, plaid_account_id: Option<String>) -> Self {
        self.plaid_account_id = plaid_account_id;
        self
    }
}

/// The most digits allowed after the decimal point of an amount.
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// The most digits allowed in an amount, counting the decimal places.
pub const AMOUNT_MAX_DIGITS: u32 = 10;

/// Check that `amount` fits in [AMOUNT_MAX_DIGITS] digits with at most
/// [AMOUNT_DECIMAL_PLACES] decimal places. Trailing zeros are ignored, so
/// "1.500" is accepted.
///
/// # Errors
/// Returns [Error::AmountOutOfRange] if the amount does not fit.
pub fn check_amount_range(amount: Decimal) -> Result<(), Error> {
    let limit = Decimal::from(10_i64.pow(AMOUNT_MAX_DIGITS - AMOUNT_DECIMAL_PLACES));

    if amount.normalize().scale() > AMOUNT_DECIMAL_PLACES || amount.abs() >= limit {
        return Err(Error::AmountOutOfRange(amount));
    }

    Ok(())
}

/// Which transaction amounts are accepted when creating a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AmountPolicy {
    /// Accept positive (income) and negative (expense) amounts, reject zero.
    #[default]
    Signed,
    /// Only accept amounts greater than zero.
    PositiveOnly,
}

impl AmountPolicy {
    /// Check `amount` against the policy.
    ///
    /// # Errors
    /// Returns [Error::ZeroAmount] for a zero amount under [AmountPolicy::Signed],
    /// or [Error::NonPositiveAmount] for an amount `<= 0` under
    /// [AmountPolicy::PositiveOnly].
    pub fn validate(self, amount: Decimal) -> Result<(), Error> {
        match self {
            AmountPolicy::Signed if amount.is_zero() => Err(Error::ZeroAmount),
            AmountPolicy::PositiveOnly if amount <= Decimal::ZERO => {
                Err(Error::NonPositiveAmount(amount))
            }
            _ => Ok(()),
        }
    }
}

/// Trim `text` and capitalise the first letter of each word, lowercasing the rest.
///
/// A word starts at any letter that follows a non-letter, so "o'neil's cafe"
/// becomes "O'Neil'S Cafe".
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_is_letter = false;

    for c in text.trim().chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }

    result
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_COLUMNS: &str = "id, date, amount, merchant, description, category, account, \
    external_txn_id, plaid_account_id, created_at";

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingRequiredFields] if the merchant or account is empty,
/// - [Error::AmountOutOfRange] if the amount has too many digits,
/// - [Error::ZeroAmount] or [Error::NonPositiveAmount] if the amount is not allowed by `policy`,
/// - [Error::DuplicateExternalId] if a transaction with the same external ID already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    policy: AmountPolicy,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if builder.merchant.is_empty() || builder.account.is_empty() {
        return Err(Error::MissingRequiredFields);
    }

    check_amount_range(builder.amount)?;
    policy.validate(builder.amount)?;

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO transactions
                (date, amount, merchant, description, category, account,
                 external_txn_id, plaid_account_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {SELECT_COLUMNS}"
        ))?
        .query_row(
            (
                builder.date,
                builder.amount.to_string(),
                builder.merchant,
                builder.description,
                builder.category,
                builder.account,
                builder.external_txn_id,
                builder.plaid_account_id,
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM transactions WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve the `limit` most recent transactions, newest first.
///
/// Transactions on the same date are ordered by most recently created.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_recent_transactions(
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM transactions ORDER BY date DESC, id DESC LIMIT ?1"
        ))?
        .query_map([limit], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM transactions;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Create the transactions table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    // Amounts are stored as text to keep the exact decimal value.
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                amount TEXT NOT NULL,
                merchant TEXT NOT NULL,
                description TEXT,
                category TEXT,
                account TEXT NOT NULL,
                external_txn_id TEXT UNIQUE,
                plaid_account_id TEXT,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_plaid_account_id
            ON transactions(plaid_account_id)",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Transaction].
///
/// Expects the columns in the order of [SELECT_COLUMNS].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_amount: String = row.get(2)?;
    let amount = Decimal::from_str(&raw_amount).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error))
    })?;

    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        amount,
        merchant: row.get(3)?,
        description: row.get(4)?,
        category: row.get(5)?,
        account: row.get(6)?,
        external_txn_id: row.get(7)?,
        plaid_account_id: row.get(8)?,
        created_at: row.get(9)?,
    })
}
