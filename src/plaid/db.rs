//! Storage for linked institutions, Plaid items, bank accounts and sync cursors.
//!
//! Access tokens are encrypted with the [TokenCipher] before they are written
//! and are only decrypted on request by [get_access_token].

use std::str::FromStr;

use rusqlite::{Connection, Row, types::Type};
use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{AccountId, InstitutionId, PlaidItemId},
    secret::TokenCipher,
};

// ============================================================================
// MODELS
// ============================================================================

/// A bank or other financial institution known to Plaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Institution {
    /// The ID of the institution.
    pub id: InstitutionId,
    /// The display name, e.g. "First Platypus Bank".
    pub name: String,
    /// Plaid's ID for the institution, e.g. "ins_109508".
    pub plaid_institution_id: String,
}

/// A login at an institution that has been linked through Plaid.
#[derive(Clone, PartialEq, Eq)]
pub struct PlaidItem {
    /// The ID of the item.
    pub id: PlaidItemId,
    /// Plaid's ID for the item.
    pub plaid_item_id: String,
    /// The Plaid access token, encrypted with the [TokenCipher].
    pub access_token_enc: String,
    pub added_at: OffsetDateTime,
    /// Whether the user has unlinked the item.
    pub removed: bool,
}

impl std::fmt::Debug for PlaidItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaidItem")
            .field("id", &self.id)
            .field("plaid_item_id", &self.plaid_item_id)
            .field("added_at", &self.added_at)
            .field("removed", &self.removed)
            .finish_non_exhaustive()
    }
}

/// A bank account belonging to a linked item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// Plaid's ID for the account.
    pub plaid_account_id: String,
    /// The name of the account given by the institution.
    pub name: String,
    /// The last few digits of the account number.
    pub mask: Option<String>,
    /// e.g. "depository" or "credit".
    pub account_type: Option<String>,
    /// e.g. "checking" or "credit card".
    pub subtype: Option<String>,
    /// The institution that holds the account.
    pub institution_id: InstitutionId,
    /// The linked item the account was found through.
    pub item_id: PlaidItemId,
    /// The balance when the account was last synced.
    pub current_balance: Option<Decimal>,
    /// The currency of the balance, e.g. "USD".
    pub iso_currency_code: Option<String>,
}

/// The fields needed to create an [Account], see [Account] for details.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct NewAccount {
    pub plaid_account_id: String,
    pub name: String,
    pub mask: Option<String>,
    pub account_type: Option<String>,
    pub subtype: Option<String>,
    pub institution_id: InstitutionId,
    pub item_id: PlaidItemId,
    pub current_balance: Option<Decimal>,
    pub iso_currency_code: Option<String>,
}

/// Where the last transactions sync for an item finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCursor {
    /// The item the cursor belongs to.
    pub item_id: PlaidItemId,
    /// The opaque cursor returned by Plaid's transactions sync.
    pub transactions_cursor: Option<String>,
    /// When the item was last synced.
    pub last_synced_at: Option<OffsetDateTime>,
}

// ============================================================================
// INSTITUTIONS
// ============================================================================

/// Create an institution in the database.
///
/// # Errors
/// Returns [Error::DuplicatePlaidId] if the Plaid institution ID is already
/// stored, or [Error::SqlError] if there is some other SQL error.
pub fn create_institution(
    name: &str,
    plaid_institution_id: &str,
    connection: &Connection,
) -> Result<Institution, Error> {
    connection
        .prepare(
            "INSERT INTO institutions (name, plaid_institution_id) VALUES (?1, ?2)
             RETURNING id, name, plaid_institution_id",
        )?
        .query_row((name, plaid_institution_id), map_institution_row)
        .map_err(|error| error.into())
}

/// Retrieve an institution by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no institution with `id`.
pub fn get_institution(id: InstitutionId, connection: &Connection) -> Result<Institution, Error> {
    connection
        .prepare("SELECT id, name, plaid_institution_id FROM institutions WHERE id = :id")?
        .query_row(&[(":id", &id)], map_institution_row)
        .map_err(|error| error.into())
}

fn map_institution_row(row: &Row) -> Result<Institution, rusqlite::Error> {
    Ok(Institution {
        id: row.get(0)?,
        name: row.get(1)?,
        plaid_institution_id: row.get(2)?,
    })
}

// ============================================================================
// PLAID ITEMS
// ============================================================================

/// Store a linked item, encrypting `access_token` with `cipher`.
///
/// # Errors
/// Returns [Error::DuplicatePlaidId] if the Plaid item ID is already stored,
/// or [Error::SqlError] if there is some other SQL error.
pub fn create_plaid_item(
    plaid_item_id: &str,
    access_token: &str,
    cipher: &TokenCipher,
    connection: &Connection,
) -> Result<PlaidItem, Error> {
    let access_token_enc = cipher.encrypt(access_token.as_bytes());

    connection
        .prepare(
            "INSERT INTO plaid_items (plaid_item_id, access_token_enc, added_at, removed)
             VALUES (?1, ?2, ?3, 0)
             RETURNING id, plaid_item_id, access_token_enc, added_at, removed",
        )?
        .query_row(
            (plaid_item_id, access_token_enc, OffsetDateTime::now_utc()),
            map_plaid_item_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a linked item by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no item with `id`.
pub fn get_plaid_item(id: PlaidItemId, connection: &Connection) -> Result<PlaidItem, Error> {
    connection
        .prepare(
            "SELECT id, plaid_item_id, access_token_enc, added_at, removed
             FROM plaid_items WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_plaid_item_row)
        .map_err(|error| error.into())
}

/// Retrieve and decrypt the access token of the item with `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no item with `id`, or
/// [Error::TokenDecryption] if the token cannot be decrypted with `cipher`.
pub fn get_access_token(
    id: PlaidItemId,
    cipher: &TokenCipher,
    connection: &Connection,
) -> Result<String, Error> {
    let item = get_plaid_item(id, connection)?;
    let plaintext = cipher.decrypt(&item.access_token_enc)?;

    String::from_utf8(plaintext).map_err(|_| Error::TokenDecryption)
}

/// Flag the item with `id` as unlinked. The row and its accounts are kept.
///
/// # Errors
/// Returns [Error::NotFound] if there is no item with `id`.
pub fn mark_plaid_item_removed(id: PlaidItemId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("UPDATE plaid_items SET removed = 1 WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_plaid_item_row(row: &Row) -> Result<PlaidItem, rusqlite::Error> {
    Ok(PlaidItem {
        id: row.get(0)?,
        plaid_item_id: row.get(1)?,
        access_token_enc: row.get(2)?,
        added_at: row.get(3)?,
        removed: row.get(4)?,
    })
}

// ============================================================================
// ACCOUNTS
// ============================================================================

/// Create a bank account in the database.
///
/// # Errors
/// Returns [Error::DuplicatePlaidId] if the Plaid account ID is already stored,
/// or [Error::SqlError] if the institution or item does not exist.
pub fn create_account(account: NewAccount, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare(
            "INSERT INTO accounts (plaid_account_id, name, mask, type, subtype,
                institution_id, item_id, curr_balance, curr_iso_currency)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING id, plaid_account_id, name, mask, type, subtype,
                institution_id, item_id, curr_balance, curr_iso_currency",
        )?
        .query_row(
            (
                account.plaid_account_id,
                account.name,
                account.mask,
                account.account_type,
                account.subtype,
                account.institution_id,
                account.item_id,
                account.current_balance.map(|balance| balance.to_string()),
                account.iso_currency_code,
            ),
            map_account_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the accounts of the item with `item_id`, ordered by name.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_accounts_for_item(
    item_id: PlaidItemId,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, plaid_account_id, name, mask, type, subtype,
                institution_id, item_id, curr_balance, curr_iso_currency
             FROM accounts WHERE item_id = ?1 ORDER BY name ASC, id ASC",
        )?
        .query_map([item_id], map_account_row)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    let raw_balance: Option<String> = row.get(8)?;
    let current_balance = raw_balance
        .map(|balance| Decimal::from_str(&balance))
        .transpose()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(error)))?;

    Ok(Account {
        id: row.get(0)?,
        plaid_account_id: row.get(1)?,
        name: row.get(2)?,
        mask: row.get(3)?,
        account_type: row.get(4)?,
        subtype: row.get(5)?,
        institution_id: row.get(6)?,
        item_id: row.get(7)?,
        current_balance,
        iso_currency_code: row.get(9)?,
    })
}

// ============================================================================
// SYNC CURSORS
// ============================================================================

/// Save the transactions cursor for an item, replacing any previous cursor.
///
/// # Errors
/// Returns [Error::SqlError] if the item does not exist or there is an SQL error.
pub fn upsert_sync_cursor(
    item_id: PlaidItemId,
    transactions_cursor: &str,
    synced_at: OffsetDateTime,
    connection: &Connection,
) -> Result<SyncCursor, Error> {
    connection
        .prepare(
            "INSERT INTO plaid_cursors (item_id, transactions_cursor, last_synced_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(item_id) DO UPDATE SET
                transactions_cursor = excluded.transactions_cursor,
                last_synced_at = excluded.last_synced_at
             RETURNING item_id, transactions_cursor, last_synced_at",
        )?
        .query_row((item_id, transactions_cursor, synced_at), map_sync_cursor_row)
        .map_err(|error| error.into())
}

/// Retrieve the transactions cursor for an item.
///
/// # Errors
/// Returns [Error::NotFound] if the item has never been synced.
pub fn get_sync_cursor(item_id: PlaidItemId, connection: &Connection) -> Result<SyncCursor, Error> {
    connection
        .prepare(
            "SELECT item_id, transactions_cursor, last_synced_at
             FROM plaid_cursors WHERE item_id = :item_id",
        )?
        .query_row(&[(":item_id", &item_id)], map_sync_cursor_row)
        .map_err(|error| error.into())
}

fn map_sync_cursor_row(row: &Row) -> Result<SyncCursor, rusqlite::Error> {
    Ok(SyncCursor {
        item_id: row.get(0)?,
        transactions_cursor: row.get(1)?,
        last_synced_at: row.get(2)?,
    })
}

// ============================================================================
// TABLES
// ============================================================================

/// Create the institution, item, account and sync cursor tables.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn create_plaid_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS institutions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                plaid_institution_id TEXT NOT NULL UNIQUE
            )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS plaid_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                plaid_item_id TEXT NOT NULL UNIQUE,
                access_token_enc TEXT NOT NULL,
                added_at TEXT NOT NULL,
                removed INTEGER NOT NULL DEFAULT 0
            )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                plaid_account_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                mask TEXT,
                type TEXT,
                subtype TEXT,
                institution_id INTEGER NOT NULL,
                item_id INTEGER NOT NULL,
                curr_balance TEXT,
                curr_iso_currency TEXT,
                FOREIGN KEY(institution_id) REFERENCES institutions(id) ON DELETE CASCADE,
                FOREIGN KEY(item_id) REFERENCES plaid_items(id) ON DELETE CASCADE
            )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_accounts_item_id ON accounts(item_id)",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS plaid_cursors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL UNIQUE,
                transactions_cursor TEXT,
                last_synced_at TEXT,
                FOREIGN KEY(item_id) REFERENCES plaid_items(id) ON DELETE CASCADE
            )",
        (),
    )?;

    Ok(())
}
