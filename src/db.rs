//! Sets up the application's SQLite database.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, plaid::create_plaid_tables, rule::create_category_rule_table,
    transaction::create_transaction_table,
};

/// Create all the tables and indexes used by the application.
///
/// Foreign key enforcement is switched on for `connection`. The tables are
/// created in a single exclusive transaction, and tables that already exist
/// are left untouched, so this is safe to call on every start up.
///
/// # Errors
/// Returns an error if a table could not be created or there is some other SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_transaction_table(&transaction)?;
    create_category_rule_table(&transaction)?;
    create_plaid_tables(&transaction)?;

    transaction.commit()?;

    tracing::debug!("Database initialized");

    Ok(())
}
