//! Transactions record money paid to or received from a merchant.
//!
//! This module contains:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing and querying transactions
//! - The page and endpoint for adding a transaction by hand

mod core;
mod create_endpoint;
mod create_page;

pub use core::{
    AmountPolicy, Transaction, TransactionBuilder, count_transactions, create_transaction,
    create_transaction_table, get_recent_transactions, get_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_create_transaction_page;
