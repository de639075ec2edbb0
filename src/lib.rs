//! A web app for tracking income and expenses.
//!
//! Transactions are entered through HTMX forms served as HTML pages, and are
//! sorted into categories by user-defined regex rules with a set of built-in
//! rules as a fallback. Bank accounts can be linked through Plaid, with the
//! access tokens encrypted at rest.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod config;
mod database_id;
mod db;
mod endpoints;
mod error;
mod error_page;
mod home;
mod html;
mod logging;
mod navigation;
mod plaid;
mod routing;
mod rule;
mod secret;
#[cfg(test)]
mod test_utils;
mod transaction;

pub use app_state::AppState;
pub use config::{Config, PlaidConfig};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use plaid::{
    Account, Institution, NewAccount, PlaidItem, SyncCursor, create_account, create_institution,
    create_plaid_item, get_access_token, get_accounts_for_item, get_institution, get_plaid_item,
    get_sync_cursor, mark_plaid_item_removed, upsert_sync_cursor,
};
pub use routing::build_router;
pub use rule::{
    CategoryMatcher, CategoryRule, MatchRule, NewCategoryRule, classify, create_category_rule,
    default_rules, delete_category_rule, get_active_category_rules, get_all_category_rules,
    get_category_rule,
};
pub use secret::{DerivedKey, TokenCipher, derive_key};
pub use transaction::{
    AmountPolicy, Transaction, TransactionBuilder, count_transactions, create_transaction,
    get_recent_transactions, get_transaction,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate_signal) => {
                terminate_signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
