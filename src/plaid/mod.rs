//! Bank account linking through the Plaid aggregation API: the JSON
//! endpoints used by Plaid Link and the storage for linked items.

mod api;
mod db;

pub use api::{create_link_token, exchange_public_token, plaid_webhook, sync_transactions};
pub use db::{
    Account, Institution, NewAccount, PlaidItem, SyncCursor, create_account, create_institution,
    create_plaid_item, create_plaid_tables, get_access_token, get_accounts_for_item,
    get_institution, get_plaid_item, get_sync_cursor, mark_plaid_item_removed,
    upsert_sync_cursor,
};
