//! Application router configuration.

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::{
    AppState, endpoints,
    error_page::{get_404_not_found, get_internal_server_error_page},
    home::get_home_page,
    plaid::{create_link_token, exchange_public_token, plaid_webhook, sync_transactions},
    rule::{create_rule_endpoint, delete_rule_endpoint, get_new_rule_page, get_rules_page},
    transaction::{create_transaction_endpoint, get_create_transaction_page},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_home_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_create_transaction_page),
        )
        .route(endpoints::RULES_VIEW, get(get_rules_page))
        .route(endpoints::NEW_RULE_VIEW, get(get_new_rule_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let htmx_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint),
        )
        .route(endpoints::POST_RULE, post(create_rule_endpoint))
        .route(endpoints::DELETE_RULE, delete(delete_rule_endpoint));

    let plaid_routes = Router::new()
        .route(endpoints::PLAID_CREATE_LINK_TOKEN, post(create_link_token))
        .route(endpoints::PLAID_EXCHANGE, post(exchange_public_token))
        .route(endpoints::PLAID_SYNC, post(sync_transactions))
        .route(endpoints::PLAID_WEBHOOK, post(plaid_webhook));

    page_routes
        .merge(htmx_routes)
        .merge(plaid_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}
