//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/rules/{rule_id}', use [format_endpoint].

/// The home page with the most recent transactions.
pub const ROOT: &str = "/";
/// The page for adding a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for creating a new rule.
pub const NEW_RULE_VIEW: &str = "/rules/new";
/// The page for listing all rules.
pub const RULES_VIEW: &str = "/rules";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";

/// The route to create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to create a rule.
pub const POST_RULE: &str = "/api/rules";
/// The route to delete a rule.
pub const DELETE_RULE: &str = "/api/rules/{rule_id}";

/// The route for creating a Plaid Link token.
pub const PLAID_CREATE_LINK_TOKEN: &str = "/plaid/create_link_token";
/// The route for exchanging a Plaid public token for an access token.
pub const PLAID_EXCHANGE: &str = "/plaid/exchange";
/// The route for syncing transactions from Plaid.
pub const PLAID_SYNC: &str = "/plaid/sync";
/// The route Plaid sends webhook events to.
pub const PLAID_WEBHOOK: &str = "/plaid/webhook";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with a right brace, for
/// example '{rule_id}' in '/api/rules/{rule_id}'. Only the first parameter is
/// replaced. If there is no closing brace, everything from the left brace
/// onwards is replaced.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| param_start + offset + 1);

    format!(
        "{}{id}{}",
        &endpoint_path[..param_start],
        &endpoint_path[param_end..]
    )
}
