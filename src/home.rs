//! The landing page with the most recently added transactions.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    transaction::{Transaction, count_transactions, get_recent_transactions},
};

/// How many transactions are shown on the home page.
pub const RECENT_TRANSACTION_LIMIT: u32 = 20;

/// The state needed for the home page.
#[derive(Debug, Clone)]
pub struct HomeState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for HomeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the home page.
pub async fn get_home_page(State(state): State<HomeState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_recent_transactions(RECENT_TRANSACTION_LIMIT, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve recent transactions: {error}"))?;
    let total = count_transactions(&connection)?;

    Ok(home_view(&transactions, total).into_response())
}

fn transaction_row(transaction: &Transaction) -> Markup {
    let amount_style = if transaction.amount.is_sign_negative() {
        "text-red-600 dark:text-red-400"
    } else {
        "text-green-600 dark:text-green-400"
    };

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (transaction.date) }
            td class=(TABLE_CELL_STYLE) { (transaction.merchant) }
            td class={ (TABLE_CELL_STYLE) " text-right " (amount_style) }
            {
                (format_currency(transaction.amount))
            }
            td class=(TABLE_CELL_STYLE)
            {
                @if let Some(category) = &transaction.category {
                    span class=(CATEGORY_BADGE_STYLE) { (category) }
                }
            }
            td class=(TABLE_CELL_STYLE) { (transaction.account) }
        }
    )
}

fn home_view(transactions: &[Transaction], total: u32) -> Markup {
    let new_transaction_route = endpoints::NEW_TRANSACTION_VIEW;
    let nav_bar = NavBar::new(endpoints::ROOT).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                h1 class="text-2xl font-bold" { "Budget Tracker" }

                p
                {
                    "Welcome! Record your income and expenses, and let category rules \
                    sort them for you."
                }

                a href=(new_transaction_route) class={ "inline-block max-w-xs " (BUTTON_PRIMARY_STYLE) }
                {
                    "Add a Transaction"
                }

                h2 class="text-lg font-semibold" { "Recent Transactions" }

                section class="dark:bg-gray-800 overflow-x-auto"
                {
                    table
                        id="recent-transactions"
                        class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Merchant" }
                                th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                (transaction_row(transaction))
                            }

                            @if transactions.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No transactions yet. "
                                        a href=(new_transaction_route) class=(LINK_STYLE)
                                        {
                                            "Add your first transaction"
                                        }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }

                @if total as usize > transactions.len() {
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Showing the " (transactions.len()) " most recent of " (total) " transactions."
                    }
                }
            }
        }
    );

    base("Home", &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use rust_decimal::Decimal;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        endpoints,
        test_utils::{assert_status_ok, assert_valid_html, get_test_connection, parse_html_document},
        transaction::{AmountPolicy, Transaction, create_transaction},
    };

    use super::{HomeState, RECENT_TRANSACTION_LIMIT, get_home_page};

    #[tokio::test]
    async fn shows_recent_transactions() {
        let connection = get_test_connection();
        create_transaction(
            Transaction::build(date!(2025 - 01 - 14), Decimal::new(-4599, 2), "grocer", "checking")
                .category(Some("Groceries".to_owned())),
            AmountPolicy::Signed,
            &connection,
        )
        .unwrap();
        create_transaction(
            Transaction::build(date!(2025 - 01 - 15), Decimal::new(250000, 2), "acme", "savings")
                .category(Some("Income".to_owned())),
            AmountPolicy::Signed,
            &connection,
        )
        .unwrap();
        let state = HomeState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_home_page(State(state)).await.unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let rows: Vec<String> = html
            .select(&Selector::parse("#recent-transactions tbody tr").unwrap())
            .map(|row| row.text().collect::<String>())
            .collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("Acme"), "got {}", rows[0]);
        assert!(rows[0].contains("$2,500.00"), "got {}", rows[0]);
        assert!(rows[1].contains("Grocer"), "got {}", rows[1]);
        assert!(rows[1].contains("-$45.99"), "got {}", rows[1]);
    }

    #[tokio::test]
    async fn links_to_add_transaction() {
        let state = HomeState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let response = get_home_page(State(state)).await.unwrap();

        let html = parse_html_document(response).await;
        let link_selector = Selector::parse(&format!(
            "main a[href='{}']",
            endpoints::NEW_TRANSACTION_VIEW
        ))
        .unwrap();
        assert!(html.select(&link_selector).next().is_some());
    }

    #[tokio::test]
    async fn limits_number_of_transactions() {
        let connection = get_test_connection();
        for _ in 0..RECENT_TRANSACTION_LIMIT + 5 {
            create_transaction(
                Transaction::build(date!(2025 - 01 - 15), Decimal::ONE, "shop", "checking"),
                AmountPolicy::Signed,
                &connection,
            )
            .unwrap();
        }
        let state = HomeState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_home_page(State(state)).await.unwrap();

        let html = parse_html_document(response).await;
        let rows = html
            .select(&Selector::parse("#recent-transactions tbody tr").unwrap())
            .count();
        assert_eq!(rows, RECENT_TRANSACTION_LIMIT as usize);
    }
}
