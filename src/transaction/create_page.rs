//! Defines the route handler for the page for creating a new transaction.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};
use time::{Date, OffsetDateTime};

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_HINT_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base, loading_spinner,
    },
    navigation::NavBar,
};

/// The accounts a manually entered transaction can be recorded against.
pub const ACCOUNT_OPTIONS: [&str; 3] = ["checking", "savings", "credit_card"];

fn create_transaction_view(today: Date) -> Markup {
    let create_transaction_route = endpoints::TRANSACTIONS_API;
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let spinner = loading_spinner();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(create_transaction_route)
                hx-target="#alert-container"
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Add Transaction" }

                div
                {
                    label
                        for="date"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Date"
                    }

                    input
                        name="date"
                        id="date"
                        type="date"
                        required
                        value=(today)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label
                        for="merchant"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Merchant"
                    }

                    input
                        name="merchant"
                        id="merchant"
                        type="text"
                        placeholder="e.g., Starbucks"
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label
                        for="amount"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Amount"
                    }

                    input
                        name="amount"
                        id="amount"
                        type="number"
                        step="0.01"
                        placeholder="0.00"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);

                    p class=(FORM_HINT_STYLE)
                    {
                        "Positive for income, negative for expense"
                    }
                }

                div
                {
                    label
                        for="account"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Account"
                    }

                    select
                        name="account"
                        id="account"
                        required
                        class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for account in ACCOUNT_OPTIONS {
                            option value=(account) { (account) }
                        }
                    }
                }

                div
                {
                    label
                        for="category"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Category (auto-assigned if blank)"
                    }

                    input
                        name="category"
                        id="category"
                        type="text"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label
                        for="description"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Description"
                    }

                    input
                        name="description"
                        id="description"
                        type="text"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" id="indicator" class=(BUTTON_PRIMARY_STYLE)
                {
                    span class="htmx-indicator" { (spinner) }
                    "Add Transaction"
                }
            }
        }
    };

    base("Add Transaction", &content)
}

/// Renders the page for creating a transaction.
pub async fn get_create_transaction_page() -> Response {
    let today = OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date();

    create_transaction_view(today).into_response()
}

#[cfg(test)]
mod tests {
    use scraper::Selector;
    use time::OffsetDateTime;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_input_with_value, assert_hx_endpoint,
            assert_status_ok, assert_valid_html, must_get_form, parse_html_document,
        },
    };

    use super::{ACCOUNT_OPTIONS, get_create_transaction_page};

    #[tokio::test]
    async fn render_page() {
        let response = get_create_transaction_page().await;

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");
        assert_form_input(&form, "merchant", "text", true);
        assert_form_input(&form, "amount", "number", true);
        assert_form_input(&form, "category", "text", false);
        assert_form_input(&form, "description", "text", false);

        let today = OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date();
        assert_form_input_with_value(&form, "date", "date", &today.to_string());
    }

    #[tokio::test]
    async fn amount_accepts_cents_and_explains_sign() {
        let response = get_create_transaction_page().await;
        let html = parse_html_document(response).await;

        let amount = html
            .select(&Selector::parse("input[name=amount]").unwrap())
            .next()
            .expect("No amount input found");
        assert_eq!(amount.value().attr("step"), Some("0.01"));

        let page_text = html.root_element().text().collect::<String>();
        assert!(page_text.contains("Positive for income, negative for expense"));
    }

    #[tokio::test]
    async fn account_select_lists_accounts() {
        let response = get_create_transaction_page().await;
        let html = parse_html_document(response).await;

        let options: Vec<&str> = html
            .select(&Selector::parse("select[name=account] option").unwrap())
            .filter_map(|option| option.value().attr("value"))
            .collect();

        assert_eq!(options, ACCOUNT_OPTIONS);
    }
}
