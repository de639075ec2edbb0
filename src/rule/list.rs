use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error, endpoints,
    html::{
        BUTTON_DELETE_STYLE, CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
    rule::{
        db::get_all_category_rules,
        matcher::{FALLBACK_CATEGORY, MatchRule, default_rules},
        models::{CategoryRule, RuleState},
    },
};

/// Route handler for the rules listing page.
pub async fn get_rules_page(State(state): State<RuleState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rules = get_all_category_rules(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve rules: {error}"))?;

    Ok(rules_view(&rules, &default_rules()).into_response())
}

fn pattern_code(pattern: &str) -> Markup {
    html!(
        code class="bg-gray-100 dark:bg-gray-700 px-2.5 py-0.5 rounded-sm text-xs"
        {
            (pattern)
        }
    )
}

fn rule_row(rule: &CategoryRule) -> Markup {
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_RULE, rule.id);

    html!(
        tr class=(TABLE_ROW_STYLE) data-rule-id=(rule.id)
        {
            td class=(TABLE_CELL_STYLE) { (rule.priority) }
            td class=(TABLE_CELL_STYLE) { (pattern_code(&rule.pattern)) }
            td class=(TABLE_CELL_STYLE)
            {
                span class=(CATEGORY_BADGE_STYLE) { (rule.category) }
            }
            td class=(TABLE_CELL_STYLE)
            {
                @if rule.active { "Yes" } @else { "No" }
            }
            td class=(TABLE_CELL_STYLE) { (rule.notes.as_deref().unwrap_or_default()) }
            td class=(TABLE_CELL_STYLE)
            {
                button
                    hx-delete=(delete_url)
                    hx-confirm=(format!(
                        "Are you sure you want to delete the rule '{}' → '{}'?",
                        rule.pattern, rule.category
                    ))
                    hx-target="closest tr"
                    hx-swap="delete"
                    hx-target-error="#alert-container"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    )
}

fn rules_view(rules: &[CategoryRule], built_in_rules: &[MatchRule]) -> Markup {
    let new_rule_route = endpoints::NEW_RULE_VIEW;
    let nav_bar = NavBar::new(endpoints::RULES_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                h1 class="text-xl font-bold" { "Category Rules" }

                aside class="p-4 bg-blue-50 dark:bg-blue-900/20 rounded"
                {
                    h3 class="text-sm font-medium text-blue-800 dark:text-blue-200 mb-2"
                    {
                        "How Rules Work"
                    }

                    p class="text-xs text-blue-700 dark:text-blue-300"
                    {
                        "When a transaction is added without a category, active rules are
                        checked from highest to lowest priority and the first pattern found
                        in the merchant name (case-insensitive) sets the category.
                        Your rules are always checked before the built-in rules.
                        Merchants that match no rule are categorised as "
                        (FALLBACK_CATEGORY) "."
                    }
                }

                header class="flex justify-between flex-wrap items-end"
                {
                    a href=(new_rule_route) class=(LINK_STYLE)
                    {
                        "Create Rule"
                    }
                }

                section id="stored-rules" class="dark:bg-gray-800 overflow-x-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Priority" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Pattern" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Active" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Notes" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for rule in rules {
                                (rule_row(rule))
                            }

                            @if rules.is_empty() {
                                tr
                                {
                                    td
                                        colspan="6"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No rules created yet. "
                                        a href=(new_rule_route) class=(LINK_STYLE)
                                        {
                                            "Create your first rule"
                                        }
                                        " to categorise transactions automatically."
                                    }
                                }
                            }
                        }
                    }
                }

                h2 class="text-lg font-semibold" { "Built-in Rules" }

                section id="default-rules" class="dark:bg-gray-800 overflow-x-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Pattern" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            }
                        }

                        tbody
                        {
                            @for rule in built_in_rules {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (pattern_code(&rule.pattern)) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        span class=(CATEGORY_BADGE_STYLE) { (rule.category) }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Rules", &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use scraper::{Html, Selector};

    use crate::{
        endpoints,
        rule::{
            db::create_category_rule,
            matcher::default_rules,
            models::{NewCategoryRule, RuleState},
        },
        test_utils::{assert_status_ok, assert_valid_html, get_test_connection, parse_html_document},
    };

    use super::get_rules_page;

    fn stored_rule_rows(html: &Html) -> Vec<Vec<String>> {
        let row_selector = Selector::parse("#stored-rules tbody tr[data-rule-id]").unwrap();
        let cell_selector = Selector::parse("td").unwrap();

        html.select(&row_selector)
            .map(|row| {
                row.select(&cell_selector)
                    .map(|cell| cell.text().collect::<String>().trim().to_owned())
                    .collect()
            })
            .collect()
    }

    #[tokio::test]
    async fn lists_stored_rules_in_priority_order() {
        let connection = get_test_connection();
        create_category_rule(NewCategoryRule::new("coffee", "Dining"), &connection).unwrap();
        create_category_rule(
            NewCategoryRule::new("whole foods", "Groceries").priority(10),
            &connection,
        )
        .unwrap();
        let state = RuleState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_rules_page(State(state)).await.unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let rows = stored_rule_rows(&html);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][..3], ["10", "whole foods", "Groceries"]);
        assert_eq!(rows[1][..3], ["0", "coffee", "Dining"]);
    }

    #[tokio::test]
    async fn rule_rows_have_delete_buttons() {
        let connection = get_test_connection();
        let rule = create_category_rule(NewCategoryRule::new("coffee", "Dining"), &connection)
            .unwrap();
        let state = RuleState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_rules_page(State(state)).await.unwrap();

        let html = parse_html_document(response).await;
        let button = html
            .select(&Selector::parse("#stored-rules button[hx-delete]").unwrap())
            .next()
            .expect("No delete button found");
        assert_eq!(
            button.value().attr("hx-delete"),
            Some(endpoints::format_endpoint(endpoints::DELETE_RULE, rule.id).as_str())
        );
    }

    #[tokio::test]
    async fn lists_built_in_rules() {
        let state = RuleState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let response = get_rules_page(State(state)).await.unwrap();

        let html = parse_html_document(response).await;
        let rows = html
            .select(&Selector::parse("#default-rules tbody tr").unwrap())
            .count();
        assert_eq!(rows, default_rules().len());
    }
}
