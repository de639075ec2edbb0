use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
// axum_extra's Form parses empty strings as None, which the optional priority
// and notes fields rely on.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};

use crate::{
    Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_HINT_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    rule::{
        db::create_category_rule,
        models::{RuleFormData, RuleState},
    },
};

/// Route handler for the new rule page.
pub async fn get_new_rule_page() -> Response {
    new_rule_view().into_response()
}

/// A route handler for creating a new category rule.
///
/// Redirects to the rules page on success, otherwise responds with an error alert.
pub async fn create_rule_endpoint(
    State(state): State<RuleState>,
    Form(new_rule): Form<RuleFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category_rule(new_rule.into(), &connection) {
        Ok(rule) => {
            tracing::info!(
                "Created rule {}: \"{}\" -> \"{}\"",
                rule.id,
                rule.pattern,
                rule.category
            );

            (
                HxRedirect(endpoints::RULES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(
            error @ (Error::EmptyRulePattern
            | Error::EmptyRuleCategory
            | Error::InvalidPattern { .. }),
        ) => {
            tracing::debug!("Rejected new rule: {error}");
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a rule: {error}");
            error.into_alert_response()
        }
    }
}

fn new_rule_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_RULE_VIEW).into_html();
    let form = new_rule_form_view();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (form)
        }
    };

    base("Create Rule", &content)
}

fn new_rule_form_view() -> Markup {
    let create_rule_endpoint = endpoints::POST_RULE;

    html! {
        form
            hx-post=(create_rule_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { "New Rule" }

            div
            {
                label
                    for="pattern"
                    class=(FORM_LABEL_STYLE)
                {
                    "Pattern"
                }

                input
                    id="pattern"
                    type="text"
                    name="pattern"
                    placeholder="e.g., starbucks|coffee"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);

                p class=(FORM_HINT_STYLE)
                {
                    "A regular expression searched for anywhere in the merchant name (case-insensitive)"
                }
            }

            div
            {
                label
                    for="category"
                    class=(FORM_LABEL_STYLE)
                {
                    "Category"
                }

                input
                    id="category"
                    type="text"
                    name="category"
                    placeholder="e.g., Dining"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label
                    for="priority"
                    class=(FORM_LABEL_STYLE)
                {
                    "Priority"
                }

                input
                    id="priority"
                    type="number"
                    name="priority"
                    step="1"
                    value="0"
                    class=(FORM_TEXT_INPUT_STYLE);

                p class=(FORM_HINT_STYLE)
                {
                    "Rules with a higher priority are checked first"
                }
            }

            div class="flex items-center gap-2"
            {
                input
                    id="active"
                    type="checkbox"
                    name="active"
                    checked
                    class="w-4 h-4 rounded";

                label for="active" class="text-sm font-medium" { "Active" }
            }

            div
            {
                label
                    for="notes"
                    class=(FORM_LABEL_STYLE)
                {
                    "Notes"
                }

                textarea
                    id="notes"
                    name="notes"
                    rows="2"
                    class=(FORM_TEXT_INPUT_STYLE)
                {}
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                "Create Rule"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;

    use crate::{
        endpoints,
        rule::{
            db::get_all_category_rules,
            models::{RuleFormData, RuleState},
        },
        test_utils::{
            assert_form_input, assert_form_submit_button_with_text, assert_hx_endpoint,
            assert_hx_redirect, assert_status_ok, assert_valid_html, get_test_connection,
            must_get_form, parse_html_document, parse_html_fragment,
        },
    };

    use super::{create_rule_endpoint, get_new_rule_page};

    fn get_test_state() -> RuleState {
        RuleState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    fn rule_form(pattern: &str, category: &str) -> RuleFormData {
        RuleFormData {
            pattern: pattern.to_owned(),
            category: category.to_owned(),
            priority: Some(5),
            active: Some("on".to_owned()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn new_rule_page_has_form() {
        let response = get_new_rule_page().await;

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_RULE, "hx-post");
        assert_form_input(&form, "pattern", "text", true);
        assert_form_input(&form, "category", "text", true);
        assert_form_input(&form, "priority", "number", false);
        assert_form_submit_button_with_text(&form, "Create Rule");
    }

    #[tokio::test]
    async fn create_rule_redirects_to_rules_page() {
        let state = get_test_state();

        let response =
            create_rule_endpoint(State(state.clone()), Form(rule_form("coffee", "Dining"))).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::RULES_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let rules = get_all_category_rules(&connection).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].pattern, "coffee");
        assert_eq!(rules[0].category, "Dining");
        assert_eq!(rules[0].priority, 5);
        assert!(rules[0].active);
    }

    #[tokio::test]
    async fn unchecked_active_box_creates_inactive_rule() {
        let state = get_test_state();
        let mut form = rule_form("coffee", "Dining");
        form.active = None;

        create_rule_endpoint(State(state.clone()), Form(form)).await;

        let connection = state.db_connection.lock().unwrap();
        let rules = get_all_category_rules(&connection).unwrap();
        assert!(!rules[0].active);
    }

    #[tokio::test]
    async fn invalid_regex_is_rejected() {
        let state = get_test_state();

        let response =
            create_rule_endpoint(State(state.clone()), Form(rule_form("caf(e", "Dining"))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Invalid rule pattern"), "got alert text {text:?}");
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_all_category_rules(&connection), Ok(vec![]));
    }

    #[tokio::test]
    async fn empty_category_is_rejected() {
        let state = get_test_state();

        let response =
            create_rule_endpoint(State(state.clone()), Form(rule_form("coffee", " "))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_all_category_rules(&connection), Ok(vec![]));
    }
}
