//! Alert system for displaying success and error messages to users.
//!
//! Alerts are HTML fragments that HTMX swaps into the `#alert-container`
//! element of the page that submitted a form.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// An alert message with a short headline and longer details.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The action completed successfully.
    Success {
        /// The headline of the alert.
        message: String,
        /// Extra detail shown below the headline.
        details: String,
    },
    /// The action failed.
    Error {
        /// The headline of the alert.
        message: String,
        /// Extra detail shown below the headline.
        details: String,
    },
}

impl Alert {
    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::Success { message, details } => (
                "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
                dark:bg-gray-800 dark:text-green-400",
                message,
                details,
            ),
            Alert::Error { message, details } => (
                "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
                dark:bg-gray-800 dark:text-red-400",
                message,
                details,
            ),
        };

        html! {
            div class=(container_style) role="alert"
            {
                div class="flex items-start justify-between gap-4"
                {
                    div
                    {
                        span class="font-medium" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        class="font-bold"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn renders_message_and_details() {
        let alert = Alert::Success {
            message: "Transaction added!".to_owned(),
            details: "ID: 1, Category: Shopping".to_owned(),
        };

        let fragment = Html::parse_fragment(&alert.into_html().into_string());

        let text = fragment
            .select(&Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("No alert found")
            .text()
            .collect::<String>();
        assert!(text.contains("Transaction added!"));
        assert!(text.contains("ID: 1, Category: Shopping"));
    }

    #[test]
    fn omits_empty_details() {
        let alert = Alert::Error {
            message: "Something went wrong".to_owned(),
            details: String::new(),
        };

        let fragment = Html::parse_fragment(&alert.into_html().into_string());

        assert_eq!(
            fragment.select(&Selector::parse("p").unwrap()).count(),
            0,
            "want no details paragraph for empty details"
        );
    }
}
