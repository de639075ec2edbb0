//! Full-page responses for missing routes and unexpected failures.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// A full HTML error page with a large status header, a description of what
/// went wrong, and a suggested fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPage<'a> {
    status: StatusCode,
    description: &'a str,
    fix: &'a str,
}

impl<'a> ErrorPage<'a> {
    /// The page for a route or resource that does not exist.
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            description: "Something's missing.",
            fix: "Sorry, we can't find that page. You'll find lots to explore on the home page.",
        }
    }

    /// The page for an internal server error with a specific description and fix.
    pub fn internal(description: &'a str, fix: &'a str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            description,
            fix,
        }
    }

    /// The page for an internal server error without a specific explanation.
    pub fn internal_generic() -> Self {
        Self::internal(
            "Sorry, something went wrong.",
            "Try again later or check the server logs",
        )
    }
}

impl IntoResponse for ErrorPage<'_> {
    fn into_response(self) -> Response {
        let title = self.status.canonical_reason().unwrap_or("Error");
        let header = self.status.as_str();

        (
            self.status,
            error_view(title, header, self.description, self.fix),
        )
            .into_response()
    }
}

/// Fallback route handler for unknown paths.
pub async fn get_404_not_found() -> Response {
    ErrorPage::not_found().into_response()
}

/// Route handler for the generic internal server error page.
pub async fn get_internal_server_error_page() -> Response {
    ErrorPage::internal_generic().into_response()
}
