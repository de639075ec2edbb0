use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    alert::Alert,
    database_id::RuleId,
    rule::{db::delete_category_rule, models::RuleState},
};

/// A route handler for deleting a category rule.
pub async fn delete_rule_endpoint(
    Path(rule_id): Path<RuleId>,
    State(state): State<RuleState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category_rule(rule_id, &connection) {
        Ok(_) => (
            StatusCode::OK,
            Alert::Success {
                message: "Rule deleted successfully".to_owned(),
                details: String::new(),
            }
            .into_html(),
        )
            .into_response(),
        Err(Error::DeleteMissingRule) => Error::DeleteMissingRule.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting rule {rule_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        Error,
        rule::{
            db::{create_category_rule, get_category_rule},
            models::{NewCategoryRule, RuleState},
        },
        test_utils::{assert_status_ok, get_test_connection},
    };

    use super::delete_rule_endpoint;

    #[tokio::test]
    async fn deletes_rule() {
        let connection = get_test_connection();
        let rule = create_category_rule(NewCategoryRule::new("coffee", "Dining"), &connection)
            .unwrap();
        let state = RuleState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_rule_endpoint(Path(rule.id), State(state.clone())).await;

        assert_status_ok(&response);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_category_rule(rule.id, &connection), Err(Error::NotFound));
    }

    #[tokio::test]
    async fn deleting_missing_rule_is_not_found() {
        let state = RuleState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let response = delete_rule_endpoint(Path(42), State(state)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
