use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{AppState, database_id::RuleId};

/// A rule that assigns a category to transactions whose merchant matches a pattern.
/// Pattern matching is a case-insensitive regex search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryRule {
    /// The ID of the rule.
    pub id: RuleId,

    /// The regular expression searched for in the merchant (case-insensitive).
    pub pattern: String,

    /// The category to assign when this rule matches.
    pub category: String,

    /// Rules with a higher priority are evaluated first.
    pub priority: i64,

    /// Inactive rules are kept but never used for classification.
    pub active: bool,

    /// Free text describing why the rule exists.
    pub notes: Option<String>,
}

/// The fields needed to create a [CategoryRule], see [CategoryRule] for details.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct NewCategoryRule {
    pub pattern: String,
    pub category: String,
    pub priority: i64,
    pub active: bool,
    pub notes: Option<String>,
}

impl NewCategoryRule {
    /// An active rule with the default priority of zero and no notes.
    pub fn new(pattern: &str, category: &str) -> Self {
        Self {
            pattern: pattern.to_owned(),
            category: category.to_owned(),
            priority: 0,
            active: true,
            notes: None,
        }
    }

    /// Set the priority of the rule.
    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Set whether the rule is used for classification.
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set the notes for the rule.
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}

/// Unified state for all rule-related operations.
#[derive(Debug, Clone)]
pub struct RuleState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RuleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Form data for creating rules.
#[derive(Debug, Serialize, Deserialize)]
pub struct RuleFormData {
    /// The regular expression searched for in the merchant (case-insensitive).
    pub pattern: String,
    /// The category to assign when the rule matches.
    pub category: String,
    /// Defaults to zero when left blank.
    #[serde(default)]
    pub priority: Option<i64>,
    /// Checkbox value, present ("on") when the rule should be active.
    #[serde(default)]
    pub active: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<RuleFormData> for NewCategoryRule {
    fn from(form: RuleFormData) -> Self {
        NewCategoryRule::new(&form.pattern, &form.category)
            .priority(form.priority.unwrap_or_default())
            .active(form.active.is_some())
            .notes(form.notes.filter(|notes| !notes.trim().is_empty()))
    }
}
