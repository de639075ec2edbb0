//! Category rules assign a category to transactions whose merchant matches a
//! regex pattern. Stored rules are evaluated by descending priority, followed
//! by a fixed set of built-in rules.

mod create;
mod db;
mod delete;
mod list;
mod matcher;
mod models;

pub use create::{create_rule_endpoint, get_new_rule_page};
pub use db::{
    create_category_rule, create_category_rule_table, delete_category_rule,
    get_active_category_rules, get_all_category_rules, get_category_rule,
};
pub use delete::delete_rule_endpoint;
pub use list::get_rules_page;
pub use matcher::{
    CategoryMatcher, DEFAULT_RULE_PRIORITY, FALLBACK_CATEGORY, MatchRule, classify,
    compile_pattern, default_rules,
};
pub use models::{CategoryRule, NewCategoryRule};
