//! Assigns categories to merchants with ordered regex rules.

use std::cmp::Reverse;

use regex::{Regex, RegexBuilder};

use crate::{Error, rule::models::CategoryRule};

/// The category given to merchants that no rule matches.
pub const FALLBACK_CATEGORY: &str = "Miscellaneous";

/// The priority of the built-in rules, lower than any stored rule can have.
pub const DEFAULT_RULE_PRIORITY: i64 = i64::MIN;

/// The parts of a category rule needed for classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRule {
    /// A case-insensitive regular expression.
    pub pattern: String,
    /// The category assigned on a match.
    pub category: String,
    /// Higher priority rules are tried first.
    pub priority: i64,
}

impl MatchRule {
    /// Create a rule from borrowed strings.
    pub fn new(pattern: &str, category: &str, priority: i64) -> Self {
        Self {
            pattern: pattern.to_owned(),
            category: category.to_owned(),
            priority,
        }
    }
}

impl From<&CategoryRule> for MatchRule {
    fn from(rule: &CategoryRule) -> Self {
        Self::new(&rule.pattern, &rule.category, rule.priority)
    }
}

/// The built-in rules that are evaluated after all stored rules.
pub fn default_rules() -> Vec<MatchRule> {
    [
        ("amazon|amzn", "Shopping"),
        ("walmart|target|costco|best buy|ebay", "Shopping"),
        ("starbucks|coffee|cafe|tim hortons", "Dining"),
        ("restaurant|mcdonald|burger|pizza|sushi|doordash|uber eats|grubhub", "Dining"),
        ("grocery|supermarket|safeway|kroger|whole foods|trader joe|loblaws", "Groceries"),
        ("uber|lyft|taxi|transit|parking|shell|chevron|esso|petro|gas station", "Transportation"),
        ("netflix|spotify|hulu|disney|apple\\.com|youtube premium", "Subscriptions"),
        ("hydro|electric|water|internet|comcast|verizon|rogers|bell|at&t", "Utilities"),
        ("\\brent\\b|mortgage|property management|landlord", "Housing"),
        ("payroll|salary|direct deposit|paycheck", "Income"),
    ]
    .into_iter()
    .map(|(pattern, category)| MatchRule::new(pattern, category, DEFAULT_RULE_PRIORITY))
    .collect()
}

/// Compile `pattern` as a case-insensitive regular expression.
///
/// # Errors
/// Returns [Error::InvalidPattern] if the pattern is not a valid regular expression.
pub fn compile_pattern(pattern: &str) -> Result<Regex, Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|error| Error::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: error.to_string(),
        })
}

/// A set of rules compiled once for classifying many merchants.
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    rules: Vec<(Regex, String)>,
}

impl CategoryMatcher {
    /// Compile `rules` and order them by descending priority.
    ///
    /// The sort is stable, so rules with the same priority keep their order
    /// in `rules`. Rules whose pattern does not compile are skipped with a
    /// warning.
    pub fn new(rules: &[MatchRule]) -> Self {
        let mut ordered: Vec<&MatchRule> = rules.iter().collect();
        ordered.sort_by_key(|rule| Reverse(rule.priority));

        let rules = ordered
            .into_iter()
            .filter_map(|rule| match compile_pattern(&rule.pattern) {
                Ok(regex) => Some((regex, rule.category.clone())),
                Err(error) => {
                    tracing::warn!("Skipping category rule for \"{}\": {error}", rule.category);
                    None
                }
            })
            .collect();

        Self { rules }
    }

    /// The category of the first rule whose pattern is found in `merchant`,
    /// or [FALLBACK_CATEGORY] if no rule matches.
    pub fn classify(&self, merchant: &str) -> &str {
        let merchant = merchant.to_lowercase();

        self.rules
            .iter()
            .find(|(regex, _)| regex.is_match(&merchant))
            .map(|(_, category)| category.as_str())
            .unwrap_or(FALLBACK_CATEGORY)
    }
}

/// Return the category for `merchant` using `rules`.
///
/// Shortcut for building a [CategoryMatcher] and classifying a single merchant.
pub fn classify(merchant: &str, rules: &[MatchRule]) -> String {
    CategoryMatcher::new(rules).classify(merchant).to_owned()
}
