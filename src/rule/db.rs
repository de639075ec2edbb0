use rusqlite::{Connection, Row};

use crate::{
    Error,
    database_id::RuleId,
    rule::{
        matcher::compile_pattern,
        models::{CategoryRule, NewCategoryRule},
    },
};

/// Create a category rule in the database.
///
/// The pattern and category are trimmed before they are stored.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyRulePattern] or [Error::EmptyRuleCategory] if either is blank,
/// - [Error::InvalidPattern] if the pattern is not a valid regular expression,
/// - or [Error::SqlError] if there is an SQL error.
pub fn create_category_rule(
    new_rule: NewCategoryRule,
    connection: &Connection,
) -> Result<CategoryRule, Error> {
    let pattern = new_rule.pattern.trim();
    let category = new_rule.category.trim();

    if pattern.is_empty() {
        return Err(Error::EmptyRulePattern);
    }

    if category.is_empty() {
        return Err(Error::EmptyRuleCategory);
    }

    compile_pattern(pattern)?;

    connection
        .prepare(
            "INSERT INTO category_rules (pattern, category, priority, active, notes)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, pattern, category, priority, active, notes",
        )?
        .query_row(
            (
                pattern,
                category,
                new_rule.priority,
                new_rule.active,
                new_rule.notes,
            ),
            map_rule_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a category rule in the database by `rule_id`.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_category_rule(rule_id: RuleId, connection: &Connection) -> Result<CategoryRule, Error> {
    connection
        .prepare(
            "SELECT id, pattern, category, priority, active, notes
             FROM category_rules WHERE id = :id;",
        )?
        .query_row(&[(":id", &rule_id)], map_rule_row)
        .map_err(|error| error.into())
}

/// Retrieve the active rules in the order they are evaluated: highest
/// priority first, then oldest first.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_active_category_rules(connection: &Connection) -> Result<Vec<CategoryRule>, Error> {
    connection
        .prepare(
            "SELECT id, pattern, category, priority, active, notes
             FROM category_rules
             WHERE active = 1
             ORDER BY priority DESC, id ASC;",
        )?
        .query_map([], map_rule_row)?
        .map(|maybe_rule| maybe_rule.map_err(|error| error.into()))
        .collect()
}

/// Retrieve all rules, including inactive ones, in evaluation order.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_all_category_rules(connection: &Connection) -> Result<Vec<CategoryRule>, Error> {
    connection
        .prepare(
            "SELECT id, pattern, category, priority, active, notes
             FROM category_rules
             ORDER BY priority DESC, id ASC;",
        )?
        .query_map([], map_rule_row)?
        .map(|maybe_rule| maybe_rule.map_err(|error| error.into()))
        .collect()
}

/// Delete a category rule from the database.
///
/// # Errors
/// This function will return an error if there is an SQL error or if the rule doesn't exist.
pub fn delete_category_rule(rule_id: RuleId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM category_rules WHERE id = ?1", [rule_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRule);
    }

    Ok(())
}

pub fn create_category_rule_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category_rules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pattern TEXT NOT NULL,
                category TEXT NOT NULL,
                priority INTEGER NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 1,
                notes TEXT
            );",
        (),
    )?;

    // Matches the ordering used by classification
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_category_rules_active_priority
            ON category_rules(active, priority DESC)",
        (),
    )?;

    Ok(())
}

fn map_rule_row(row: &Row) -> Result<CategoryRule, rusqlite::Error> {
    Ok(CategoryRule {
        id: row.get(0)?,
        pattern: row.get(1)?,
        category: row.get(2)?,
        priority: row.get(3)?,
        active: row.get(4)?,
        notes: row.get(5)?,
    })
}
