//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of a manually entered or imported transaction.
pub type TransactionId = DatabaseId;

/// The ID of a stored category rule.
pub type RuleId = DatabaseId;

/// The ID of a financial institution.
pub type InstitutionId = DatabaseId;

/// The ID of a linked Plaid item.
pub type PlaidItemId = DatabaseId;

/// The ID of a linked bank account.
pub type AccountId = DatabaseId;
