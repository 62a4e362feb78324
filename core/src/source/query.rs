//! The users/accounts delta query.
//!
//! The source engine has no FULL OUTER JOIN, so the delta is the UNION of a
//! LEFT JOIN filtered on new users and a RIGHT JOIN filtered on new
//! accounts. UNION (not UNION ALL) drops the copy of a row that qualifies
//! through both arms.

use crate::errors::ConfigError;

pub const USERS_CREATED: &str = "users_created";
pub const ACCOUNTS_CREATED: &str = "accounts_created";

/// Number of `?` placeholders in [`DeltaQuery::sql`]; both take the watermark.
pub const PLACEHOLDER_COUNT: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaQuery {
    users_table: String,
    accounts_table: String,
}

impl DeltaQuery {
    /// Table names are spliced into the SQL text, so they must be plain
    /// (optionally schema-qualified) identifiers.
    pub fn new(users_table: &str, accounts_table: &str) -> Result<Self, ConfigError> {
        validate_identifier("table_users", users_table)?;
        validate_identifier("table_accounts", accounts_table)?;
        Ok(Self {
            users_table: users_table.to_string(),
            accounts_table: accounts_table.to_string(),
        })
    }

    pub fn users_table(&self) -> &str {
        &self.users_table
    }

    pub fn accounts_table(&self) -> &str {
        &self.accounts_table
    }

    pub fn sql(&self) -> String {
        let users = &self.users_table;
        let accounts = &self.accounts_table;
        let select = format!(
            "SELECT {users}.*, {accounts}.*, \
             {users}.created AS {USERS_CREATED}, {accounts}.created AS {ACCOUNTS_CREATED} "
        );

        format!(
            "{select}\
             FROM {users} LEFT JOIN {accounts} ON {users}.id = {accounts}.id \
             WHERE {users}.created > ? \
             UNION \
             {select}\
             FROM {users} RIGHT JOIN {accounts} ON {users}.id = {accounts}.id \
             WHERE {accounts}.created > ? \
             ORDER BY {ACCOUNTS_CREATED}"
        )
    }
}

/// Accepts `name` or `schema.name` where each part is `[A-Za-z_][A-Za-z0-9_$]*`.
pub fn validate_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        message: format!("{field} {value:?} {reason}"),
    };

    if value.is_empty() {
        return Err(invalid("is empty"));
    }

    let parts: Vec<&str> = value.split('.').collect();
    if parts.len() > 2 {
        return Err(invalid("has more than one qualifier"));
    }

    for part in parts {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return Err(invalid("is not a valid SQL identifier")),
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
            return Err(invalid("is not a valid SQL identifier"));
        }
    }

    Ok(())
}
