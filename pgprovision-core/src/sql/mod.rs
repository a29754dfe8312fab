//! SQL statement builders for provisioning.
//!
//! Builders are pure: they take owned arguments and return the ordered list of
//! statements, starting with a `-- =======` header comment. Nothing here talks
//! to a database.
//!
//! Identifiers are wrapped in double quotes and otherwise passed through
//! as given. A name containing `"` produces broken SQL.

pub mod database;
pub mod roles;
pub mod user;

pub use database::{DEFAULT_DATABASE, DatabaseSetup, setup_database};
pub use roles::{RoleClass, RoleSetup, create_role, setup_roles};
pub use user::{
    DEFAULT_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, UserSetup, generate_password,
    setup_user,
};

/// Wraps an identifier in double quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Header comment opening a block of statements.
pub fn section_header(title: &str) -> String {
    format!("-- ======= {} =======", title)
}

/// Splits a comma-separated flag value into its non-empty items.
///
/// # Example
/// ```rust
/// use pgprovision_core::sql::split_list;
///
/// assert_eq!(split_list("dev,account"), vec!["dev", "account"]);
/// ```
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}
