//! Database and schema creation statements.

use super::{quote_ident, section_header};

/// Database that PostgreSQL creates at `initdb` time
pub const DEFAULT_DATABASE: &str = "postgres";

/// Arguments for `setup-db`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSetup {
    /// Database to create
    pub db: String,
    /// Schemas to create, in order
    pub schemas: Vec<String>,
    /// Also emit `DROP DATABASE "postgres"` after creating `db`
    pub drop_default_database: bool,
}

impl DatabaseSetup {
    /// Creates the arguments with the default database left in place.
    pub fn new(db: impl Into<String>, schemas: Vec<String>) -> Self {
        Self {
            db: db.into(),
            schemas,
            drop_default_database: false,
        }
    }

    /// Sets whether the default `postgres` database is dropped.
    pub fn with_drop_default_database(mut self, drop: bool) -> Self {
        self.drop_default_database = drop;
        self
    }
}

/// Builds the statements that create the database and its schemas and
/// revoke PUBLIC access.
///
/// # Example
/// ```rust
/// use pgprovision_core::sql::{DatabaseSetup, setup_database};
///
/// let sql = setup_database(&DatabaseSetup::new("labs", vec!["dev".into()]));
/// assert_eq!(sql[1], r#"CREATE DATABASE "labs";"#);
/// ```
pub fn setup_database(args: &DatabaseSetup) -> Vec<String> {
    let db = quote_ident(&args.db);
    let mut sql = vec![section_header("Setup db and schemas")];

    sql.push(format!("CREATE DATABASE {};", db));

    if args.drop_default_database {
        tracing::warn!(
            "Emitting DROP DATABASE for the default '{}' database",
            DEFAULT_DATABASE
        );
        sql.push(format!("DROP DATABASE {};", quote_ident(DEFAULT_DATABASE)));
    }

    for schema in &args.schemas {
        sql.push(format!("CREATE SCHEMA IF NOT EXISTS {};", quote_ident(schema)));
    }

    sql.push(format!(
        "REVOKE ALL ON SCHEMA {} FROM PUBLIC;",
        quote_ident("public")
    ));
    sql.push(format!("REVOKE ALL ON DATABASE {} FROM PUBLIC;", db));

    tracing::debug!(
        "Built {} statements for database '{}'",
        sql.len(),
        args.db
    );
    sql
}
