//! Group role creation statements.
//!
//! Three classes of no-login roles are created per database: read-only,
//! read-write and admin. Users receive access by being granted one of them.

use super::{quote_ident, section_header};

/// Privilege level of a group role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleClass {
    /// `SELECT` on tables
    ReadOnly,
    /// Adds `INSERT`, `UPDATE` and sequence usage
    ReadWrite,
    /// Every table privilege except ownership
    Admin,
}

impl RoleClass {
    /// All classes, in the order their blocks are emitted.
    pub const ALL: [Self; 3] = [Self::ReadOnly, Self::ReadWrite, Self::Admin];

    /// Table privileges granted to the class.
    pub const fn table_privileges(self) -> &'static [&'static str] {
        match self {
            Self::ReadOnly => &["SELECT"],
            Self::ReadWrite => &["SELECT", "INSERT", "UPDATE"],
            Self::Admin => &[
                "SELECT",
                "INSERT",
                "UPDATE",
                "REFERENCES",
                "TRIGGER",
                "DELETE",
                "TRUNCATE",
            ],
        }
    }

    /// Whether the class gets `USAGE, SELECT` on sequences.
    pub const fn grants_sequences(self) -> bool {
        !matches!(self, Self::ReadOnly)
    }
}

impl std::fmt::Display for RoleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "readonly"),
            Self::ReadWrite => write!(f, "readwrite"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Arguments for `setup-roles`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSetup {
    /// Database the roles may connect to
    pub db: String,
    /// Schemas the roles are granted access to
    pub schemas: Vec<String>,
    /// Name of the read-only role
    pub readonly: String,
    /// Name of the read-write role
    pub readwrite: String,
    /// Name of the admin role
    pub admin: String,
}

impl RoleSetup {
    /// Name chosen for `class`.
    pub fn role_name(&self, class: RoleClass) -> &str {
        match class {
            RoleClass::ReadOnly => &self.readonly,
            RoleClass::ReadWrite => &self.readwrite,
            RoleClass::Admin => &self.admin,
        }
    }
}

/// Builds the block creating one group role and granting it access to
/// `schemas` in `db`.
pub fn create_role(db: &str, schemas: &[String], role: &str, class: RoleClass) -> Vec<String> {
    let role_ident = quote_ident(role);
    let privileges = class.table_privileges().join(",");

    let mut sql = vec![section_header(&format!("Create role {}", role))];

    sql.push(format!(
        "CREATE ROLE {} WITH NOSUPERUSER NOCREATEDB NOCREATEROLE NOREPLICATION NOINHERIT NOLOGIN;",
        role_ident
    ));
    sql.push(format!(
        "GRANT CONNECT ON DATABASE {} TO {};",
        quote_ident(db),
        role_ident
    ));

    for schema in schemas {
        let schema_ident = quote_ident(schema);

        sql.push(format!(
            "GRANT USAGE ON SCHEMA {} TO {};",
            schema_ident, role_ident
        ));
        sql.push(format!(
            "GRANT {} ON ALL TABLES IN SCHEMA {} TO {};",
            privileges, schema_ident, role_ident
        ));
        // Tables created later
        sql.push(format!(
            "ALTER DEFAULT PRIVILEGES IN SCHEMA {} GRANT {} ON TABLES TO {};",
            schema_ident, privileges, role_ident
        ));

        if class.grants_sequences() {
            sql.push(format!(
                "GRANT USAGE, SELECT ON ALL SEQUENCES IN SCHEMA {} TO {};",
                schema_ident, role_ident
            ));
            sql.push(format!(
                "ALTER DEFAULT PRIVILEGES IN SCHEMA {} GRANT USAGE, SELECT ON SEQUENCES TO {};",
                schema_ident, role_ident
            ));
        }
    }

    sql
}

/// Builds the read-only, read-write and admin role blocks, in that order.
pub fn setup_roles(args: &RoleSetup) -> Vec<String> {
    let mut sql = vec![section_header("Setup roles")];

    for class in RoleClass::ALL {
        let role = args.role_name(class);
        tracing::debug!("Building {} role '{}'", class, role);
        sql.extend(create_role(&args.db, &args.schemas, role, class));
    }

    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labs(schemas: &[&str]) -> RoleSetup {
        RoleSetup {
            db: "labs".to_string(),
            schemas: schemas.iter().map(ToString::to_string).collect(),
            readonly: "labs_ro".to_string(),
            readwrite: "labs_rw".to_string(),
            admin: "labs_admin".to_string(),
        }
    }

    /// Splits the output into per-role blocks keyed by the header comment.
    fn blocks(sql: &[String]) -> Vec<(String, Vec<String>)> {
        let mut out: Vec<(String, Vec<String>)> = Vec::new();
        for statement in sql.iter().skip(1) {
            if statement.starts_with("-- ") {
                out.push((statement.clone(), Vec::new()));
            } else if let Some((_, body)) = out.last_mut() {
                body.push(statement.clone());
            }
        }
        out
    }

    #[test]
    fn test_blocks_emitted_in_class_order() {
        let sql = setup_roles(&labs(&["dev"]));
        assert_eq!(sql[0], "-- ======= Setup roles =======");

        let headers: Vec<_> = blocks(&sql).into_iter().map(|(h, _)| h).collect();
        assert_eq!(
            headers,
            vec![
                "-- ======= Create role labs_ro =======",
                "-- ======= Create role labs_rw =======",
                "-- ======= Create role labs_admin =======",
            ]
        );
    }

    #[test]
    fn test_readonly_block() {
        let sql = create_role("labs", &["dev".to_string()], "labs_ro", RoleClass::ReadOnly);

        assert_eq!(
            sql,
            vec![
                "-- ======= Create role labs_ro =======",
                r#"CREATE ROLE "labs_ro" WITH NOSUPERUSER NOCREATEDB NOCREATEROLE NOREPLICATION NOINHERIT NOLOGIN;"#,
                r#"GRANT CONNECT ON DATABASE "labs" TO "labs_ro";"#,
                r#"GRANT USAGE ON SCHEMA "dev" TO "labs_ro";"#,
                r#"GRANT SELECT ON ALL TABLES IN SCHEMA "dev" TO "labs_ro";"#,
                r#"ALTER DEFAULT PRIVILEGES IN SCHEMA "dev" GRANT SELECT ON TABLES TO "labs_ro";"#,
            ]
        );
    }

    #[test]
    fn test_only_readwrite_and_admin_grant_sequences() {
        let sql = setup_roles(&labs(&["dev"]));

        for (header, body) in blocks(&sql) {
            let has_sequences = body.iter().any(|s| s.contains("SEQUENCES"));
            if header.contains("labs_ro") {
                assert!(!has_sequences, "{}", header);
            } else {
                assert!(has_sequences, "{}", header);
                assert_eq!(
                    body.iter().filter(|s| s.contains("SEQUENCES")).count(),
                    2,
                    "{}",
                    header
                );
            }
        }
    }

    #[test]
    fn test_admin_privileges() {
        let sql = create_role("labs", &["dev".to_string()], "labs_admin", RoleClass::Admin);

        assert!(sql.contains(
            &r#"GRANT SELECT,INSERT,UPDATE,REFERENCES,TRIGGER,DELETE,TRUNCATE ON ALL TABLES IN SCHEMA "dev" TO "labs_admin";"#
                .to_string()
        ));
        assert!(sql.contains(
            &r#"ALTER DEFAULT PRIVILEGES IN SCHEMA "dev" GRANT USAGE, SELECT ON SEQUENCES TO "labs_admin";"#
                .to_string()
        ));
    }

    #[test]
    fn test_grants_repeat_per_schema() {
        let sql = create_role(
            "labs",
            &["dev".to_string(), "account".to_string()],
            "labs_rw",
            RoleClass::ReadWrite,
        );

        // header + create + connect + 5 per schema
        assert_eq!(sql.len(), 13);
        assert_eq!(sql[3], r#"GRANT USAGE ON SCHEMA "dev" TO "labs_rw";"#);
        assert_eq!(sql[8], r#"GRANT USAGE ON SCHEMA "account" TO "labs_rw";"#);
        assert_eq!(
            sql[9],
            r#"GRANT SELECT,INSERT,UPDATE ON ALL TABLES IN SCHEMA "account" TO "labs_rw";"#
        );
    }

    #[test]
    fn test_role_class_privileges() {
        assert_eq!(RoleClass::ReadOnly.table_privileges(), &["SELECT"]);
        assert_eq!(RoleClass::ReadWrite.table_privileges().len(), 3);
        assert_eq!(RoleClass::Admin.table_privileges().len(), 7);
        assert!(!RoleClass::ReadOnly.grants_sequences());
        assert!(RoleClass::ReadWrite.grants_sequences());
        assert!(RoleClass::Admin.grants_sequences());
        assert_eq!(RoleClass::ReadWrite.to_string(), "readwrite");
    }
}
