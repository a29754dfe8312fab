//! PostgreSQL catalog client over a single connection.
//!
//! Queries read `pg_catalog` directly rather than `information_schema` so
//! that rows are returned regardless of the connected role's privileges on
//! the underlying objects.

use super::CatalogSource;
use super::helpers::RowExt;
use crate::config::ConnectionConfig;
use crate::error::ProvisionError;
use crate::{
    Result,
    models::{Database, Membership, Role, Schema, Sequence, Table, View},
};
use async_trait::async_trait;
use sqlx::Connection;
use sqlx::postgres::{PgConnection, PgRow};

const CURRENT_DATABASE_QUERY: &str = "SELECT current_database()::text AS db_name";

const SCHEMAS_QUERY: &str = r#"
    SELECT oid AS schema_oid, nspname::text AS schema_name, nspowner AS owner
    FROM pg_catalog.pg_namespace
"#;

const ROLES_QUERY: &str = r#"
    SELECT oid, rolname::text AS role_name, rolsuper AS superuser,
        rolinherit AS inherit, rolcreaterole AS create_role, rolcreatedb AS create_db,
        rolcanlogin AS can_login, rolreplication AS replication,
        rolconnlimit AS conn_limit, rolbypassrls AS bypass_rls
    FROM pg_catalog.pg_roles
"#;

const MEMBERSHIPS_QUERY: &str = r#"
    SELECT roleid AS role_oid, member AS member_oid,
        grantor AS grantor_oid, admin_option
    FROM pg_catalog.pg_auth_members
"#;

const TABLES_QUERY: &str = r#"
    SELECT schemaname::text AS schema_name, tablename::text AS table_name,
        tableowner::text AS owner
    FROM pg_catalog.pg_tables
"#;

const VIEWS_QUERY: &str = r#"
    SELECT schemaname::text AS schema_name, viewname::text AS view_name,
        viewowner::text AS owner
    FROM pg_catalog.pg_views
"#;

const SEQUENCES_QUERY: &str = r#"
    SELECT oid AS sequence_oid, relname::text AS sequence_name,
        relnamespace AS schema_oid, relowner AS owner_oid
    FROM pg_catalog.pg_class
    WHERE relkind = 'S'
"#;

/// Catalog client that owns the live database connection.
pub struct PgCatalog {
    conn: PgConnection,
}

impl std::fmt::Debug for PgCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgCatalog").finish_non_exhaustive()
    }
}

impl PgCatalog {
    /// Opens the connection described by `config`.
    ///
    /// # Errors
    /// Returns a connection error if the server cannot be reached or
    /// rejects the credentials. The error context names host, port and
    /// database only.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        tracing::debug!("Connecting to {}", config);

        let conn = PgConnection::connect_with(&config.connect_options())
            .await
            .map_err(|e| ProvisionError::connection_failed(config.to_string(), e))?;

        tracing::info!("Connected to {}", config);
        Ok(Self { conn })
    }

    /// Closes the connection gracefully.
    ///
    /// # Errors
    /// Returns a connection error if the terminate handshake fails
    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| ProvisionError::connection_failed("closing connection", e))
    }

    async fn fetch_all(&mut self, query: &str, catalog: &str) -> Result<Vec<PgRow>> {
        let rows = sqlx::query(query)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| {
                tracing::error!("Failed to read {}: {}", catalog, e);
                ProvisionError::query_failed(format!("Failed to read {}", catalog), e)
            })?;

        tracing::debug!("Read {} rows from {}", rows.len(), catalog);
        Ok(rows)
    }
}

#[async_trait]
impl CatalogSource for PgCatalog {
    async fn current_database(&mut self) -> Result<Database> {
        let row = sqlx::query(CURRENT_DATABASE_QUERY)
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| ProvisionError::query_failed("Failed to read current_database()", e))?;

        Ok(Database {
            db_name: row.get_field("db_name", None)?,
        })
    }

    async fn schemas(&mut self) -> Result<Vec<Schema>> {
        const CATALOG: &str = "pg_namespace";
        let rows = self.fetch_all(SCHEMAS_QUERY, CATALOG).await?;

        rows.iter()
            .map(|row| -> Result<Schema> {
                Ok(Schema {
                    schema_oid: row.get_oid("schema_oid", Some(CATALOG))?,
                    schema_name: row.get_field("schema_name", Some(CATALOG))?,
                    owner: row.get_oid("owner", Some(CATALOG))?,
                })
            })
            .collect()
    }

    async fn roles(&mut self) -> Result<Vec<Role>> {
        const CATALOG: &str = "pg_roles";
        let rows = self.fetch_all(ROLES_QUERY, CATALOG).await?;

        rows.iter()
            .map(|row| -> Result<Role> {
                Ok(Role {
                    oid: row.get_oid("oid", Some(CATALOG))?,
                    role_name: row.get_field("role_name", Some(CATALOG))?,
                    superuser: row.get_field("superuser", Some(CATALOG))?,
                    inherit: row.get_field("inherit", Some(CATALOG))?,
                    create_role: row.get_field("create_role", Some(CATALOG))?,
                    create_db: row.get_field("create_db", Some(CATALOG))?,
                    can_login: row.get_field("can_login", Some(CATALOG))?,
                    replication: row.get_field("replication", Some(CATALOG))?,
                    conn_limit: row.get_field("conn_limit", Some(CATALOG))?,
                    bypass_rls: row.get_field("bypass_rls", Some(CATALOG))?,
                    members_of: Vec::new(),
                })
            })
            .collect()
    }

    async fn memberships(&mut self) -> Result<Vec<Membership>> {
        const CATALOG: &str = "pg_auth_members";
        let rows = self.fetch_all(MEMBERSHIPS_QUERY, CATALOG).await?;

        rows.iter()
            .map(|row| -> Result<Membership> {
                Ok(Membership {
                    role_oid: row.get_oid("role_oid", Some(CATALOG))?,
                    member_oid: row.get_oid("member_oid", Some(CATALOG))?,
                    grantor_oid: row.get_oid("grantor_oid", Some(CATALOG))?,
                    admin_option: row.get_field("admin_option", Some(CATALOG))?,
                })
            })
            .collect()
    }

    async fn tables(&mut self) -> Result<Vec<Table>> {
        const CATALOG: &str = "pg_tables";
        let rows = self.fetch_all(TABLES_QUERY, CATALOG).await?;

        rows.iter()
            .map(|row| -> Result<Table> {
                Ok(Table {
                    schema_name: row.get_field("schema_name", Some(CATALOG))?,
                    table_name: row.get_field("table_name", Some(CATALOG))?,
                    owner: row.get_field("owner", Some(CATALOG))?,
                })
            })
            .collect()
    }

    async fn views(&mut self) -> Result<Vec<View>> {
        const CATALOG: &str = "pg_views";
        let rows = self.fetch_all(VIEWS_QUERY, CATALOG).await?;

        rows.iter()
            .map(|row| -> Result<View> {
                Ok(View {
                    schema_name: row.get_field("schema_name", Some(CATALOG))?,
                    view_name: row.get_field("view_name", Some(CATALOG))?,
                    owner: row.get_field("owner", Some(CATALOG))?,
                })
            })
            .collect()
    }

    async fn sequences(&mut self) -> Result<Vec<Sequence>> {
        const CATALOG: &str = "pg_class";
        let rows = self.fetch_all(SEQUENCES_QUERY, CATALOG).await?;

        rows.iter()
            .map(|row| -> Result<Sequence> {
                Ok(Sequence {
                    sequence_oid: row.get_oid("sequence_oid", Some(CATALOG))?,
                    sequence_name: row.get_field("sequence_name", Some(CATALOG))?,
                    schema_oid: row.get_oid("schema_oid", Some(CATALOG))?,
                    owner_oid: row.get_oid("owner_oid", Some(CATALOG))?,
                })
            })
            .collect()
    }
}
