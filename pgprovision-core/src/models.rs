//! Catalog records and the privilege report.
//!
//! Every record lives for a single invocation. Field names follow the column
//! aliases used by the catalog queries so the rendered JSON reads like the
//! query output.

use serde::Serialize;

/// The database the connection is attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Database {
    /// Result of `current_database()`
    pub db_name: String,
}

/// Row from `pg_catalog.pg_namespace`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    /// Namespace oid
    pub schema_oid: u32,
    /// Namespace name
    pub schema_name: String,
    /// Oid of the owning role
    pub owner: u32,
}

/// Row from `pg_catalog.pg_roles`, enriched with its memberships
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    /// Role oid
    pub oid: u32,
    /// Role name
    pub role_name: String,
    /// `rolsuper`
    pub superuser: bool,
    /// Whether privileges of granted roles are inherited
    pub inherit: bool,
    /// `rolcreaterole`
    pub create_role: bool,
    /// `rolcreatedb`
    pub create_db: bool,
    /// Whether the role is a login user
    pub can_login: bool,
    /// `rolreplication`
    pub replication: bool,
    /// `-1` means no limit
    pub conn_limit: i32,
    /// `rolbypassrls`
    pub bypass_rls: bool,
    /// Roles this role has been granted; empty until the report joins them in
    pub members_of: Vec<RoleMembership>,
}

/// One granted role as seen from the member's side.
///
/// `grantor` and `granted` are `None` when the oid belongs to a role that was
/// dropped from the report (a system role, for instance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleMembership {
    /// Whether the member may grant the role onwards
    pub admin_option: bool,
    /// Name of the role that made the grant
    pub grantor: Option<String>,
    /// Name of the granted role
    pub granted: Option<String>,
}

/// Row from `pg_catalog.pg_auth_members`: `member_oid` is a member of `role_oid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Membership {
    /// Granted role
    pub role_oid: u32,
    /// Role receiving the grant
    pub member_oid: u32,
    /// Role that made the grant
    pub grantor_oid: u32,
    /// `WITH ADMIN OPTION`
    pub admin_option: bool,
}

/// Row from `pg_catalog.pg_tables`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Containing schema
    pub schema_name: String,
    /// Table name
    pub table_name: String,
    /// Owning role name
    pub owner: String,
}

/// Row from `pg_catalog.pg_views`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    /// Containing schema
    pub schema_name: String,
    /// View name
    pub view_name: String,
    /// Owning role name
    pub owner: String,
}

/// Row from `pg_catalog.pg_class` with `relkind = 'S'`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sequence {
    /// Relation oid
    pub sequence_oid: u32,
    /// Sequence name
    pub sequence_name: String,
    /// Oid of the containing schema
    pub schema_oid: u32,
    /// Oid of the owning role
    pub owner_oid: u32,
}

/// Cross-referenced view of schemas, roles and owned objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivilegeReport {
    /// Database the report was taken from
    pub db: Database,
    /// Non-system schemas
    pub schemas: Vec<Schema>,
    /// Non-system roles with their memberships
    pub roles: Vec<Role>,
    /// Tables in retained schemas
    pub tables: Vec<Table>,
    /// Views in retained schemas
    pub views: Vec<View>,
    /// Sequences in retained schemas
    pub sequences: Vec<Sequence>,
}

impl PrivilegeReport {
    /// Renders the report as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns a serialization error if encoding fails
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            crate::error::ProvisionError::Serialization {
                context: "privilege report".to_string(),
                source: e,
            }
        })
    }
}
