//! Privilege report assembly.
//!
//! Reads schemas, roles, memberships and owned objects from a
//! [`CatalogSource`], drops system schemas and roles, joins each role's
//! memberships into it, and keeps only the tables, views and sequences that
//! live in a retained schema.

use crate::catalog::CatalogSource;
use crate::models::{Membership, PrivilegeReport, Role, RoleMembership};
use crate::Result;
use crate::select::{KeySet, SelectMode, select};
use std::collections::HashMap;

/// Schemas PostgreSQL creates for its own use
pub const SYSTEM_SCHEMAS: &[&str] = &[
    "information_schema",
    "pg_catalog",
    "pg_toast",
    "pg_toast_temp_1",
    "pg_temp_1",
];

/// Predefined PostgreSQL roles and the roles Amazon RDS manages
pub const SYSTEM_ROLES: &[&str] = &[
    "pg_signal_backend",
    "pg_read_all_settings",
    "pg_read_all_stats",
    "pg_stat_scan_tables",
    "pg_monitor",
    "pg_read_server_files",
    "pg_write_server_files",
    "pg_execute_server_program",
    "rds_iam",
    "rds_replication",
    "rds_superuser",
    "rdsadmin",
    "rdsrepladmin",
];

/// Deny-lists applied to schemas and roles before the report is joined.
///
/// # Example
/// ```rust
/// use pgprovision_core::privileges::ReportFilters;
///
/// let filters = ReportFilters::default().with_extra_schemas(["public"]);
/// assert!(filters.system_schemas.contains(&"public".to_string()));
/// assert!(filters.system_schemas.contains(&"pg_catalog".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFilters {
    /// Schema names left out of the report
    pub system_schemas: Vec<String>,
    /// Role names left out of the report
    pub system_roles: Vec<String>,
}

impl Default for ReportFilters {
    fn default() -> Self {
        Self {
            system_schemas: SYSTEM_SCHEMAS.iter().map(ToString::to_string).collect(),
            system_roles: SYSTEM_ROLES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl ReportFilters {
    /// Creates filters with explicit deny-lists and no built-in names.
    pub fn new<S, R>(system_schemas: S, system_roles: R) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            system_schemas: system_schemas.into_iter().map(Into::into).collect(),
            system_roles: system_roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds schema names to the deny-list.
    pub fn with_extra_schemas<I>(mut self, schemas: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.system_schemas
            .extend(schemas.into_iter().map(Into::into));
        self
    }

    /// Adds role names to the deny-list.
    pub fn with_extra_roles<I>(mut self, roles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.system_roles.extend(roles.into_iter().map(Into::into));
        self
    }
}

/// Role oid to role name mapping, built once per report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleDirectory {
    names: HashMap<u32, String>,
}

impl RoleDirectory {
    /// Indexes the given roles by oid.
    pub fn from_roles(roles: &[Role]) -> Self {
        Self {
            names: roles
                .iter()
                .map(|role| (role.oid, role.role_name.clone()))
                .collect(),
        }
    }

    /// Name of the role with `oid`, or `None` if it is not in the directory.
    pub fn lookup(&self, oid: u32) -> Option<&str> {
        self.names.get(&oid).map(String::as_str)
    }

    /// Number of indexed roles.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Memberships held by the role with oid `member_oid`, names resolved
/// through `directory`.
pub fn members_of(
    member_oid: u32,
    memberships: &[Membership],
    directory: &RoleDirectory,
) -> Vec<RoleMembership> {
    memberships
        .iter()
        .filter(|edge| edge.member_oid == member_oid)
        .map(|edge| RoleMembership {
            admin_option: edge.admin_option,
            grantor: directory.lookup(edge.grantor_oid).map(ToString::to_string),
            granted: directory.lookup(edge.role_oid).map(ToString::to_string),
        })
        .collect()
}

/// Builds the privilege report from `catalog`.
///
/// Queries run one after another; the first failure aborts the report and
/// nothing partial is returned.
///
/// # Errors
/// Returns the catalog's query error unchanged
pub async fn build_privilege_report<C>(
    catalog: &mut C,
    filters: &ReportFilters,
) -> Result<PrivilegeReport>
where
    C: CatalogSource + ?Sized,
{
    let start_time = std::time::Instant::now();

    let db = catalog.current_database().await?;
    tracing::info!("Building privilege report for database '{}'", db.db_name);

    let all_schemas = catalog.schemas().await?;
    let schema_deny = KeySet::from_values(filters.system_schemas.iter().map(String::as_str));
    let schemas = select(
        &all_schemas,
        |s| s.schema_name.as_str(),
        SelectMode::Filter,
        &schema_deny,
    );
    tracing::debug!(
        "Retained {} of {} schemas",
        schemas.len(),
        all_schemas.len()
    );

    let all_roles = catalog.roles().await?;
    let role_deny = KeySet::from_values(filters.system_roles.iter().map(String::as_str));
    let mut roles = select(
        &all_roles,
        |r| r.role_name.as_str(),
        SelectMode::Filter,
        &role_deny,
    );
    tracing::debug!("Retained {} of {} roles", roles.len(), all_roles.len());

    let memberships = catalog.memberships().await?;
    tracing::debug!("Read {} membership edges", memberships.len());

    // Built from retained roles only: grants by or of system roles resolve to None
    let directory = RoleDirectory::from_roles(&roles);
    for role in &mut roles {
        role.members_of = members_of(role.oid, &memberships, &directory);
    }

    let (tables, views) = {
        let schema_names = KeySet::from_records(&schemas, |s| s.schema_name.as_str());

        let all_tables = catalog.tables().await?;
        let tables = select(
            &all_tables,
            |t| t.schema_name.as_str(),
            SelectMode::Include,
            &schema_names,
        );

        let all_views = catalog.views().await?;
        let views = select(
            &all_views,
            |v| v.schema_name.as_str(),
            SelectMode::Include,
            &schema_names,
        );

        (tables, views)
    };

    let schema_oids = KeySet::from_records(&schemas, |s| s.schema_oid);
    let all_sequences = catalog.sequences().await?;
    let sequences = select(
        &all_sequences,
        |s| s.schema_oid,
        SelectMode::Include,
        &schema_oids,
    );

    tracing::info!(
        "Privilege report completed in {:.2}s - {} schemas, {} roles, {} tables, {} views, {} sequences",
        start_time.elapsed().as_secs_f64(),
        schemas.len(),
        roles.len(),
        tables.len(),
        views.len(),
        sequences.len()
    );

    Ok(PrivilegeReport {
        db,
        schemas,
        roles,
        tables,
        views,
        sequences,
    })
}
