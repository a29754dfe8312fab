//! Core library for pgprovision.
//!
//! Provides the SQL builders behind `setup-db`, `setup-roles` and
//! `setup-user`, and the catalog access and cross-referencing behind
//! `get-privileges`.
//!
//! # Security Guarantees
//! - Connection credentials never appear in `Debug`, `Display` or logs
//! - Catalog access is read-only; provisioning SQL is printed, never executed
//!
//! # Architecture
//! - [`catalog::CatalogSource`] abstracts the catalog queries so the report
//!   can be built against PostgreSQL or an in-memory source
//! - [`select`] and [`privileges`] hold the pure filtering and joining logic
//! - [`sql`] holds pure statement builders

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod privileges;
pub mod select;
pub mod sql;

// Re-export commonly used types
pub use catalog::{CatalogSource, PgCatalog};
pub use config::ConnectionConfig;
pub use error::{ProvisionError, Result};
pub use logging::init_logging;
pub use models::{
    Database, Membership, PrivilegeReport, Role, RoleMembership, Schema, Sequence, Table, View,
};
pub use privileges::{ReportFilters, RoleDirectory, build_privilege_report};
