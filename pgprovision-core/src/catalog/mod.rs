//! Read-only access to the PostgreSQL system catalogs.
//!
//! # Module Structure
//! - `helpers`: typed row extraction with column context on failure
//! - `postgres`: the sqlx-backed client holding the live connection
//!
//! The report builder only sees the [`CatalogSource`] trait, which keeps it
//! testable against in-memory rows.

pub mod helpers;
pub mod postgres;

use crate::{
    Result,
    models::{Database, Membership, Role, Schema, Sequence, Table, View},
};
use async_trait::async_trait;

pub use postgres::PgCatalog;

/// Source of catalog row sets, one method per fixed query.
///
/// Every call is issued and awaited on its own; implementations do not retry
/// and any failure ends the report.
#[async_trait]
pub trait CatalogSource: Send {
    /// Name of the database the connection is attached to.
    async fn current_database(&mut self) -> Result<Database>;

    /// Every namespace, system ones included.
    async fn schemas(&mut self) -> Result<Vec<Schema>>;

    /// Every role with its attribute flags; `members_of` is left empty.
    async fn roles(&mut self) -> Result<Vec<Role>>;

    /// Every role-membership edge.
    async fn memberships(&mut self) -> Result<Vec<Membership>>;

    /// Every table with its schema and owner.
    async fn tables(&mut self) -> Result<Vec<Table>>;

    /// Every view with its schema and owner.
    async fn views(&mut self) -> Result<Vec<View>>;

    /// Every sequence with its schema and owner oids.
    async fn sequences(&mut self) -> Result<Vec<Sequence>>;
}
