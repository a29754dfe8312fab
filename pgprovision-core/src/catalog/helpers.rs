//! Row decoding helpers shared by the catalog queries.

use crate::{Result, error::ProvisionError};
use sqlx::{Row, postgres::PgRow, postgres::types::Oid};

/// Extension trait for extracting typed values from catalog rows
/// with consistent error handling.
///
/// # Example
/// ```rust,ignore
/// use pgprovision_core::catalog::helpers::RowExt;
///
/// let name: String = row.get_field("role_name", Some("pg_roles"))?;
/// let oid: u32 = row.get_oid("oid", Some("pg_roles"))?;
/// ```
pub trait RowExt {
    /// Extracts a typed field from the row with proper error context.
    ///
    /// # Arguments
    /// * `field_name` - Name of the column to extract
    /// * `catalog` - Optional catalog relation for error messages
    fn get_field<'r, T>(&'r self, field_name: &str, catalog: Option<&str>) -> Result<T>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>;

    /// Extracts an `oid` column as a plain `u32`.
    fn get_oid(&self, field_name: &str, catalog: Option<&str>) -> Result<u32> {
        self.get_field::<Oid>(field_name, catalog).map(|oid| oid.0)
    }
}

impl RowExt for PgRow {
    fn get_field<'r, T>(&'r self, field_name: &str, catalog: Option<&str>) -> Result<T>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        self.try_get(field_name)
            .map_err(|e| ProvisionError::parse_field(field_name, catalog, e))
    }
}
