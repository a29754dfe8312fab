//! Error types with credential-safe messages.
//!
//! Connection parameters are carried in [`crate::config::ConnectionConfig`],
//! whose `Display` omits the user and password, so error contexts built from
//! it never leak credentials.

use thiserror::Error;

/// Main error type for pgprovision operations.
///
/// Usage mistakes (a missing flag or an unknown sub-command) are not errors;
/// the dispatcher answers them with the usage banner.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Database connection could not be opened or closed
    #[error("Database connection failed: {context}")]
    Connection {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A catalog query or row decode failed
    #[error("Catalog query failed: {context}")]
    Query {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Serialization of the report failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Writing output failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results with ProvisionError
pub type Result<T> = std::result::Result<T, ProvisionError>;

impl ProvisionError {
    /// Creates a connection error with sanitized context
    pub fn connection_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a query error naming the catalog that was being read
    pub fn query_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Query {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a decode error for a single column of a catalog row.
    ///
    /// # Arguments
    /// * `field_name` - Name of the column being decoded
    /// * `catalog` - Optional catalog relation for better error messages
    /// * `error` - The underlying decode error
    pub fn parse_field<E>(field_name: &str, catalog: Option<&str>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let context = match catalog {
            Some(relation) => format!(
                "Failed to parse field '{}' from '{}' row",
                field_name, relation
            ),
            None => format!("Failed to parse field '{}' from catalog row", field_name),
        };
        Self::Query {
            context,
            source: Box::new(error),
        }
    }

    /// Creates an I/O error for a failed write
    pub fn io_failed(context: impl Into<String>, error: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source: error,
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = ProvisionError::configuration("PGPORT must be a number");
        assert!(error.to_string().contains("PGPORT must be a number"));

        let io = std::io::Error::other("broken pipe");
        let error = ProvisionError::query_failed("pg_roles", io);
        assert_eq!(error.to_string(), "Catalog query failed: pg_roles");
    }

    #[test]
    fn test_parse_field_context() {
        let io = std::io::Error::other("unexpected null");
        let error = ProvisionError::parse_field("role_name", Some("pg_roles"), io);
        assert!(error.to_string().contains("'role_name'"));
        assert!(error.to_string().contains("'pg_roles'"));

        let io = std::io::Error::other("unexpected null");
        let error = ProvisionError::parse_field("db_name", None, io);
        assert!(error.to_string().contains("from catalog row"));
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error as _;

        let io = std::io::Error::other("connection reset");
        let error = ProvisionError::connection_failed("127.0.0.1:5432", io);
        let source = error.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("connection reset"));
    }
}
