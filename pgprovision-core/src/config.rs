//! Connection configuration read from the libpq environment.
//!
//! The tool exposes no connection flags: host, port, user, database and
//! password come from `PGHOST`, `PGPORT`, `PGUSER`, `PGDATABASE` and
//! `PGPASSWORD`, the same variables `psql` honours.

use crate::{Result, error::ProvisionError};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use zeroize::Zeroizing;

/// Host used when `PGHOST` is unset
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port used when `PGPORT` is unset
pub const DEFAULT_PORT: u16 = 5432;

/// Configuration for the single catalog connection.
///
/// # Security
/// The password is held in a `Zeroizing` container and is left out of both
/// `Debug` and `Display`.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Database host address or socket directory
    pub host: String,
    /// Port number
    pub port: u16,
    /// Optional login role; the server default applies when absent
    pub username: Option<String>,
    /// Optional database name; defaults to the login role's name server-side
    pub database: Option<String>,
    password: Zeroizing<Option<String>>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            username: None,
            database: None,
            password: Zeroizing::new(None),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("database", &self.database)
            .field("has_password", &self.has_password())
            .finish()
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}{}",
            self.host,
            self.port,
            self.database
                .as_ref()
                .map_or_else(String::new, |db| format!("/{}", db))
        )
        // Username and password are never displayed
    }
}

impl ConnectionConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// Returns a configuration error if `PGPORT` is not a valid port number
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    /// Returns a configuration error if `PGPORT` is not a valid port number
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = Self::default();

        if let Some(host) = get("PGHOST") {
            config.host = host;
        }

        if let Some(port) = get("PGPORT") {
            config.port = match port.trim().parse::<u16>() {
                Ok(0) | Err(_) => {
                    return Err(ProvisionError::configuration(format!(
                        "PGPORT must be a port number between 1 and 65535, got '{}'",
                        port
                    )));
                }
                Ok(port) => port,
            };
        }

        config.username = get("PGUSER");
        config.database = get("PGDATABASE");
        config.password = Zeroizing::new(get("PGPASSWORD"));

        Ok(config)
    }

    /// Sets the password, replacing any value read from the environment.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Zeroizing::new(Some(password.into()));
        self
    }

    /// Checks if a password is present without exposing it.
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Converts the configuration into sqlx connect options.
    ///
    /// TLS is disabled, matching a local administrative connection.
    pub fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .ssl_mode(PgSslMode::Disable)
            .application_name(&format!("pgprovision-{}", env!("CARGO_PKG_VERSION")));

        if let Some(username) = &self.username {
            options = options.username(username);
        }
        if let Some(database) = &self.database {
            options = options.database(database);
        }
        if let Some(password) = self.password.as_deref() {
            options = options.password(password);
        }

        options
    }
}
