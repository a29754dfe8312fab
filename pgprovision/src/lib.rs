//! Command-line surface of pgprovision.
//!
//! Parsing and dispatch live here so the integration tests can drive them
//! without spawning the binary. `main.rs` only wires stdout and logging.

use clap::{Args, Parser, Subcommand, error::ErrorKind};
use pgprovision_core::{
    ConnectionConfig, PgCatalog, PrivilegeReport, ProvisionError, Result,
    privileges::{ReportFilters, build_privilege_report},
    sql::{
        DEFAULT_PASSWORD_LENGTH, DatabaseSetup, RoleSetup, UserSetup, generate_password,
        setup_database, setup_roles, setup_user, split_list,
    },
};
use std::io::Write;
use tracing::{debug, error, info};

/// Banner printed for a missing sub-command, an unknown one, or missing flags
pub const USAGE: &str = "Usage: ./ <command> <args>
  * setup-db --db --schemas
  * setup-roles --db --schemas --readonly --readwrite --admin
  * setup-user --user --grantRoles
  * get-privileges";

/// Top-level arguments
#[derive(Debug, Parser)]
#[command(name = "pgprovision")]
#[command(about = "PostgreSQL database, role and user provisioning tool")]
#[command(version)]
#[command(long_about = "
pgprovision - PostgreSQL provisioning helper

Prints the SQL that sets up a database with its schemas, a read-only,
read-write and admin group role, and login users granted those roles.
The statements are written to stdout for review; nothing is executed.

get-privileges connects using the libpq environment (PGHOST, PGPORT,
PGUSER, PGDATABASE, PGPASSWORD) and prints a JSON report of schemas,
roles, memberships and owned objects.

EXAMPLES:
  pgprovision setup-db --db=labs --schemas=dev,account
  pgprovision setup-roles --db=labs --schemas=dev --readonly=labs_ro --readwrite=labs_rw --admin=labs_admin
  pgprovision setup-user --user=alice --grantRoles=labs_ro,labs_rw | psql
  PGDATABASE=labs pgprovision get-privileges
")]
pub struct Cli {
    /// Verbosity flags shared by every sub-command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Sub-command to run; the banner is printed when absent
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Flags accepted before or after the sub-command
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all logs except errors")]
    pub quiet: bool,
}

/// Sub-commands. Every flag is optional here; missing ones fall back to the
/// usage banner in [`resolve_action`].
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print CREATE DATABASE and CREATE SCHEMA statements
    SetupDb(SetupDbArgs),
    /// Print the read-only, read-write and admin role statements
    SetupRoles(SetupRolesArgs),
    /// Print CREATE USER and GRANT statements with a generated password
    SetupUser(SetupUserArgs),
    /// Print a JSON report of schemas, roles and owned objects
    GetPrivileges(GetPrivilegesArgs),
    /// Anything else
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Flags for `setup-db`
#[derive(Debug, Args)]
pub struct SetupDbArgs {
    /// Database to create
    #[arg(long, help = "Database to create")]
    pub db: Option<String>,

    /// Comma-separated schema names
    #[arg(long, help = "Comma-separated schemas to create")]
    pub schemas: Option<String>,

    /// Emit `DROP DATABASE "postgres"` after creating the database
    #[arg(
        long,
        help = "Also drop the default 'postgres' database (destructive)"
    )]
    pub drop_default_db: bool,
}

/// Flags for `setup-roles`
#[derive(Debug, Args)]
pub struct SetupRolesArgs {
    /// Database the roles are granted `CONNECT` on
    #[arg(long, help = "Database the roles may connect to")]
    pub db: Option<String>,

    /// Comma-separated schema names
    #[arg(long, help = "Comma-separated schemas to grant access to")]
    pub schemas: Option<String>,

    /// Read-only role name
    #[arg(long, help = "Name of the read-only role")]
    pub readonly: Option<String>,

    /// Read-write role name
    #[arg(long, help = "Name of the read-write role")]
    pub readwrite: Option<String>,

    /// Admin role name
    #[arg(long, help = "Name of the admin role")]
    pub admin: Option<String>,
}

/// Flags for `setup-user`
#[derive(Debug, Args)]
pub struct SetupUserArgs {
    /// Login user to create
    #[arg(long, help = "Login user to create")]
    pub user: Option<String>,

    /// Comma-separated roles granted to the user
    #[arg(
        long = "grantRoles",
        visible_alias = "grant-roles",
        help = "Comma-separated roles to grant"
    )]
    pub grant_roles: Option<String>,

    /// Length of the generated password
    #[arg(
        long,
        default_value_t = DEFAULT_PASSWORD_LENGTH,
        help = "Length of the generated password (16 to 128)"
    )]
    pub password_length: usize,
}

/// Flags for `get-privileges`
#[derive(Debug, Args)]
pub struct GetPrivilegesArgs {
    /// Extra schema names to exclude from the report
    #[arg(
        long,
        value_delimiter = ',',
        help = "Comma-separated schemas to leave out in addition to system schemas"
    )]
    pub exclude_schemas: Vec<String>,

    /// Extra role names to exclude from the report
    #[arg(
        long,
        value_delimiter = ',',
        help = "Comma-separated roles to leave out in addition to system roles"
    )]
    pub exclude_roles: Vec<String>,
}

/// Outcome of parsing the command line.
#[derive(Debug)]
pub enum Invocation {
    /// Arguments parsed; the action may still resolve to the banner
    Run(Cli),
    /// Arguments could not be parsed; print the banner
    Usage,
}

/// Parses `args` (program name first).
///
/// Help and version requests come back as `Err` so the caller can let clap
/// print them. Every other parse failure is a usage mistake.
pub fn parse_invocation<I, T>(args: I) -> std::result::Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(Invocation::Run(cli)),
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) =>
        {
            Err(e)
        }
        Err(e) => {
            debug!("Argument parsing failed: {}", e.kind());
            Ok(Invocation::Usage)
        }
    }
}

/// Fully resolved command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print database and schema setup
    SetupDb(DatabaseSetup),
    /// Print the three group role blocks
    SetupRoles(RoleSetup),
    /// Print user setup with a freshly generated password
    SetupUser {
        /// User name and granted roles
        setup: UserSetup,
        /// Requested password length, validated when the password is generated
        password_length: usize,
    },
    /// Connect and print the privilege report
    GetPrivileges(ReportFilters),
}

/// Value of a flag that was given and is not blank.
fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Resolves the parsed command into an [`Action`].
///
/// Returns `None` when the sub-command is missing or unknown, or when one of
/// its required flags is absent or empty.
pub fn resolve_action(command: Option<&Command>) -> Option<Action> {
    match command? {
        Command::SetupDb(args) => {
            let db = present(args.db.as_ref())?;
            let schemas = present(args.schemas.as_ref())?;
            Some(Action::SetupDb(
                DatabaseSetup::new(db, split_list(schemas))
                    .with_drop_default_database(args.drop_default_db),
            ))
        }
        Command::SetupRoles(args) => Some(Action::SetupRoles(RoleSetup {
            db: present(args.db.as_ref())?.to_string(),
            schemas: split_list(present(args.schemas.as_ref())?),
            readonly: present(args.readonly.as_ref())?.to_string(),
            readwrite: present(args.readwrite.as_ref())?.to_string(),
            admin: present(args.admin.as_ref())?.to_string(),
        })),
        Command::SetupUser(args) => Some(Action::SetupUser {
            setup: UserSetup {
                user: present(args.user.as_ref())?.to_string(),
                grant_roles: split_list(present(args.grant_roles.as_ref())?),
            },
            password_length: args.password_length,
        }),
        Command::GetPrivileges(args) => Some(Action::GetPrivileges(
            ReportFilters::default()
                .with_extra_schemas(clean(&args.exclude_schemas))
                .with_extra_roles(clean(&args.exclude_roles)),
        )),
        Command::External(args) => {
            debug!("Unknown sub-command {:?}", args.first());
            None
        }
    }
}

fn clean(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Writes one statement per line.
///
/// # Errors
/// Returns an I/O error if the writer fails
pub fn render_statements<W: Write>(out: &mut W, statements: &[String]) -> Result<()> {
    for statement in statements {
        writeln!(out, "{}", statement)
            .map_err(|e| ProvisionError::io_failed("writing statements", e))?;
    }
    Ok(())
}

/// Writes the usage banner.
///
/// # Errors
/// Returns an I/O error if the writer fails
pub fn render_usage<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "{}", USAGE).map_err(|e| ProvisionError::io_failed("writing usage", e))
}

/// Runs `action`, writing its output to `out`.
///
/// Only [`Action::GetPrivileges`] touches the network; the SQL builders are
/// printed without connecting.
///
/// # Errors
/// Returns connection and query errors from the report, configuration errors
/// from the environment, and I/O errors from `out`
pub async fn execute<W: Write>(action: Action, out: &mut W) -> Result<()> {
    match action {
        Action::SetupDb(args) => {
            info!(
                "Generating setup for database '{}' with {} schemas",
                args.db,
                args.schemas.len()
            );
            render_statements(out, &setup_database(&args))
        }
        Action::SetupRoles(args) => {
            info!("Generating roles for database '{}'", args.db);
            render_statements(out, &setup_roles(&args))
        }
        Action::SetupUser {
            setup,
            password_length,
        } => {
            info!("Generating user '{}'", setup.user);
            let password = generate_password(password_length)?;
            render_statements(out, &setup_user(&setup, &password))
        }
        Action::GetPrivileges(filters) => {
            let config = ConnectionConfig::from_env()?;
            let report = collect_report(&config, &filters).await?;
            let rendered = report.to_json_pretty()?;
            writeln!(out, "{}", rendered)
                .map_err(|e| ProvisionError::io_failed("writing privilege report", e))
        }
    }
}

/// Connects, builds the report and closes the connection.
///
/// The connection is closed whether or not the report succeeded. A report
/// error takes precedence over a close error.
pub async fn collect_report(
    config: &ConnectionConfig,
    filters: &ReportFilters,
) -> Result<PrivilegeReport> {
    let mut catalog = PgCatalog::connect(config).await?;

    let report = build_privilege_report(&mut catalog, filters).await;
    let closed = catalog.close().await;

    match (report, closed) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), closed) => {
            if let Err(close_error) = closed {
                error!("Failed to close connection: {}", close_error);
            }
            Err(e)
        }
    }
}
