//! PostgreSQL provisioning tool.
//!
//! Prints provisioning SQL for review or piping into `psql`, and reports
//! existing privileges from the system catalogs.
//!
//! # Security Guarantees
//! - Provisioning statements are printed, never executed
//! - Catalog access is read-only
//! - Connection credentials are never logged

use pgprovision::{Invocation, execute, parse_invocation, render_usage, resolve_action};
use pgprovision_core::{Result, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = match parse_invocation(std::env::args_os()) {
        Ok(Invocation::Run(cli)) => cli,
        Ok(Invocation::Usage) => return render_usage(&mut std::io::stdout().lock()),
        Err(e) => e.exit(),
    };

    // Initialize logging
    init_logging(cli.global.verbose, cli.global.quiet)?;

    let mut stdout = std::io::stdout().lock();
    match resolve_action(cli.command.as_ref()) {
        Some(action) => execute(action, &mut stdout).await,
        None => render_usage(&mut stdout),
    }
}
