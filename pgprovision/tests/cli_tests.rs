//! CLI parsing and dispatch tests.
//!
//! These drive the same entry points as the binary, with output captured in
//! memory. Nothing here needs a database.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use pgprovision::{Action, Cli, Invocation, execute, parse_invocation, resolve_action};
use pgprovision_core::{
    ProvisionError,
    sql::{DEFAULT_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH},
};

fn parse(args: &[&str]) -> Option<Cli> {
    let argv = std::iter::once("pgprovision").chain(args.iter().copied());
    match parse_invocation(argv).expect("help or version requested") {
        Invocation::Run(cli) => Some(cli),
        Invocation::Usage => None,
    }
}

fn action(args: &[&str]) -> Option<Action> {
    parse(args).and_then(|cli| resolve_action(cli.command.as_ref()))
}

async fn run(args: &[&str]) -> String {
    let action = action(args).expect("arguments should resolve to an action");
    let mut out = Vec::new();
    execute(action, &mut out).await.expect("execute failed");
    String::from_utf8(out).unwrap()
}

#[test]
fn test_cli_no_command_is_usage() {
    let cli = parse(&[]).unwrap();
    assert!(cli.command.is_none());
    assert_eq!(resolve_action(cli.command.as_ref()), None);
}

#[test]
fn test_cli_unknown_command_is_usage() {
    assert_eq!(action(&["drop-everything"]), None);
    assert_eq!(action(&["setupdb", "--db=labs", "--schemas=dev"]), None);
}

#[test]
fn test_cli_unknown_flag_is_usage() {
    assert!(parse(&["setup-db", "--db=labs", "--schemas=dev", "--bogus"]).is_none());
}

#[test]
fn test_cli_missing_required_flags_is_usage() {
    let cases: &[&[&str]] = &[
        &["setup-db", "--db=labs"],
        &["setup-db", "--schemas=dev"],
        &["setup-db", "--db=", "--schemas=dev"],
        &[
            "setup-roles",
            "--db=labs",
            "--schemas=dev",
            "--readonly=ro",
            "--readwrite=rw",
        ],
        &["setup-user", "--user=alice"],
        &["setup-user", "--grantRoles=labs_ro"],
    ];

    for args in cases {
        assert_eq!(action(args), None, "{:?} should fall back to usage", args);
    }
}

#[test]
fn test_cli_help_is_passed_to_clap() {
    let err = parse_invocation(["pgprovision", "--help"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
}

#[test]
fn test_cli_global_flags() {
    let cli = parse(&["-vv", "get-privileges"]).unwrap();
    assert_eq!(cli.global.verbose, 2);
    assert!(!cli.global.quiet);

    let cli = parse(&["setup-db", "-q", "--db=labs", "--schemas=dev"]).unwrap();
    assert!(cli.global.quiet);
}

#[test]
fn test_dispatch_setup_user_defaults() {
    match action(&["setup-user", "--user=alice", "--grantRoles=labs_ro,labs_rw"]) {
        Some(Action::SetupUser {
            setup,
            password_length,
        }) => {
            assert_eq!(setup.user, "alice");
            assert_eq!(setup.grant_roles, vec!["labs_ro", "labs_rw"]);
            assert_eq!(password_length, DEFAULT_PASSWORD_LENGTH);
        }
        other => panic!("unexpected action: {:?}", other),
    }
}

#[test]
fn test_dispatch_grant_roles_kebab_alias() {
    assert!(matches!(
        action(&["setup-user", "--user=bob", "--grant-roles=labs_ro"]),
        Some(Action::SetupUser { .. })
    ));
}

#[test]
fn test_dispatch_get_privileges_exclusions() {
    match action(&[
        "get-privileges",
        "--exclude-schemas=public,audit",
        "--exclude-roles=legacy",
    ]) {
        Some(Action::GetPrivileges(filters)) => {
            assert!(filters.system_schemas.contains(&"pg_catalog".to_string()));
            assert!(filters.system_schemas.contains(&"public".to_string()));
            assert!(filters.system_schemas.contains(&"audit".to_string()));
            assert!(filters.system_roles.contains(&"legacy".to_string()));
        }
        other => panic!("unexpected action: {:?}", other),
    }
}

#[tokio::test]
async fn test_dispatch_setup_db_output() {
    let output = run(&["setup-db", "--db=labs", "--schemas=dev,account"]).await;
    let lines: Vec<_> = output.lines().collect();

    assert_eq!(
        lines,
        vec![
            "-- ======= Setup db and schemas =======",
            r#"CREATE DATABASE "labs";"#,
            r#"CREATE SCHEMA IF NOT EXISTS "dev";"#,
            r#"CREATE SCHEMA IF NOT EXISTS "account";"#,
            r#"REVOKE ALL ON SCHEMA "public" FROM PUBLIC;"#,
            r#"REVOKE ALL ON DATABASE "labs" FROM PUBLIC;"#,
        ]
    );
}

#[tokio::test]
async fn test_dispatch_setup_db_drop_default() {
    let output = run(&[
        "setup-db",
        "--db=labs",
        "--schemas=dev",
        "--drop-default-db",
    ])
    .await;

    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines[1], r#"CREATE DATABASE "labs";"#);
    assert_eq!(lines[2], r#"DROP DATABASE "postgres";"#);
}

#[tokio::test]
async fn test_dispatch_setup_roles_output() {
    let output = run(&[
        "setup-roles",
        "--db=labs",
        "--schemas=dev",
        "--readonly=labs_ro",
        "--readwrite=labs_rw",
        "--admin=labs_admin",
    ])
    .await;

    let ro = output.find("Create role labs_ro").unwrap();
    let rw = output.find("Create role labs_rw").unwrap();
    let admin = output.find("Create role labs_admin").unwrap();
    assert!(ro < rw && rw < admin);

    assert!(output.contains(r#"GRANT SELECT ON ALL TABLES IN SCHEMA "dev" TO "labs_ro";"#));
    assert!(!output.contains(r#"SEQUENCES IN SCHEMA "dev" TO "labs_ro""#));
    assert!(output.contains(r#"GRANT USAGE, SELECT ON ALL SEQUENCES IN SCHEMA "dev" TO "labs_rw";"#));
}

#[tokio::test]
async fn test_dispatch_setup_user_output() {
    let output = run(&["setup-user", "--user=alice", "--grantRoles=labs_ro,labs_rw"]).await;
    let lines: Vec<_> = output.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "-- ======= Setup user =======");
    assert!(lines[1].starts_with(r#"CREATE USER "alice" WITH NOSUPERUSER"#));
    assert_eq!(lines[2], r#"GRANT "labs_ro" TO "alice";"#);
    assert_eq!(lines[3], r#"GRANT "labs_rw" TO "alice";"#);

    let password = lines[1]
        .split("PASSWORD '")
        .nth(1)
        .and_then(|rest| rest.strip_suffix("';"))
        .unwrap();
    assert_eq!(password.len(), DEFAULT_PASSWORD_LENGTH);
    assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[tokio::test]
async fn test_dispatch_short_password_length_is_raised() {
    let output = run(&[
        "setup-user",
        "--user=alice",
        "--grantRoles=labs_ro",
        "--password-length=8",
    ])
    .await;

    let create = output.lines().nth(1).unwrap();
    let password = create
        .split("PASSWORD '")
        .nth(1)
        .and_then(|rest| rest.strip_suffix("';"))
        .unwrap();
    assert_eq!(password.len(), MIN_PASSWORD_LENGTH);
}

#[tokio::test]
async fn test_dispatch_oversized_password_length_is_rejected() {
    for length in ["129", "18446744073709551615"] {
        let flag = format!("--password-length={}", length);
        let action = action(&["setup-user", "--user=alice", "--grantRoles=labs_ro", flag.as_str()])
            .expect("arguments should resolve to an action");

        let mut out = Vec::new();
        let err = execute(action, &mut out).await.unwrap_err();

        assert!(matches!(err, ProvisionError::Configuration { .. }), "{}", err);
        assert!(out.is_empty(), "nothing is printed for length {}", length);
    }
}

#[tokio::test]
async fn test_dispatch_max_password_length_is_accepted() {
    let flag = format!("--password-length={}", MAX_PASSWORD_LENGTH);
    let output = run(&["setup-user", "--user=alice", "--grantRoles=labs_ro", flag.as_str()]).await;

    let create = output.lines().nth(1).unwrap();
    let password = create
        .split("PASSWORD '")
        .nth(1)
        .and_then(|rest| rest.strip_suffix("';"))
        .unwrap();
    assert_eq!(password.len(), MAX_PASSWORD_LENGTH);
}
