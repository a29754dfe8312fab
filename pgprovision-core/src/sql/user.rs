//! Login user creation statements.

use super::{quote_ident, section_header};
use crate::{Result, error::ProvisionError};
use rand::Rng;
use zeroize::Zeroizing;

/// Length of generated passwords when `--password-length` is not given
pub const DEFAULT_PASSWORD_LENGTH: usize = 24;

/// Shortest password `generate_password` will produce
pub const MIN_PASSWORD_LENGTH: usize = 16;

/// Longest password `generate_password` will produce
pub const MAX_PASSWORD_LENGTH: usize = 128;

const PASSWORD_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Arguments for `setup-user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSetup {
    /// Login role to create
    pub user: String,
    /// Group roles granted to the user, in order
    pub grant_roles: Vec<String>,
}

/// Generates an alphanumeric password from the thread RNG.
///
/// Lengths below [`MIN_PASSWORD_LENGTH`] are raised to it. Only letters and
/// digits are used so the value can sit inside a single-quoted SQL literal.
///
/// # Errors
/// Returns a configuration error if `length` exceeds [`MAX_PASSWORD_LENGTH`]
pub fn generate_password(length: usize) -> Result<Zeroizing<String>> {
    if length > MAX_PASSWORD_LENGTH {
        return Err(ProvisionError::configuration(format!(
            "Password length must be at most {}, got {}",
            MAX_PASSWORD_LENGTH, length
        )));
    }

    let length = if length < MIN_PASSWORD_LENGTH {
        tracing::warn!(
            "Password length {} is below the minimum, using {}",
            length,
            MIN_PASSWORD_LENGTH
        );
        MIN_PASSWORD_LENGTH
    } else {
        length
    };

    let mut rng = rand::rng();
    let password: String = (0..length)
        .map(|_| {
            let idx = rng.random_range(0..PASSWORD_CHARSET.len());
            char::from(PASSWORD_CHARSET[idx])
        })
        .collect();

    Ok(Zeroizing::new(password))
}

/// Builds the statements that create a login user and grant it its roles.
///
/// The password is embedded as a SQL literal, so the statements are returned
/// in a `Zeroizing` container and wiped on drop. It is never logged.
pub fn setup_user(args: &UserSetup, password: &str) -> Zeroizing<Vec<String>> {
    let user = quote_ident(&args.user);
    let mut sql = vec![section_header("Setup user")];

    sql.push(format!(
        "CREATE USER {} WITH NOSUPERUSER NOCREATEDB NOCREATEROLE NOREPLICATION INHERIT LOGIN PASSWORD '{}';",
        user, password
    ));

    for role in &args.grant_roles {
        sql.push(format!("GRANT {} TO {};", quote_ident(role), user));
    }

    tracing::debug!(
        "Built user '{}' with {} granted roles",
        args.user,
        args.grant_roles.len()
    );

    Zeroizing::new(sql)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_user_statements() {
        let args = UserSetup {
            user: "alice".to_string(),
            grant_roles: vec!["labs_ro".to_string(), "labs_rw".to_string()],
        };

        let sql = setup_user(&args, "s3cretS3cretS3cret");
        assert_eq!(
            *sql,
            vec![
                "-- ======= Setup user =======",
                r#"CREATE USER "alice" WITH NOSUPERUSER NOCREATEDB NOCREATEROLE NOREPLICATION INHERIT LOGIN PASSWORD 's3cretS3cretS3cret';"#,
                r#"GRANT "labs_ro" TO "alice";"#,
                r#"GRANT "labs_rw" TO "alice";"#,
            ]
        );
    }

    #[test]
    fn test_setup_user_statements_are_zeroizing() {
        let args = UserSetup {
            user: "alice".to_string(),
            grant_roles: Vec::new(),
        };

        let sql: Zeroizing<Vec<String>> = setup_user(&args, "s3cretS3cretS3cret");
        assert!(sql[1].contains("'s3cretS3cretS3cret'"));
    }

    #[test]
    fn test_setup_user_without_roles() {
        let args = UserSetup {
            user: "bob".to_string(),
            grant_roles: Vec::new(),
        };

        let sql = setup_user(&args, "x");
        assert_eq!(sql.len(), 2);
        assert!(sql[1].starts_with(r#"CREATE USER "bob""#));
    }

    #[test]
    fn test_generated_password_is_alphanumeric() {
        let password = generate_password(DEFAULT_PASSWORD_LENGTH).unwrap();

        assert_eq!(password.len(), DEFAULT_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generated_password_respects_minimum() {
        assert_eq!(generate_password(4).unwrap().len(), MIN_PASSWORD_LENGTH);
        assert_eq!(generate_password(0).unwrap().len(), MIN_PASSWORD_LENGTH);
        assert_eq!(generate_password(40).unwrap().len(), 40);
        assert_eq!(
            generate_password(MAX_PASSWORD_LENGTH).unwrap().len(),
            MAX_PASSWORD_LENGTH
        );
    }

    #[test]
    fn test_generated_password_rejects_oversized_length() {
        for length in [MAX_PASSWORD_LENGTH + 1, usize::MAX] {
            let err = generate_password(length).unwrap_err();
            assert!(matches!(err, ProvisionError::Configuration { .. }));
            assert!(err.to_string().contains("at most 128"), "{}", err);
        }
    }

    #[test]
    fn test_generated_passwords_differ() {
        let first = generate_password(32).unwrap();
        let second = generate_password(32).unwrap();
        assert_ne!(*first, *second);
    }
}
