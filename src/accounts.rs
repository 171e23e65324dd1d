//! Account management: creation with validation, login checks, and the
//! startup admin bootstrap.

use rusqlite::Connection;

use crate::config::AdminCredentials;
use crate::crypto::{CryptoError, PasswordHash};
use crate::db::{self, DatabaseError};
use crate::models::{NewUser, Role, User};

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Credential error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("Invalid account: {0}")]
    Invalid(String),
}

/// Validate and store a new patient or doctor account.
///
/// Admin accounts are never created here; the only admin comes from
/// configuration via [`bootstrap_admin`].
pub fn create_account(
    conn: &Connection,
    input: &NewUser,
    iterations: u32,
) -> Result<User, AccountError> {
    if input.role == Role::Admin {
        return Err(AccountError::Invalid("Admin accounts cannot be created".into()));
    }
    let username = input.username.trim();
    if username.is_empty() || username.chars().any(char::is_whitespace) {
        return Err(AccountError::Invalid(
            "Username must be non-empty and contain no spaces".into(),
        ));
    }
    if input.name.trim().is_empty() {
        return Err(AccountError::Invalid("Name is required".into()));
    }
    if input.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AccountError::Invalid(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if input.role == Role::Doctor
        && (input.date_of_birth.is_some() || input.surgery_type.is_some() || input.surgery_date.is_some())
    {
        return Err(AccountError::Invalid(
            "Surgery and birth details apply to patients only".into(),
        ));
    }

    let hash = PasswordHash::derive(&input.password, iterations);
    let user = db::insert_user(conn, input, &hash)?;
    tracing::info!(user_id = %user.id, role = %user.role, "Account created");
    Ok(user)
}

/// Check a username/password pair. `Ok(None)` for unknown users and wrong
/// passwords alike.
pub fn authenticate(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Result<Option<User>, AccountError> {
    let Some((user, hash)) = db::find_credentials(conn, username)? else {
        return Ok(None);
    };
    if hash.verify(password)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Ensure the configured admin account exists with the configured password.
pub fn bootstrap_admin(
    conn: &Connection,
    admin: &AdminCredentials,
    iterations: u32,
) -> Result<User, AccountError> {
    let hash = PasswordHash::derive(&admin.password, iterations);

    match db::find_credentials(conn, &admin.username)? {
        Some((user, _)) if user.role == Role::Admin => {
            db::update_password(conn, &user.id, &hash)?;
            tracing::info!(username = %user.username, "Admin account refreshed");
            Ok(user)
        }
        Some((user, _)) => Err(AccountError::Invalid(format!(
            "Username '{}' belongs to a {} account",
            user.username, user.role
        ))),
        None => {
            let input = NewUser {
                username: admin.username.clone(),
                password: admin.password.clone(),
                name: "Administrator".into(),
                role: Role::Admin,
                date_of_birth: None,
                surgery_type: None,
                surgery_date: None,
            };
            let user = db::insert_user(conn, &input, &hash)?;
            tracing::info!(username = %user.username, "Admin account created");
            Ok(user)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    const FAST: u32 = 1_000;

    fn patient_input(username: &str, password: &str) -> NewUser {
        NewUser {
            username: username.into(),
            password: password.into(),
            name: "Pat Patient".into(),
            role: Role::Patient,
            date_of_birth: None,
            surgery_type: Some("Appendectomy".into()),
            surgery_date: None,
        }
    }

    fn admin_creds(password: &str) -> AdminCredentials {
        AdminCredentials {
            username: "root".into(),
            password: password.into(),
        }
    }

    #[test]
    fn created_account_can_authenticate() {
        let conn = open_memory_database().unwrap();
        create_account(&conn, &patient_input("pat", "longenough"), FAST).unwrap();
        let user = authenticate(&conn, "pat", "longenough").unwrap().unwrap();
        assert_eq!(user.role, Role::Patient);
        assert!(authenticate(&conn, "pat", "wrong-password").unwrap().is_none());
        assert!(authenticate(&conn, "ghost", "longenough").unwrap().is_none());
    }

    #[test]
    fn short_password_rejected() {
        let conn = open_memory_database().unwrap();
        let err = create_account(&conn, &patient_input("pat", "short"), FAST).unwrap_err();
        assert!(matches!(err, AccountError::Invalid(_)));
    }

    #[test]
    fn admin_role_cannot_be_created_through_api() {
        let conn = open_memory_database().unwrap();
        let mut input = patient_input("sneaky", "longenough");
        input.role = Role::Admin;
        input.surgery_type = None;
        assert!(matches!(
            create_account(&conn, &input, FAST),
            Err(AccountError::Invalid(_))
        ));
    }

    #[test]
    fn doctor_with_surgery_details_rejected() {
        let conn = open_memory_database().unwrap();
        let mut input = patient_input("doc", "longenough");
        input.role = Role::Doctor;
        assert!(create_account(&conn, &input, FAST).is_err());
    }

    #[test]
    fn bootstrap_creates_then_refreshes_admin() {
        let conn = open_memory_database().unwrap();
        let first = bootstrap_admin(&conn, &admin_creds("first-pass"), FAST).unwrap();
        assert_eq!(first.role, Role::Admin);
        assert!(authenticate(&conn, "root", "first-pass").unwrap().is_some());

        let second = bootstrap_admin(&conn, &admin_creds("second-pass"), FAST).unwrap();
        assert_eq!(first.id, second.id);
        assert!(authenticate(&conn, "root", "first-pass").unwrap().is_none());
        assert!(authenticate(&conn, "root", "second-pass").unwrap().is_some());
    }

    #[test]
    fn bootstrap_refuses_to_hijack_patient_username() {
        let conn = open_memory_database().unwrap();
        create_account(&conn, &patient_input("root", "longenough"), FAST).unwrap();
        assert!(bootstrap_admin(&conn, &admin_creds("pw"), FAST).is_err());
    }
}
