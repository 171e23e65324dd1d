use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::crypto::PasswordHash;
use crate::db::{unique_violation, DatabaseError};
use crate::models::*;

const USER_COLUMNS: &str = "id, username, name, role, date_of_birth, surgery_type, surgery_date, created_at";

pub fn insert_user(
    conn: &Connection,
    input: &NewUser,
    password: &PasswordHash,
) -> Result<User, DatabaseError> {
    let user = User {
        id: Uuid::new_v4(),
        username: input.username.trim().to_string(),
        name: input.name.trim().to_string(),
        role: input.role,
        date_of_birth: input.date_of_birth,
        surgery_type: input.surgery_type.clone(),
        surgery_date: input.surgery_date,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO users (id, username, name, role, password_hash, password_salt,
         password_iterations, date_of_birth, surgery_type, surgery_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            user.id.to_string(),
            user.username,
            user.name,
            user.role.as_str(),
            password.hash,
            password.salt,
            password.iterations,
            user.date_of_birth,
            user.surgery_type,
            user.surgery_date,
            user.created_at,
        ],
    )
    .map_err(|e| unique_violation(e, &format!("username '{}'", user.username)))?;

    Ok(user)
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.to_string()],
            user_row,
        )
        .optional()?;
    row.map(UserRow::into_user).transpose()
}

/// Fetch a user and require a specific role. A user with another role
/// reads as not found.
pub fn get_user_with_role(
    conn: &Connection,
    id: &Uuid,
    role: Role,
) -> Result<User, DatabaseError> {
    match get_user(conn, id)? {
        Some(user) if user.role == role => Ok(user),
        _ => Err(DatabaseError::not_found(role.as_str(), id)),
    }
}

pub fn get_patient_profile(conn: &Connection, id: &Uuid) -> Result<PatientProfile, DatabaseError> {
    get_user_with_role(conn, id, Role::Patient).map(PatientProfile::from)
}

/// User plus stored password hash, for login.
pub fn find_credentials(
    conn: &Connection,
    username: &str,
) -> Result<Option<(User, PasswordHash)>, DatabaseError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {USER_COLUMNS}, password_hash, password_salt, password_iterations
                 FROM users WHERE username = ?1"
            ),
            params![username.trim()],
            |row| {
                let user = user_row(row)?;
                let hash = PasswordHash {
                    hash: row.get(8)?,
                    salt: row.get(9)?,
                    iterations: row.get(10)?,
                };
                Ok((user, hash))
            },
        )
        .optional()?;

    match row {
        Some((user, hash)) => Ok(Some((user.into_user()?, hash))),
        None => Ok(None),
    }
}

pub fn list_users(conn: &Connection, role: Option<Role>) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE (?1 IS NULL OR role = ?1)
         ORDER BY name COLLATE NOCASE, username"
    ))?;
    let rows = stmt.query_map(params![role.map(|r| r.as_str())], user_row)?;
    rows.map(|row| row.map_err(DatabaseError::from)?.into_user())
        .collect()
}

pub fn update_password(
    conn: &Connection,
    id: &Uuid,
    password: &PasswordHash,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?1, password_salt = ?2, password_iterations = ?3
         WHERE id = ?4",
        params![password.hash, password.salt, password.iterations, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("user", id));
    }
    Ok(())
}

/// Delete a user. Recovery logs, assignments and notes cascade.
pub fn delete_user(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("user", id));
    }
    Ok(())
}

struct UserRow {
    id: String,
    username: String,
    name: String,
    role: String,
    date_of_birth: Option<NaiveDate>,
    surgery_type: Option<String>,
    surgery_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        name: row.get(2)?,
        role: row.get(3)?,
        date_of_birth: row.get(4)?,
        surgery_type: row.get(5)?,
        surgery_date: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl UserRow {
    fn into_user(self) -> Result<User, DatabaseError> {
        Ok(User {
            id: parse_uuid(&self.id)?,
            username: self.username,
            name: self.name,
            role: Role::from_str(&self.role)?,
            date_of_birth: self.date_of_birth,
            surgery_type: self.surgery_type,
            surgery_date: self.surgery_date,
            created_at: self.created_at,
        })
    }
}

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
