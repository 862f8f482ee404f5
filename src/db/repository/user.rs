use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode};
use uuid::Uuid;

use super::uuid_column;
use crate::db::DatabaseError;
use crate::models::{Role, StoredCredentials, User};

/// Insert a user. A taken username surfaces as `ConstraintViolation`.
pub fn insert_user(
    conn: &Connection,
    user: &User,
    password_hash: &str,
    password_salt: &str,
) -> Result<(), DatabaseError> {
    let result = conn.execute(
        "INSERT INTO users (id, username, password_hash, password_salt, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id.to_string(),
            user.username,
            password_hash,
            password_salt,
            user.role.as_str(),
            user.created_at,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            Err(DatabaseError::ConstraintViolation(format!(
                "username '{}' already exists",
                user.username
            )))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn get_credentials_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<StoredCredentials>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, username, role, created_at, password_hash, password_salt
         FROM users WHERE username = ?1",
        params![username],
        |row| {
            Ok((
                uuid_column(row.get(0)?, 0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, DateTime<Utc>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        },
    );

    let (id, username, role, created_at, password_hash, password_salt) = match result {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    Ok(Some(StoredCredentials {
        user: User {
            id,
            username,
            role: Role::from_str(&role)?,
            created_at,
        },
        password_hash,
        password_salt,
    }))
}
