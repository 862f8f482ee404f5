//! Patient accounts: registration and password verification.
//!
//! Passwords are stored as PBKDF2-HMAC-SHA256 output with a random per-user
//! salt, both base64 encoded. Comparison is constant time.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use pbkdf2::pbkdf2_hmac;
use rusqlite::Connection;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::db::{self, DatabaseError};
use crate::models::{Role, User};

pub const PBKDF2_ITERATIONS: u32 = if cfg!(test) { 1_000 } else { 100_000 };
pub const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;
const MAX_USERNAME_CHARS: usize = 64;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Stored credentials are corrupt")]
    CorruptCredentials,

    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for AuthError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::ConstraintViolation(msg) => Self::UsernameTaken(msg),
            other => Self::Database(other),
        }
    }
}

fn derive(password: &str, salt: &[u8]) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut out);
    out
}

fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

fn validate_username(username: &str) -> Result<&str, AuthError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(AuthError::InvalidUsername("must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_USERNAME_CHARS {
        return Err(AuthError::InvalidUsername(format!(
            "at most {MAX_USERNAME_CHARS} characters"
        )));
    }
    if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AuthError::InvalidUsername("must not contain whitespace".into()));
    }
    Ok(trimmed)
}

/// Create a patient account.
pub fn register(conn: &Connection, username: &str, password: &str) -> Result<User, AuthError> {
    let username = validate_username(username)?;
    if password.is_empty() {
        return Err(AuthError::EmptyPassword);
    }

    let salt = generate_salt();
    let mut hash = derive(password, &salt);
    let encoded_hash = STANDARD.encode(hash);
    hash.zeroize();

    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        role: Role::Patient,
        created_at: Utc::now(),
    };
    db::insert_user(conn, &user, &encoded_hash, &STANDARD.encode(salt))?;
    tracing::info!(username = %user.username, "User registered");
    Ok(user)
}

/// Check a username/password pair. Unknown users and wrong passwords give
/// the same error.
pub fn verify(conn: &Connection, username: &str, password: &str) -> Result<User, AuthError> {
    let Some(stored) = db::get_credentials_by_username(conn, username.trim())? else {
        // Same work as a real check so response time does not reveal the account.
        let _ = derive(password, &[0u8; SALT_LENGTH]);
        return Err(AuthError::InvalidCredentials);
    };

    let salt = STANDARD
        .decode(&stored.password_salt)
        .map_err(|_| AuthError::CorruptCredentials)?;
    let expected = STANDARD
        .decode(&stored.password_hash)
        .map_err(|_| AuthError::CorruptCredentials)?;

    let mut computed = derive(password, &salt);
    let matches = computed.as_slice().ct_eq(expected.as_slice()).unwrap_u8() == 1;
    computed.zeroize();

    if !matches {
        tracing::debug!(username = %stored.user.username, "Password mismatch");
        return Err(AuthError::InvalidCredentials);
    }
    Ok(stored.user)
}
