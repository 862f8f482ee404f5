use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Stored credential material for a user. Never serialized.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user: User,
    /// Base64 PBKDF2-SHA256 output.
    pub password_hash: String,
    /// Base64 per-user salt.
    pub password_salt: String,
}
