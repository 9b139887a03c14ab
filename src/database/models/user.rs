use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};

/// Integer role code attached to every identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(pub i32);

impl Role {
    pub const ADMIN: Role = Role(1);
    pub const MEMBER: Role = Role(2);

    pub fn code(self) -> i32 {
        self.0
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::MEMBER
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public view of a user. The password digest never leaves the directory
/// through this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub const TABLE: &'static str = "users";
    pub const SORT_SAFE_LIST: &'static [&'static str] = &["id", "username", "email", "created_at"];
    pub const DEFAULT_SORT: &'static str = "id";
    /// Listing columns. `password_hash` is deliberately absent.
    pub const COLUMNS: &'static [&'static str] = &["id", "username", "email", "role_id", "created_at"];
}

impl<'r> FromRow<'r, PgRow> for Identity {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            role: Role(row.try_get("role_id")?),
            created_at: row.try_get("created_at")?,
        })
    }
}

/// What sign-in needs from the directory: who, and the stored digest.
#[derive(Debug, Clone)]
pub struct StoredCredential {
    pub id: i64,
    pub password_hash: String,
}

/// Fields for a new identity. `password_hash` is already a digest.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}
