use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::error;

use super::models::{Identity, NewIdentity, Role, StoredCredential};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Identity not found")]
    NotFound,

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Credential and role lookup for the auth layer.
///
/// Implementations serialize their own storage access; callers hold no locks.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up by username or email.
    async fn find_by_lookup_key(&self, key: &str) -> Result<StoredCredential, DirectoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Identity, DirectoryError>;

    async fn get_role(&self, id: i64) -> Result<Role, DirectoryError>;

    /// Fails with `DuplicateKey` when the username or email is taken.
    async fn create_identity(&self, fields: NewIdentity) -> Result<Identity, DirectoryError>;
}

/// `users` table backed directory. Soft-deleted rows are invisible.
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_lookup_key(&self, key: &str) -> Result<StoredCredential, DirectoryError> {
        let query = r#"
            SELECT id, password_hash
            FROM users
            WHERE (username = $1 OR email = $1)
            AND deleted_at IS NULL
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DirectoryError::NotFound)?;

        Ok(StoredCredential {
            id: row.try_get("id")?,
            password_hash: row.try_get("password_hash")?,
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Identity, DirectoryError> {
        let query = r#"
            SELECT id, username, email, role_id, created_at
            FROM users
            WHERE id = $1
            AND deleted_at IS NULL
        "#;

        sqlx::query_as::<_, Identity>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DirectoryError::NotFound)
    }

    async fn get_role(&self, id: i64) -> Result<Role, DirectoryError> {
        let row = sqlx::query("SELECT role_id FROM users WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DirectoryError::NotFound)?;

        Ok(Role(row.try_get("role_id")?))
    }

    async fn create_identity(&self, fields: NewIdentity) -> Result<Identity, DirectoryError> {
        let query = r#"
            INSERT INTO users (username, email, password_hash, role_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, username, email, role_id, created_at
        "#;

        sqlx::query_as::<_, Identity>(query)
            .bind(&fields.username)
            .bind(&fields.email)
            .bind(&fields.password_hash)
            .bind(fields.role.code())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    DirectoryError::DuplicateKey(db.constraint().unwrap_or("users").to_string())
                }
                other => {
                    error!("Failed to insert user '{}': {}", fields.username, other);
                    DirectoryError::Sqlx(other)
                }
            })
    }
}

struct MemoryRecord {
    identity: Identity,
    password_hash: String,
}

/// In-process directory with the same uniqueness rules as the `users` table.
#[derive(Default)]
pub struct MemoryUserDirectory {
    records: RwLock<Vec<MemoryRecord>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_lookup_key(&self, key: &str) -> Result<StoredCredential, DirectoryError> {
        let records = self.records.read().await;
        records
            .iter()
            .find(|r| r.identity.username == key || r.identity.email == key)
            .map(|r| StoredCredential { id: r.identity.id, password_hash: r.password_hash.clone() })
            .ok_or(DirectoryError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> Result<Identity, DirectoryError> {
        let records = self.records.read().await;
        records
            .iter()
            .find(|r| r.identity.id == id)
            .map(|r| r.identity.clone())
            .ok_or(DirectoryError::NotFound)
    }

    async fn get_role(&self, id: i64) -> Result<Role, DirectoryError> {
        self.find_by_id(id).await.map(|identity| identity.role)
    }

    async fn create_identity(&self, fields: NewIdentity) -> Result<Identity, DirectoryError> {
        let mut records = self.records.write().await;

        if records.iter().any(|r| r.identity.username == fields.username) {
            return Err(DirectoryError::DuplicateKey("users_username_key".to_string()));
        }
        if records.iter().any(|r| r.identity.email == fields.email) {
            return Err(DirectoryError::DuplicateKey("users_email_key".to_string()));
        }

        let identity = Identity {
            id: records.len() as i64 + 1,
            username: fields.username,
            email: fields.email,
            role: fields.role,
            created_at: Utc::now(),
        };
        records.push(MemoryRecord { identity: identity.clone(), password_hash: fields.password_hash });
        Ok(identity)
    }
}
