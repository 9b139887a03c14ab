use std::collections::BTreeMap;
use thiserror::Error;

use crate::database::DirectoryError;

/// Every way an auth operation can fail. All are terminal for the request.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Token signing failed: {0}")]
    SigningError(String),

    #[error("Stored password digest is malformed")]
    MalformedDigest,

    #[error("Token is malformed or has an invalid signature")]
    MalformedToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Missing Authorization header")]
    MissingCredential,

    #[error("Authorization header format must be Bearer {{token}}")]
    MalformedCredential,

    #[error("Unauthenticated: {0}")]
    Unauthenticated(&'static str),

    #[error("Forbidden")]
    Forbidden,

    #[error("Identity not found")]
    IdentityNotFound,

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Boundary validation, keyed by request field.
    #[error("Invalid input")]
    Validation(BTreeMap<&'static str, String>),

    #[error("Directory error: {0}")]
    Directory(#[source] DirectoryError),
}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound => AuthError::IdentityNotFound,
            DirectoryError::DuplicateKey(key) => AuthError::DuplicateKey(key),
            other => AuthError::Directory(other),
        }
    }
}
