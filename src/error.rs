use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::auth::AuthError;
use crate::database::{DatabaseError, DirectoryError};
use crate::filter::FilterError;

const GENERIC_FAILURE: &str = "An error occurred while processing your request";

/// Error as the client sees it: a status, a stable code, a client-safe
/// message and, for validation failures, the offending fields.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    field_errors: Option<BTreeMap<String, String>>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into(), field_errors: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn validation_error(message: impl Into<String>, field_errors: BTreeMap<String, String>) -> Self {
        Self {
            field_errors: Some(field_errors),
            ..Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR", message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error_code(&self) -> &'static str {
        self.code
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": true,
            "message": self.message,
            "code": self.code,
        });
        if let Some(field_errors) = &self.field_errors {
            body["field_errors"] = json!(field_errors);
        }
        body
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential | AuthError::MalformedCredential => ApiError::unauthorized(err.to_string()),
            AuthError::MalformedToken | AuthError::ExpiredToken => {
                ApiError::unauthorized("Invalid or expired token")
            }
            AuthError::Unauthenticated(reason) => ApiError::unauthorized(reason),
            AuthError::IdentityNotFound => ApiError::unauthorized("Identity no longer exists"),
            AuthError::Forbidden => ApiError::forbidden("You do not have permission to access this resource"),
            AuthError::DuplicateKey(_) => ApiError::conflict("A user with this username or email already exists"),
            AuthError::Validation(fields) => ApiError::validation_error(
                "Invalid request body",
                fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            ),
            AuthError::HashingError(_) | AuthError::SigningError(_) | AuthError::MalformedDigest => {
                tracing::error!("Credential processing failed: {}", err);
                ApiError::internal_server_error(GENERIC_FAILURE)
            }
            AuthError::Directory(e) => e.into(),
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::InvalidFilterParameter { field, message } => {
                let mut field_errors = BTreeMap::new();
                field_errors.insert(field.to_string(), message);
                ApiError::validation_error("Invalid filter parameters", field_errors)
            }
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound => ApiError::not_found("Identity not found"),
            DirectoryError::DuplicateKey(_) => ApiError::conflict("A user with this username or email already exists"),
            DirectoryError::Sqlx(sqlx_err) => {
                tracing::error!("Directory query failed: {}", sqlx_err);
                ApiError::internal_server_error(GENERIC_FAILURE)
            }
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::InvalidIdentifier(name) => {
                tracing::error!("Refused to build query with identifier {:?}", name);
                ApiError::internal_server_error(GENERIC_FAILURE)
            }
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut) => {
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                tracing::error!("Listing query failed: {}", sqlx_err);
                ApiError::internal_server_error(GENERIC_FAILURE)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
