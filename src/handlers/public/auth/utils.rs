use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::ApiError;

/// Unwrap a JSON body, reporting a bad payload in the API error format
/// instead of axum's plain-text rejection.
pub(super) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            Err(ApiError::bad_request(rejection.body_text()))
        }
    }
}
