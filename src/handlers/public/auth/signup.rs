// handlers/public/auth/signup.rs - POST /auth/signup handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::utils::json_body;
use crate::auth::SignUpRequest;
use crate::database::models::Identity;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /auth/signup - Create an identity
///
/// Input: `{ "username", "email", "password", "role_id"? }`.
/// Responds 201 with the new identity; the password digest is never returned.
/// Every invalid field is reported at once under `field_errors`.
pub async fn signup_post(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> ApiResult<Identity> {
    let request = json_body(payload)?;
    let identity = state.auth.sign_up(request).await?;
    Ok(ApiResponse::created(identity))
}
