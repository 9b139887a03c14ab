// handlers/public/auth/signin.rs - POST /auth/signin handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::utils::json_body;
use crate::auth::{SignInRequest, TokenPair};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /auth/signin - Exchange credentials for tokens
///
/// Input: `{ "login": "<username or email>", "password" }`.
/// Unknown logins and wrong passwords both answer 401 with the same message.
pub async fn signin_post(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> ApiResult<TokenPair> {
    let request = json_body(payload)?;
    let pair = state.auth.sign_in(request).await?;
    Ok(ApiResponse::success(pair))
}
