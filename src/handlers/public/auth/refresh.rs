// handlers/public/auth/refresh.rs - POST /auth/refresh handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::utils::json_body;
use crate::auth::{RefreshRequest, TokenPair};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /auth/refresh - Trade a refresh token for a new access token
pub async fn refresh_post(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<TokenPair> {
    let request = json_body(payload)?;
    let pair = state.auth.refresh(request).await?;
    Ok(ApiResponse::success(pair))
}
