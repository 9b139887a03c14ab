use axum::{extract::State, Extension};
use serde::Serialize;

use crate::database::models::Identity;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    #[serde(flatten)]
    pub identity: Identity,
    pub token: TokenInfo,
}

#[derive(Debug, Serialize)]
pub struct TokenInfo {
    pub issued_at: i64,
    pub expires_at: i64,
}

/// GET /api/auth/whoami - The identity behind the presented access token
///
/// A token for an identity that has since been removed answers 401.
pub async fn whoami_get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<WhoAmI> {
    let identity = state.auth.whoami(user.user_id).await?;

    Ok(ApiResponse::success(WhoAmI {
        identity,
        token: TokenInfo {
            issued_at: user.issued_at,
            expires_at: user.expires_at,
        },
    }))
}
