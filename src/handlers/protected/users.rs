// handlers/protected/users.rs - GET /api/users handler (admin only)

use axum::extract::{Query, State};

use crate::database::models::Identity;
use crate::database::Repository;
use crate::filter::{FilterError, ListQuery, Page};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/users?page&page_size&sort
///
/// Role gating happens in the router. Sortable by id, username, email and
/// created_at. There is no text search over users.
pub async fn users_get(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Page<Identity>> {
    if query.text.is_some() {
        return Err(FilterError::invalid("text", "is not supported for this listing").into());
    }
    let filters = query.into_filters(Identity::DEFAULT_SORT, Identity::SORT_SAFE_LIST)?.validate()?;

    let page = Repository::<Identity>::new(Identity::TABLE, state.pool.clone())
        .with_columns(Identity::COLUMNS)
        .list(&filters)
        .await?;
    Ok(ApiResponse::success(page))
}
