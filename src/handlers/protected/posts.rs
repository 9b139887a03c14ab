// handlers/protected/posts.rs - GET /api/posts handler

use axum::extract::{Query, State};

use crate::database::models::Post;
use crate::database::Repository;
use crate::filter::{ListQuery, Page};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/posts?page&page_size&sort&text
///
/// Sortable by id, text, created_at and updated_at (prefix `-` for
/// descending). `text` keeps posts containing the term, ignoring case.
/// Filters are validated before the database is touched.
pub async fn posts_get(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Page<Post>> {
    let filters = query.into_filters(Post::DEFAULT_SORT, Post::SORT_SAFE_LIST)?.validate()?;

    let page = Repository::<Post>::new(Post::TABLE, state.pool.clone())
        .with_text_search(Post::TEXT_SEARCH)
        .list(&filters)
        .await?;
    Ok(ApiResponse::success(page))
}
