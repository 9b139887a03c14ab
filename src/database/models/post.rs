use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub const TABLE: &'static str = "posts";
    pub const SORT_SAFE_LIST: &'static [&'static str] = &["id", "text", "created_at", "updated_at"];
    pub const DEFAULT_SORT: &'static str = "id";
    pub const TEXT_SEARCH: &'static str = "text";
}
