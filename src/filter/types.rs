use serde::{Deserialize, Serialize};

use super::error::FilterError;
use super::filter::Filters;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Raw listing parameters exactly as they arrive in the query string.
///
/// Everything is kept as text so a bad value can be reported against the
/// parameter it came from instead of failing the whole extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
    pub text: Option<String>,
}

impl ListQuery {
    /// Parse into `Filters` for a resource. The result still has to go
    /// through `Filters::validate` before it can reach a query.
    pub fn into_filters(
        self,
        default_sort: &str,
        sort_safe_list: &'static [&'static str],
    ) -> Result<Filters, FilterError> {
        let page = parse_integer("page", self.page.as_deref())?.unwrap_or(DEFAULT_PAGE);
        let page_size = parse_integer("page_size", self.page_size.as_deref())?.unwrap_or(DEFAULT_PAGE_SIZE);
        let sort = match self.sort {
            Some(s) if !s.is_empty() => s,
            _ => default_sort.to_string(),
        };

        Ok(Filters { page, page_size, sort, sort_safe_list, text: self.text })
    }
}

fn parse_integer(field: &'static str, raw: Option<&str>) -> Result<Option<i64>, FilterError> {
    match raw {
        None | Some("") => Ok(None),
        Some(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| FilterError::invalid(field, "must be an integer value")),
    }
}

/// Pagination summary returned next to a page of rows. All fields are
/// omitted when there are no records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

impl Metadata {
    pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Self {
        if total_records <= 0 {
            return Metadata::default();
        }

        Metadata {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: (total_records + page_size - 1) / page_size,
            total_records,
        }
    }
}

/// One page of rows plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFE: &[&str] = &["id", "created_at"];

    #[test]
    fn list_query_defaults() {
        let filters = ListQuery::default().into_filters("id", SAFE).unwrap();
        assert_eq!(filters.page, 1);
        assert_eq!(filters.page_size, 20);
        assert_eq!(filters.sort, "id");
    }

    #[test]
    fn list_query_reports_the_bad_field() {
        let query = ListQuery { page: Some("two".into()), ..Default::default() };
        let err = query.into_filters("id", SAFE).unwrap_err();
        assert_eq!(err.field(), "page");

        let query = ListQuery { page_size: Some("1e3".into()), ..Default::default() };
        let err = query.into_filters("id", SAFE).unwrap_err();
        assert_eq!(err.field(), "page_size");
    }

    #[test]
    fn metadata_rounds_last_page_up() {
        let m = Metadata::calculate(21, 2, 10);
        assert_eq!(m.first_page, 1);
        assert_eq!(m.last_page, 3);
        assert_eq!(m.current_page, 2);
        assert_eq!(m.total_records, 21);

        assert_eq!(Metadata::calculate(20, 1, 10).last_page, 2);
    }

    #[test]
    fn empty_metadata_serializes_to_empty_object() {
        let json = serde_json::to_value(Metadata::calculate(0, 1, 10)).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
