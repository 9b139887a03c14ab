use super::error::FilterError;
use super::types::SortDirection;

pub const MAX_PAGE: i64 = 100_000_000;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_TEXT_LENGTH: usize = 255;

/// Client supplied pagination and sort parameters plus the safe-list of sort
/// values the resource accepts. Nothing here is trusted yet.
#[derive(Debug, Clone)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    pub sort_safe_list: &'static [&'static str],
    /// Substring to match against the resource's text column, if any.
    pub text: Option<String>,
}

/// Filters that passed `Filters::validate`. This is the only type the query
/// layer accepts, and it has no other constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFilters {
    page: i64,
    page_size: i64,
    column: String,
    direction: SortDirection,
    text: Option<String>,
}

impl Filters {
    pub fn validate(self) -> Result<ValidatedFilters, FilterError> {
        if self.page <= 0 {
            return Err(FilterError::invalid("page", "must be greater than zero"));
        }
        if self.page > MAX_PAGE {
            return Err(FilterError::invalid("page", format!("must be a maximum of {}", MAX_PAGE)));
        }
        if self.page_size <= 0 {
            return Err(FilterError::invalid("page_size", "must be greater than zero"));
        }
        if self.page_size > MAX_PAGE_SIZE {
            return Err(FilterError::invalid("page_size", format!("must be a maximum of {}", MAX_PAGE_SIZE)));
        }

        let (column, direction) = match self.sort.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Desc),
            None => (self.sort.as_str(), SortDirection::Asc),
        };

        // "--x" would leave "-x" as the column
        if column.is_empty() || column.starts_with('-') || !self.is_safe(column) {
            return Err(FilterError::invalid("sort", "invalid sort value"));
        }

        let text = match self.text.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(t) if t.chars().count() > MAX_TEXT_LENGTH => {
                return Err(FilterError::invalid("text", format!("must be at most {} characters", MAX_TEXT_LENGTH)));
            }
            Some(t) => Some(t.to_string()),
        };

        Ok(ValidatedFilters {
            page: self.page,
            page_size: self.page_size,
            column: column.to_string(),
            direction,
            text,
        })
    }

    fn is_safe(&self, column: &str) -> bool {
        self.sort_safe_list
            .iter()
            .any(|safe| *safe == self.sort || *safe == column)
    }
}

impl ValidatedFilters {
    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Sort value without the descending marker.
    pub fn sort_column(&self) -> &str {
        &self.column
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.direction
    }

    /// Trimmed, non-empty text search term.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Pages are 1-based; page 1 starts at offset 0.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}
