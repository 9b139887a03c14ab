use super::filter::ValidatedFilters;
use super::types::SortDirection;
use crate::database::DatabaseManager;

pub struct FilterOrder;

impl FilterOrder {
    /// ORDER BY clause for a validated sort. Rows that tie on the sort column
    /// are ordered by `tie_breaker` ascending so pages never overlap.
    pub fn generate(filters: &ValidatedFilters, tie_breaker: &str) -> String {
        let column = filters.sort_column();
        let mut parts = vec![format!(
            "{} {}",
            DatabaseManager::quote_identifier(column),
            filters.sort_direction().to_sql()
        )];

        if column != tie_breaker {
            parts.push(format!(
                "{} {}",
                DatabaseManager::quote_identifier(tie_breaker),
                SortDirection::Asc.to_sql()
            ));
        }

        format!("ORDER BY {}", parts.join(", "))
    }
}
