use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::filter::{FilterOrder, ValidatedFilters};

pub const TIE_BREAKER: &str = "id";

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlResult {
    pub query: String,
    /// Values for `$1`, `$2`, ... in order.
    pub params: Vec<SqlParam>,
}

/// Builds listing SQL. Identifiers are validated and quoted; the text search
/// term, limit and offset are bound as parameters.
pub struct QueryBuilder {
    table_name: String,
    select_columns: Vec<String>,
    text_column: Option<String>,
    soft_delete: bool,
}

impl QueryBuilder {
    pub fn new(table_name: impl Into<String>) -> Result<Self, DatabaseError> {
        let table_name = table_name.into();
        DatabaseManager::validate_identifier(&table_name)?;
        Ok(Self {
            table_name,
            select_columns: vec![],
            text_column: None,
            soft_delete: true,
        })
    }

    pub fn select(mut self, columns: &[&str]) -> Result<Self, DatabaseError> {
        for column in columns {
            DatabaseManager::validate_identifier(column)?;
        }
        self.select_columns = columns.iter().map(|c| c.to_string()).collect();
        Ok(self)
    }

    /// Column matched case-insensitively against `ValidatedFilters::text`.
    /// Without one, a text term is not applied.
    pub fn text_search(mut self, column: &str) -> Result<Self, DatabaseError> {
        DatabaseManager::validate_identifier(column)?;
        self.text_column = Some(column.to_string());
        Ok(self)
    }

    /// Include rows with `deleted_at` set.
    pub fn include_deleted(mut self) -> Self {
        self.soft_delete = false;
        self
    }

    pub fn to_list_sql(&self, filters: &ValidatedFilters) -> Result<SqlResult, DatabaseError> {
        DatabaseManager::validate_identifier(filters.sort_column())?;

        let mut params = Vec::new();
        let where_clause = self.where_clause(filters, &mut params);
        let limit = placeholder(&mut params, SqlParam::Int(filters.limit()));
        let offset = placeholder(&mut params, SqlParam::Int(filters.offset()));

        let query = join_clauses([
            format!("SELECT {}", self.select_clause()),
            format!("FROM {}", DatabaseManager::quote_identifier(&self.table_name)),
            where_clause,
            FilterOrder::generate(filters, TIE_BREAKER),
            format!("LIMIT {} OFFSET {}", limit, offset),
        ]);

        Ok(SqlResult { query, params })
    }

    /// Row count over the same scope as `to_list_sql`, ignoring paging.
    pub fn to_count_sql(&self, filters: &ValidatedFilters) -> SqlResult {
        let mut params = Vec::new();
        let where_clause = self.where_clause(filters, &mut params);

        let query = join_clauses([
            "SELECT COUNT(*) AS count".to_string(),
            format!("FROM {}", DatabaseManager::quote_identifier(&self.table_name)),
            where_clause,
        ]);

        SqlResult { query, params }
    }

    fn select_clause(&self) -> String {
        if self.select_columns.is_empty() {
            "*".to_string()
        } else {
            self.select_columns
                .iter()
                .map(|c| DatabaseManager::quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    fn where_clause(&self, filters: &ValidatedFilters, params: &mut Vec<SqlParam>) -> String {
        let mut conditions = Vec::new();
        if self.soft_delete {
            conditions.push("\"deleted_at\" IS NULL".to_string());
        }
        if let (Some(column), Some(text)) = (&self.text_column, filters.text()) {
            let n = placeholder(params, SqlParam::Text(format!("%{}%", escape_like(text))));
            conditions.push(format!(
                "{} ILIKE {} ESCAPE '\\'",
                DatabaseManager::quote_identifier(column),
                n
            ));
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        }
    }
}

fn placeholder(params: &mut Vec<SqlParam>, value: SqlParam) -> String {
    params.push(value);
    format!("${}", params.len())
}

fn join_clauses<const N: usize>(clauses: [String; N]) -> String {
    clauses.into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ")
}

/// `%` and `_` in the term match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
