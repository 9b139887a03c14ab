use sqlx::{self, postgres::PgRow, FromRow, PgPool, Row};
use tracing::debug;

use crate::database::manager::DatabaseError;
use crate::database::query_builder::{QueryBuilder, SqlParam};
use crate::filter::{Metadata, Page, ValidatedFilters};

/// Read side for one table. Listing only accepts `ValidatedFilters`.
pub struct Repository<T> {
    table_name: &'static str,
    columns: &'static [&'static str],
    text_column: Option<&'static str>,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &'static str, pool: PgPool) -> Self {
        Self {
            table_name,
            columns: &[],
            text_column: None,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Restrict the selected columns, e.g. to keep digests out of a listing.
    pub fn with_columns(mut self, columns: &'static [&'static str]) -> Self {
        self.columns = columns;
        self
    }

    /// Column the `text` filter searches.
    pub fn with_text_search(mut self, column: &'static str) -> Self {
        self.text_column = Some(column);
        self
    }

    fn builder(&self) -> Result<QueryBuilder, DatabaseError> {
        let mut builder = QueryBuilder::new(self.table_name)?;
        if !self.columns.is_empty() {
            builder = builder.select(self.columns)?;
        }
        if let Some(column) = self.text_column {
            builder = builder.text_search(column)?;
        }
        Ok(builder)
    }

    pub async fn list(&self, filters: &ValidatedFilters) -> Result<Page<T>, DatabaseError> {
        let builder = self.builder()?;
        let list_sql = builder.to_list_sql(filters)?;
        debug!("{} list: {}", self.table_name, list_sql.query);

        let mut q = sqlx::query_as::<_, T>(&list_sql.query);
        for param in list_sql.params {
            q = match param {
                SqlParam::Int(v) => q.bind(v),
                SqlParam::Text(v) => q.bind(v),
            };
        }
        let records = q.fetch_all(&self.pool).await?;

        let count_sql = builder.to_count_sql(filters);
        let mut q = sqlx::query(&count_sql.query);
        for param in count_sql.params {
            q = match param {
                SqlParam::Int(v) => q.bind(v),
                SqlParam::Text(v) => q.bind(v),
            };
        }
        let total: i64 = q.fetch_one(&self.pool).await?.try_get("count")?;

        Ok(Page {
            records,
            metadata: Metadata::calculate(total, filters.page(), filters.page_size()),
        })
    }
}
