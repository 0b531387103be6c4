//! INSERT query builder.

use crate::client::GenericClient;
use crate::error::RosterResult;
use crate::qb::param::{Param, ParamList};
use crate::row::FromRow;
use tokio_postgres::types::ToSql;

/// Single-row INSERT with an optional RETURNING list.
#[derive(Clone, Debug)]
pub struct InsertQb {
    table: String,
    columns: Vec<String>,
    values: Vec<Param>,
    returning_cols: Vec<String>,
    tag: Option<String>,
}

impl InsertQb {
    /// Create a new INSERT query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            values: Vec::new(),
            returning_cols: Vec::new(),
            tag: None,
        }
    }

    /// Set a column value.
    pub fn set<T: ToSql + Send + Sync + 'static>(mut self, column: &str, value: T) -> Self {
        self.columns.push(column.to_string());
        self.values.push(Param::new(value));
        self
    }

    /// Set RETURNING columns.
    pub fn returning_cols(mut self, cols: &[&str]) -> Self {
        self.returning_cols = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Tag the statement for observability.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Build the SQL and parameters.
    pub fn build(&self) -> (String, ParamList) {
        let mut params = ParamList::new();

        let mut sql = if self.columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", self.table)
        } else {
            let placeholders: Vec<String> =
                self.values.iter().map(|v| params.bind(v.clone())).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table,
                self.columns.join(", "),
                placeholders.join(", ")
            )
        };

        if !self.returning_cols.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&self.returning_cols.join(", "));
        }

        (sql, params)
    }

    fn tag_or_default(&self) -> &str {
        self.tag.as_deref().unwrap_or("insert")
    }

    /// Execute and return the number of affected rows.
    pub async fn execute(&self, conn: &impl GenericClient) -> RosterResult<u64> {
        let (sql, params) = self.build();
        conn.execute_tagged(self.tag_or_default(), &sql, &params.as_refs())
            .await
    }

    /// Execute and map the RETURNING row.
    pub async fn fetch_one<T: FromRow>(&self, conn: &impl GenericClient) -> RosterResult<T> {
        let (sql, params) = self.build();
        let row = conn
            .query_one_tagged(self.tag_or_default(), &sql, &params.as_refs())
            .await?;
        T::from_row(&row)
    }
}
