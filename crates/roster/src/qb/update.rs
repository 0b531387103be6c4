//! UPDATE query builder.

use crate::client::GenericClient;
use crate::error::{RosterError, RosterResult};
use crate::qb::expr::{Expr, ExprGroup};
use crate::qb::param::{Param, ParamList};
use tokio_postgres::types::ToSql;

/// SET field value type.
#[derive(Clone, Debug)]
enum SetField {
    /// Parameterized value
    Value(Param),
    /// Expression over the current row, e.g. `age + ?`
    Expr(Expr),
}

/// UPDATE query builder.
#[derive(Clone, Debug)]
pub struct UpdateQb {
    table: String,
    set_fields: Vec<(String, SetField)>,
    where_group: ExprGroup,
    tag: Option<String>,
}

impl UpdateQb {
    /// Create a new UPDATE query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            set_fields: Vec::new(),
            where_group: ExprGroup::new(),
            tag: None,
        }
    }

    /// Set a column value.
    pub fn set<T: ToSql + Send + Sync + 'static>(mut self, column: &str, value: T) -> Self {
        self.set_fields
            .push((column.to_string(), SetField::Value(Param::new(value))));
        self
    }

    /// Set a column from an expression with `?` placeholders.
    ///
    /// ```ignore
    /// qb::update("member").set_template("age", "age + ?", vec![1_i32]);
    /// ```
    pub fn set_template<T: ToSql + Send + Sync + 'static>(
        mut self,
        column: &str,
        sql: &str,
        values: Vec<T>,
    ) -> Self {
        self.set_fields
            .push((column.to_string(), SetField::Expr(Expr::template(sql, values))));
        self
    }

    /// AND a condition into WHERE.
    pub fn and_expr(mut self, expr: Expr) -> Self {
        self.where_group.and_expr(expr);
        self
    }

    /// Tag the statement for observability.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Build the UPDATE SQL and parameters.
    ///
    /// An UPDATE with no SET fields is a builder error.
    pub fn build(&self) -> RosterResult<(String, ParamList)> {
        if self.set_fields.is_empty() {
            return Err(RosterError::validation(format!(
                "UPDATE {} has no SET fields",
                self.table
            )));
        }

        let mut params = ParamList::new();
        let set_parts: Vec<String> = self
            .set_fields
            .iter()
            .map(|(col, field)| match field {
                SetField::Value(param) => format!("{col} = {}", params.bind(param.clone())),
                SetField::Expr(expr) => format!("{col} = {}", expr.build(&mut params)),
            })
            .collect();

        let mut sql = format!("UPDATE {} SET {}", self.table, set_parts.join(", "));

        let where_sql = self.where_group.build_into(&mut params);
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        Ok((sql, params))
    }

    /// Execute and return the number of affected rows.
    pub async fn execute(&self, conn: &impl GenericClient) -> RosterResult<u64> {
        let (sql, params) = self.build()?;
        let tag = self.tag.as_deref().unwrap_or("update");
        conn.execute_tagged(tag, &sql, &params.as_refs()).await
    }
}
