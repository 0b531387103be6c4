//! DELETE query builder.

use crate::client::GenericClient;
use crate::error::RosterResult;
use crate::qb::expr::{Expr, ExprGroup};
use crate::qb::param::ParamList;

/// DELETE query builder.
///
/// Without WHERE conditions the builder emits `WHERE 1=0`, so a forgotten
/// filter deletes nothing.
#[derive(Clone, Debug)]
pub struct DeleteQb {
    table: String,
    where_group: ExprGroup,
    tag: Option<String>,
}

impl DeleteQb {
    /// Create a new DELETE query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            where_group: ExprGroup::new(),
            tag: None,
        }
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

    /// Build the DELETE SQL and parameters.
    pub fn build(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let mut sql = format!("DELETE FROM {}", self.table);

        if self.where_group.is_empty() {
            sql.push_str(" WHERE 1=0");
            return (sql, params);
        }

        sql.push_str(" WHERE ");
        sql.push_str(&self.where_group.build_into(&mut params));
        (sql, params)
    }

    /// Execute and return the number of affected rows.
    pub async fn execute(&self, conn: &impl GenericClient) -> RosterResult<u64> {
        let (sql, params) = self.build();
        let tag = self.tag.as_deref().unwrap_or("delete");
        conn.execute_tagged(tag, &sql, &params.as_refs()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_with_where() {
        let (sql, params) = DeleteQb::new("member")
            .and_expr(Expr::gt("age", 18_i32))
            .build();
        assert_eq!(sql, "DELETE FROM member WHERE age > $1");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_delete_without_where_is_noop() {
        assert_eq!(DeleteQb::new("member").build().0, "DELETE FROM member WHERE 1=0");
    }
}
