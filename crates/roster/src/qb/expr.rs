//! Expression layer for WHERE/HAVING conditions.
//!
//! `Expr::build()` emits `$n` placeholders directly; parameter indices are
//! computed while the tree is rendered, never patched in afterwards.

use crate::qb::param::{Param, ParamList};
use tokio_postgres::types::ToSql;

/// Expression node for building WHERE/HAVING clauses.
#[derive(Clone, Debug)]
pub enum Expr {
    /// AND group: all conditions must be true. Empty renders nothing.
    And(Vec<Expr>),

    /// Simple comparison: column op $n
    Compare {
        column: String,
        op: &'static str,
        value: Param,
    },

    /// Template with `?` placeholders that get replaced with `$n`.
    /// Example: `Template { sql: "a IN (SELECT x FROM t WHERE y > ?)", params: [1] }`
    Template { sql: String, params: Vec<Param> },

    /// Raw SQL fragment without parameters.
    Raw(String),
}

macro_rules! compare_ctor {
    ($($(#[$doc:meta])* $name:ident => $op:literal),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name<T: ToSql + Send + Sync + 'static>(column: impl Into<String>, value: T) -> Self {
                Expr::Compare {
                    column: column.into(),
                    op: $op,
                    value: Param::new(value),
                }
            }
        )*
    };
}

impl Expr {
    /// Create an AND expression from a list of expressions.
    pub fn and(exprs: Vec<Expr>) -> Self {
        Expr::And(exprs)
    }

    compare_ctor! {
        /// column = value
        eq => "=",
        /// column > value
        gt => ">",
        /// column >= value
        gte => ">=",
        /// column < value
        lt => "<",
        /// column <= value
        lte => "<=",
    }

    /// Create a template expression from values.
    ///
    /// # Example
    /// ```ignore
    /// Expr::template("member.age IN (SELECT m.age FROM member m WHERE m.age > ?)", vec![10_i32])
    /// ```
    pub fn template<T: ToSql + Send + Sync + 'static>(sql: impl Into<String>, values: Vec<T>) -> Self {
        Expr::Template {
            sql: sql.into(),
            params: values.into_iter().map(Param::new).collect(),
        }
    }

    /// Create a raw SQL fragment.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    /// True when the expression renders no SQL.
    pub fn is_empty(&self) -> bool {
        match self {
            Expr::And(exprs) => exprs.iter().all(Expr::is_empty),
            _ => false,
        }
    }

    /// Build the SQL fragment, appending bound values to `params`.
    pub fn build(&self, params: &mut ParamList) -> String {
        match self {
            Expr::And(exprs) => exprs
                .iter()
                .filter(|e| !e.is_empty())
                .map(|e| e.build(params))
                .collect::<Vec<_>>()
                .join(" AND "),
            Expr::Compare { column, op, value } => {
                let placeholder = params.bind(value.clone());
                format!("{column} {op} {placeholder}")
            }
            Expr::Template {
                sql,
                params: template_params,
            } => {
                let mut result = String::with_capacity(sql.len());
                let mut values = template_params.iter();
                for ch in sql.chars() {
                    if ch == '?' {
                        if let Some(value) = values.next() {
                            result.push_str(&params.bind(value.clone()));
                            continue;
                        }
                    }
                    result.push(ch);
                }
                result
            }
            Expr::Raw(sql) => sql.clone(),
        }
    }
}

/// An AND-list of expressions, built incrementally.
#[derive(Clone, Debug, Default)]
pub struct ExprGroup {
    exprs: Vec<Expr>,
}

impl ExprGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.iter().all(Expr::is_empty)
    }

    /// Add an expression to be ANDed.
    pub fn and_expr(&mut self, expr: Expr) {
        self.exprs.push(expr);
    }

    /// Add an expression only when present.
    pub fn and_opt(&mut self, expr: Option<Expr>) {
        if let Some(expr) = expr {
            self.exprs.push(expr);
        }
    }

    /// Render the group into an existing parameter list.
    ///
    /// Placeholders continue from whatever `params` already holds, so a
    /// caller can render several clauses into one statement.
    pub fn build_into(&self, params: &mut ParamList) -> String {
        Expr::And(self.exprs.clone()).build(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_skips_empty_children() {
        let expr = Expr::and(vec![
            Expr::and(vec![]),
            Expr::eq("member.username", "member1"),
            Expr::and(vec![Expr::and(vec![])]),
            Expr::gte("member.age", 10_i32),
        ]);
        let mut params = ParamList::new();
        assert_eq!(expr.build(&mut params), "member.username = $1 AND member.age >= $2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn template_numbers_continue_after_existing_params() {
        let mut params = ParamList::new();
        params.bind(Param::new(1_i64));
        let expr = Expr::template("member.age IN (SELECT m.age FROM member m WHERE m.age > ?)", vec![10_i32]);
        assert_eq!(
            expr.build(&mut params),
            "member.age IN (SELECT m.age FROM member m WHERE m.age > $2)"
        );
    }

    #[test]
    fn template_leaves_unmatched_marks() {
        let mut params = ParamList::new();
        let expr = Expr::template::<i32>("a = ? OR b = ?", vec![1]);
        assert_eq!(expr.build(&mut params), "a = $1 OR b = ?");
    }

    #[test]
    fn empty_group_renders_nothing() {
        let mut group = ExprGroup::new();
        group.and_opt(None);
        assert!(group.is_empty());
        assert_eq!(group.build_into(&mut ParamList::new()), "");
    }
}
