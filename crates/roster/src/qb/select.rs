//! SELECT query builder.

use crate::client::GenericClient;
use crate::error::RosterResult;
use crate::page::Pageable;
use crate::qb::expr::{Expr, ExprGroup};
use crate::qb::param::{Param, ParamList};
use crate::row::FromRow;
use tokio_postgres::Row;

/// SELECT query builder with an expression-based WHERE clause.
///
/// LIMIT and OFFSET are bound parameters, so a content query and its count
/// query can share everything except the paging tail.
#[derive(Clone, Debug)]
pub struct SelectQb {
    /// Table or FROM expression
    from_expr: String,
    /// SELECT columns (default ["*"])
    select_cols: Vec<String>,
    join_clauses: Vec<String>,
    where_group: ExprGroup,
    order_clauses: Vec<String>,
    group_by: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    /// Observability tag; the count query uses `<tag>.count`.
    tag: Option<String>,
}

impl SelectQb {
    /// Create a SELECT query builder over a table or FROM expression.
    pub fn new(from_expr: &str) -> Self {
        Self {
            from_expr: from_expr.to_string(),
            select_cols: vec!["*".to_string()],
            join_clauses: Vec::new(),
            where_group: ExprGroup::new(),
            order_clauses: Vec::new(),
            group_by: None,
            limit: None,
            offset: None,
            tag: None,
        }
    }

    // ==================== SELECT columns ====================

    /// Set SELECT columns (array form).
    pub fn select_cols(mut self, cols: &[&str]) -> Self {
        self.select_cols = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    // ==================== JOIN ====================

    /// Add INNER JOIN.
    pub fn inner_join(mut self, table: &str, on: &str) -> Self {
        self.join_clauses.push(format!("INNER JOIN {table} ON {on}"));
        self
    }

    /// Add LEFT JOIN.
    pub fn left_join(mut self, table: &str, on: &str) -> Self {
        self.join_clauses.push(format!("LEFT JOIN {table} ON {on}"));
        self
    }

    // ==================== WHERE ====================

    /// Add WHERE: column = value
    pub fn eq<T: tokio_postgres::types::ToSql + Send + Sync + 'static>(
        mut self,
        column: &str,
        value: T,
    ) -> Self {
        self.where_group.and_expr(Expr::eq(column, value));
        self
    }

    /// AND a custom expression into WHERE.
    pub fn and_expr(mut self, expr: Expr) -> Self {
        self.where_group.and_expr(expr);
        self
    }

    /// AND an expression into WHERE only when present.
    pub fn and_opt(mut self, expr: Option<Expr>) -> Self {
        self.where_group.and_opt(expr);
        self
    }

    // ==================== Ordering & Grouping ====================

    /// Add ORDER BY clause.
    pub fn order_by(mut self, clause: &str) -> Self {
        self.order_clauses.push(clause.to_string());
        self
    }

    /// Set GROUP BY clause.
    pub fn group_by(mut self, clause: &str) -> Self {
        self.group_by = Some(clause.to_string());
        self
    }

    // ==================== Pagination ====================

    /// Set LIMIT.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Apply a page request: its sort orders, then LIMIT/OFFSET unless unpaged.
    pub fn paged(mut self, pageable: &Pageable) -> Self {
        for order in pageable.sort().orders() {
            self.order_clauses.push(order.to_sql());
        }
        if let Some(size) = pageable.page_size() {
            // `Pageable` keeps both within `MAX_WINDOW`.
            self.limit = Some(i64::try_from(size).unwrap_or(i64::MAX));
            self.offset = Some(i64::try_from(pageable.offset()).unwrap_or(i64::MAX));
        }
        self
    }

    /// Tag the statement for observability.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    // ==================== Build helpers ====================

    fn push_from_where(&self, sql: &mut String, params: &mut ParamList) {
        sql.push_str(" FROM ");
        sql.push_str(&self.from_expr);

        for join in &self.join_clauses {
            sql.push(' ');
            sql.push_str(join);
        }

        let where_sql = self.where_group.build_into(params);
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        if let Some(ref group) = self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group);
        }
    }

    /// Build the content query.
    pub fn build(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let mut sql = format!("SELECT {}", self.select_cols.join(", "));
        self.push_from_where(&mut sql, &mut params);

        if !self.order_clauses.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_clauses.join(", "));
        }

        if let Some(limit) = self.limit {
            let placeholder = params.bind(Param::new(limit));
            sql.push_str(" LIMIT ");
            sql.push_str(&placeholder);
        }

        if let Some(offset) = self.offset {
            let placeholder = params.bind(Param::new(offset));
            sql.push_str(" OFFSET ");
            sql.push_str(&placeholder);
        }

        (sql, params)
    }

    /// Build the COUNT query: same FROM/JOIN/WHERE, no ORDER BY or paging.
    ///
    /// Grouped queries count groups through a subquery.
    pub fn build_count(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        if self.group_by.is_some() {
            let mut inner = String::from("SELECT 1");
            self.push_from_where(&mut inner, &mut params);
            (format!("SELECT COUNT(*) FROM ({inner}) AS t"), params)
        } else {
            let mut sql = String::from("SELECT COUNT(*)");
            self.push_from_where(&mut sql, &mut params);
            (sql, params)
        }
    }

    /// Get the built SQL string (for debugging).
    pub fn to_sql(&self) -> String {
        self.build().0
    }

    /// Get the COUNT SQL string (for debugging).
    pub fn to_count_sql(&self) -> String {
        self.build_count().0
    }

    fn content_tag(&self) -> &str {
        self.tag.as_deref().unwrap_or("select")
    }

    // ==================== Execution ====================

    /// Execute the content query and return raw rows.
    pub async fn query(&self, conn: &impl GenericClient) -> RosterResult<Vec<Row>> {
        let (sql, params) = self.build();
        conn.query_tagged(self.content_tag(), &sql, &params.as_refs())
            .await
    }

    /// Execute and map every row.
    pub async fn fetch_all<T: FromRow>(&self, conn: &impl GenericClient) -> RosterResult<Vec<T>> {
        let rows = self.query(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute and map the first row, if any.
    pub async fn fetch_opt<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> RosterResult<Option<T>> {
        let (sql, params) = self.build();
        let row = conn
            .query_opt_tagged(self.content_tag(), &sql, &params.as_refs())
            .await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Execute the COUNT query.
    pub async fn count(&self, conn: &impl GenericClient) -> RosterResult<i64> {
        let (sql, params) = self.build_count();
        let tag = format!("{}.count", self.content_tag());
        let row = conn.query_one_tagged(&tag, &sql, &params.as_refs()).await?;
        i64::from_row(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{MAX_WINDOW, Order, Sort, SortKey};

    fn joined() -> SelectQb {
        SelectQb::new("member").left_join("team", "member.team_id = team.id")
    }

    #[test]
    fn test_simple_select() {
        assert_eq!(SelectQb::new("team").to_sql(), "SELECT * FROM team");
    }

    #[test]
    fn test_select_with_join_and_where() {
        let qb = joined()
            .select_cols(&["member.id", "team.name"])
            .eq("team.name", "teamA");
        assert_eq!(
            qb.to_sql(),
            "SELECT member.id, team.name FROM member LEFT JOIN team ON member.team_id = team.id WHERE team.name = $1"
        );
    }

    #[test]
    fn test_limit_offset_are_bound_after_where() {
        let qb = joined()
            .and_expr(Expr::gte("member.age", 20_i32))
            .order_by("member.username DESC")
            .limit(2)
            .offset(1);
        let (sql, params) = qb.build();
        assert_eq!(
            sql,
            "SELECT * FROM member LEFT JOIN team ON member.team_id = team.id WHERE member.age >= $1 ORDER BY member.username DESC LIMIT $2 OFFSET $3"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_count_drops_order_and_paging() {
        let qb = joined()
            .and_expr(Expr::lte("member.age", 35_i32))
            .order_by("member.id ASC")
            .limit(10)
            .offset(20);
        let (sql, params) = qb.build_count();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM member LEFT JOIN team ON member.team_id = team.id WHERE member.age <= $1"
        );
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_count_with_group_by_wraps_subquery() {
        let qb = joined().select_cols(&["team.name", "COUNT(*)"]).group_by("team.name");
        assert_eq!(
            qb.to_count_sql(),
            "SELECT COUNT(*) FROM (SELECT 1 FROM member LEFT JOIN team ON member.team_id = team.id GROUP BY team.name) AS t"
        );
    }

    #[test]
    fn test_absent_predicates_leave_no_where() {
        let qb = SelectQb::new("member").and_opt(None).and_expr(Expr::and(vec![]));
        assert_eq!(qb.to_sql(), "SELECT * FROM member");
    }

    #[test]
    fn test_paged_applies_sort_and_window() {
        let pageable = Pageable::of(1, 2)
            .unwrap()
            .with_sort(Sort::by(vec![Order::desc(SortKey::Username)]));
        let qb = SelectQb::new("member").paged(&pageable);
        let (sql, params) = qb.build();
        assert_eq!(
            sql,
            "SELECT * FROM member ORDER BY member.username DESC LIMIT $1 OFFSET $2"
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_largest_window_binds_positive_bigints() {
        let qb = SelectQb::new("member").paged(&Pageable::at_offset(MAX_WINDOW, MAX_WINDOW).unwrap());
        assert_eq!(qb.limit, Some(i64::MAX));
        assert_eq!(qb.offset, Some(i64::MAX));

        let qb = SelectQb::new("member").paged(&Pageable::of(3, 25).unwrap());
        assert_eq!(qb.limit, Some(25));
        assert_eq!(qb.offset, Some(75));
    }

    #[test]
    fn test_unpaged_keeps_sort_only() {
        let pageable = Pageable::unpaged().with_sort(Sort::by(vec![Order::asc(SortKey::Age)]));
        let qb = SelectQb::new("member").paged(&pageable);
        assert_eq!(qb.to_sql(), "SELECT * FROM member ORDER BY member.age ASC");
    }
}
