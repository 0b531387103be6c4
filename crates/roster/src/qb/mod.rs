//! SQL assembly for the repositories.
//!
//! Every builder renders `$n` placeholders while walking its clauses, so the
//! parameter list and the SQL text can never drift apart.
//!
//! # Usage
//!
//! ```ignore
//! use roster::qb::{self, Expr};
//!
//! let rows: Vec<MemberTeamRow> = qb::select("member")
//!     .left_join("team", "member.team_id = team.id")
//!     .and_expr(Expr::gte("member.age", 20_i32))
//!     .order_by("member.id ASC")
//!     .tag("member.adults")
//!     .fetch_all(&client)
//!     .await?;
//!
//! qb::update("member")
//!     .set_template("age", "age + ?", vec![1_i32])
//!     .execute(&client)
//!     .await?;
//! ```

mod delete;
mod expr;
mod insert;
mod param;
mod select;
mod update;

pub use delete::DeleteQb;
pub use expr::{Expr, ExprGroup};
pub use insert::InsertQb;
pub use param::{Param, ParamList};
pub use select::SelectQb;
pub use update::UpdateQb;

/// Create a SELECT query builder over a table or FROM expression.
pub fn select(from_expr: &str) -> SelectQb {
    SelectQb::new(from_expr)
}

/// Create an INSERT query builder for the given table.
pub fn insert(table: &str) -> InsertQb {
    InsertQb::new(table)
}

/// Create an UPDATE query builder for the given table.
pub fn update(table: &str) -> UpdateQb {
    UpdateQb::new(table)
}

/// Create a DELETE query builder for the given table.
///
/// Without WHERE conditions the statement is a no-op (`WHERE 1=0`).
pub fn delete(table: &str) -> DeleteQb {
    DeleteQb::new(table)
}
