//! Row mapping traits and utilities

use crate::error::{RosterError, RosterResult};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Trait for converting a database row into a Rust struct.
///
/// This trait should typically be derived using `#[derive(FromRow)]`
/// from the `roster-derive` crate.
///
/// # Example
///
/// ```ignore
/// use roster::FromRow;
///
/// #[derive(FromRow)]
/// struct MemberName {
///     #[roster(column = "member_id")]
///     id: i64,
///     username: Option<String>,
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> RosterResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning RosterError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> RosterResult<T>
    where
        T: for<'a> FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> RosterResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| RosterError::decode(column, e.to_string()))
    }
}

// Scalar rows (`SELECT COUNT(*)`, `SELECT id`) map from the first column.
macro_rules! scalar_from_row {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromRow for $ty {
                fn from_row(row: &Row) -> RosterResult<Self> {
                    row.try_get(0).map_err(|e| RosterError::decode("0", e.to_string()))
                }
            }
        )*
    };
}

scalar_from_row!(i32, i64, String, bool);
