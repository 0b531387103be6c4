//! Errors returned by the library.

use std::time::Duration;
use thiserror::Error;

pub type RosterResult<T> = Result<T, RosterError>;

#[derive(Debug, Error)]
pub enum RosterError {
    /// The database URL could not be parsed or the server was unreachable.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// A statement that must yield a row yielded none.
    #[error("Not found: {0}")]
    NotFound(String),

    /// SQLSTATE 23505.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// SQLSTATE 23503, e.g. a member pointing at a team that does not exist.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// SQLSTATE 23514.
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// Rejected input: page size, sort key, empty SET, pool size.
    #[error("Validation error: {0}")]
    Validation(String),

    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    #[cfg(feature = "migrate")]
    #[error("Migration error: {0}")]
    Migration(String),

    #[error("{0}")]
    Other(String),
}

impl RosterError {
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, Self::ForeignKeyViolation(_))
    }

    /// Classify a driver error by SQLSTATE; constraint failures get their own
    /// variant carrying `constraint: message`, the rest stay `Query`.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        let Some(db) = err.as_db_error() else {
            return Self::Query(err);
        };
        let detail = format!("{}: {}", db.constraint().unwrap_or("unknown"), db.message());
        let constraint: Option<fn(String) -> Self> = match db.code().code() {
            "23505" => Some(Self::UniqueViolation),
            "23503" => Some(Self::ForeignKeyViolation),
            "23514" => Some(Self::CheckViolation),
            _ => None,
        };
        match constraint {
            Some(variant) => variant(detail),
            None => Self::Query(err),
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for RosterError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(feature = "migrate")]
impl From<refinery::Error> for RosterError {
    fn from(err: refinery::Error) -> Self {
        Self::Migration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_classified() {
        let err = RosterError::not_found("member 7");
        assert!(err.is_not_found());
        assert!(!err.is_foreign_key_violation());
        assert_eq!(err.to_string(), "Not found: member 7");
    }

    #[test]
    fn decode_message_names_the_column() {
        let err = RosterError::decode("age", "unexpected null");
        assert_eq!(err.to_string(), "Decode error on column 'age': unexpected null");
    }
}
