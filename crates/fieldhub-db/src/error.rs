//! Database errors

use thiserror::Error;

/// SQLSTATE raised by exclusion constraints
const EXCLUSION_VIOLATION: &str = "23P01";

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// An exclusion constraint rejected overlapping active periods; the
    /// write lost a race and may be retried by the caller
    #[error("active periods overlap")]
    ActivePeriodOverlap,

    /// A stored value failed to decode into its domain type
    #[error("invalid stored value: {0}")]
    Decode(#[from] fieldhub_types::InvalidChoice),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some(EXCLUSION_VIOLATION) {
                return Self::ActivePeriodOverlap;
            }
        }
        Self::Sqlx(err)
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
