//! Mapping of sqlx errors onto the domain error types.

use domain::{MatchingError, StoreError};

/// PostgreSQL SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

/// Classify a sqlx error for the store contracts.
pub fn store_error(err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::UniqueViolation(err.to_string());
    }
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

/// Like [`store_error`], but a unique violation is a lost race.
pub fn matching_error(err: sqlx::Error) -> MatchingError {
    match store_error(err) {
        StoreError::UniqueViolation(reason) => MatchingError::ConcurrencyConflict(reason),
        other => MatchingError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(matches!(
            store_error(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            matching_error(sqlx::Error::PoolClosed),
            MatchingError::Store(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_row_not_found_is_backend() {
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            StoreError::Backend(_)
        ));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
