//! Helpers for turning Postgres constraint failures into domain errors.

use anyhow::anyhow;

use roombook_core::AppError;

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Maps a unique violation to `Conflict` with `message`; anything else is
/// an infrastructure failure.
pub fn unique_violation_as_conflict(err: sqlx::Error, message: &'static str) -> AppError {
    if is_unique_violation(&err) {
        return AppError::conflict(anyhow!(message));
    }
    AppError::database(err)
}

/// Maps a foreign key violation to `NotFound` with `message`, for inserts
/// whose referenced row vanished after it was checked.
pub fn foreign_key_violation_as_not_found(err: sqlx::Error, message: &'static str) -> AppError {
    if is_foreign_key_violation(&err) {
        return AppError::not_found(anyhow!(message));
    }
    AppError::database(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roombook_core::ErrorKind;

    #[test]
    fn test_non_database_errors_stay_internal() {
        let err = unique_violation_as_conflict(sqlx::Error::RowNotFound, "dup");
        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_foreign_key_violation(&sqlx::Error::PoolClosed));

        let err = foreign_key_violation_as_not_found(sqlx::Error::PoolClosed, "gone");
        assert_eq!(err.kind, ErrorKind::Internal);
    }
}
