//! Mapping of database errors into the domain taxonomy.

use domain::DomainError;

/// Converts a sqlx error into a domain error.
///
/// `RowNotFound` becomes `NotFound`; everything else is a storage failure and
/// is logged here because the message is hidden from API callers.
pub fn into_domain(err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::RowNotFound => DomainError::NotFound("Record not found".to_string()),
        other => {
            tracing::error!(error = %other, "Database error");
            DomainError::Storage(other.to_string())
        }
    }
}
