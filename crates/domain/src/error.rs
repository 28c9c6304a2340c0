//! Domain error taxonomy.

use thiserror::Error;

/// Failures surfaced by program operations.
///
/// Aggregation never fails on missing data; empty statistics are a valid result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not a member: {0}")]
    NotAMember(String),

    /// Reserved for multi-editor merge conflicts.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn program_not_found() -> Self {
        DomainError::NotFound("Program not found".to_string())
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |err| {
                    format!(
                        "{}: {}",
                        field,
                        err.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| err.code.to_string())
                    )
                })
            })
            .collect();
        messages.sort();
        DomainError::Validation(messages.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DomainError::NotAMember("x".to_string()).to_string(),
            "Not a member: x"
        );
        assert_eq!(
            DomainError::program_not_found().to_string(),
            "Not found: Program not found"
        );
    }

    #[test]
    fn test_from_validation_errors() {
        let errors = Named {
            name: String::new(),
        }
        .validate()
        .unwrap_err();
        let err: DomainError = errors.into();
        assert_eq!(
            err,
            DomainError::Validation("name: Name is required".to_string())
        );
    }
}
