//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of a program name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of a program description or entry notes.
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Validates that a string contains something other than whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be empty".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates that a measurement is a finite, non-negative number.
pub fn validate_non_negative(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Value must be a non-negative number".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Leg day").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   \t").is_err());
    }

    #[test]
    fn test_validate_not_blank_error_message() {
        let err = validate_not_blank(" ").unwrap_err();
        assert_eq!(err.code, "blank");
        assert_eq!(
            err.message.unwrap().to_string(),
            "Value must not be empty"
        );
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative(0.0).is_ok());
        assert!(validate_non_negative(42.5).is_ok());
        assert!(validate_non_negative(-0.1).is_err());
        assert!(validate_non_negative(f64::NAN).is_err());
        assert!(validate_non_negative(f64::INFINITY).is_err());
    }
}
