//! Validation of user-supplied names that end up in output paths.

/// Longest accepted batch identifier, in bytes
pub const MAX_BATCH_ID_LENGTH: usize = 255;

/// Batch identifier validation error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Batch ID is required and cannot be empty")]
    EmptyBatchId,
    #[error("Batch ID too long: exceeds {MAX_BATCH_ID_LENGTH} bytes")]
    BatchIdTooLong,
    #[error("Invalid batch ID '{0}': contains path separators or '..'")]
    PathInBatchId(String),
    #[error("Invalid batch ID: contains control characters")]
    ControlCharacters,
}

/// Validate the batch identifier used to name every output file.
///
/// The identifier becomes a file name prefix, so it must not be able to
/// point outside the output directory.
///
/// # Examples
///
/// ```
/// use prephix::utils::validation::validate_batch_id;
///
/// assert!(validate_batch_id("run_2024-03").is_ok());
/// assert!(validate_batch_id("../escape").is_err());
/// ```
///
/// # Errors
///
/// Returns `ValidationError::EmptyBatchId` if the identifier is blank,
/// `ValidationError::BatchIdTooLong` if it exceeds the limit,
/// `ValidationError::PathInBatchId` if it contains a separator or `..`, or
/// `ValidationError::ControlCharacters` for control characters.
pub fn validate_batch_id(batch_id: &str) -> Result<&str, ValidationError> {
    if batch_id.trim().is_empty() {
        return Err(ValidationError::EmptyBatchId);
    }

    if batch_id.len() > MAX_BATCH_ID_LENGTH {
        return Err(ValidationError::BatchIdTooLong);
    }

    if batch_id.contains("..") || batch_id.contains('/') || batch_id.contains('\\') {
        return Err(ValidationError::PathInBatchId(batch_id.to_string()));
    }

    if batch_id.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacters);
    }

    Ok(batch_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_batch_id_safe() {
        assert_eq!(validate_batch_id("batch1"), Ok("batch1"));
        assert!(validate_batch_id("my-run.2024").is_ok());
        assert!(validate_batch_id("Salmonella run 7").is_ok());
    }

    #[test]
    fn test_validate_batch_id_dangerous() {
        assert_eq!(validate_batch_id(""), Err(ValidationError::EmptyBatchId));
        assert_eq!(validate_batch_id("   "), Err(ValidationError::EmptyBatchId));

        assert!(matches!(
            validate_batch_id("../etc/passwd"),
            Err(ValidationError::PathInBatchId(_))
        ));
        assert!(matches!(
            validate_batch_id("a\\b"),
            Err(ValidationError::PathInBatchId(_))
        ));
        assert!(matches!(
            validate_batch_id("run..1"),
            Err(ValidationError::PathInBatchId(_))
        ));

        assert_eq!(
            validate_batch_id("run\x01"),
            Err(ValidationError::ControlCharacters)
        );
        assert_eq!(
            validate_batch_id("run\0"),
            Err(ValidationError::ControlCharacters)
        );

        let long_name = "a".repeat(300);
        assert_eq!(
            validate_batch_id(&long_name),
            Err(ValidationError::BatchIdTooLong)
        );
    }
}
