//! Validation of user-supplied names that end up in output file paths.

/// Longest accepted output prefix; category and extension suffixes are appended to it
pub const MAX_PREFIX_LENGTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Empty name provided")]
    Empty,
    #[error("Name too long: exceeds {MAX_PREFIX_LENGTH} characters")]
    TooLong,
    #[error("Name contains a path separator")]
    PathSeparator,
    #[error("Name contains a parent directory reference")]
    ParentReference,
    #[error("Name contains control characters")]
    ControlCharacter,
}

/// Check that an output prefix is a single plain file-name component.
///
/// The prefix is used verbatim in every output file name, so it must not be
/// able to point outside the output directory.
///
/// # Errors
///
/// Returns a `ValidationError` naming the first rule the prefix breaks.
///
/// # Examples
///
/// ```
/// use barcode_seqkit::utils::validation::validate_output_prefix;
///
/// assert!(validate_output_prefix("sample_01").is_ok());
/// assert!(validate_output_prefix("../sample").is_err());
/// ```
pub fn validate_output_prefix(prefix: &str) -> Result<(), ValidationError> {
    if prefix.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    if prefix.len() > MAX_PREFIX_LENGTH {
        return Err(ValidationError::TooLong);
    }

    if prefix.contains('/') || prefix.contains('\\') {
        return Err(ValidationError::PathSeparator);
    }

    if prefix.contains("..") {
        return Err(ValidationError::ParentReference);
    }

    if prefix.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacter);
    }

    Ok(())
}
