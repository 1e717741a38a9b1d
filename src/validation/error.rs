//! Categorized validation errors.
//!
//! Every error leaving the validation path carries exactly one category.
//! The category is assigned once, as deep in the call chain as the cause is
//! understood, and [`classify`] never overwrites it.

use std::error::Error as StdError;
use std::fmt;

/// Boxed cause carried by a [`ValidationError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Input could not be decoded into the target shape.
pub const JSON_PARSE: &str = "json-parse";

/// Input decoded but one or more field constraints failed.
pub const VALIDATE: &str = "validate";

/// A failure with a short category tag describing its root cause.
#[derive(Debug)]
pub struct ValidationError {
    category: String,
    cause: BoxError,
}

impl ValidationError {
    /// Wrap `cause` under an explicit category.
    pub fn new(category: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            category: category.into(),
            cause: cause.into(),
        }
    }

    /// Decode failure.
    pub fn json_parse(cause: impl Into<BoxError>) -> Self {
        Self::new(JSON_PARSE, cause)
    }

    /// Constraint failure.
    pub fn validate(cause: impl Into<BoxError>) -> Self {
        Self::new(VALIDATE, cause)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    pub fn is_json_parse(&self) -> bool {
        self.category == JSON_PARSE
    }

    pub fn is_validate(&self) -> bool {
        self.category == VALIDATE
    }

    /// Client-facing message (the cause, without the category prefix).
    pub fn message(&self) -> String {
        self.cause.to_string()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.cause)
    }
}

impl StdError for ValidationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.cause.as_ref())
    }
}

/// Attach a category to an arbitrary error.
///
/// A `ValidationError` that already has a non-empty category is returned
/// as-is; everything else is tagged [`VALIDATE`].
pub fn classify(err: BoxError) -> ValidationError {
    match err.downcast::<ValidationError>() {
        Ok(categorized) if !categorized.category.is_empty() => *categorized,
        Ok(mut uncategorized) => {
            uncategorized.category = VALIDATE.to_string();
            *uncategorized
        }
        Err(other) => ValidationError::validate(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_error_gets_validate_category() {
        let err = classify("field is broken".into());
        assert_eq!(err.category(), VALIDATE);
        assert_eq!(err.message(), "field is broken");
    }

    #[test]
    fn test_existing_category_is_kept() {
        let inner = ValidationError::json_parse("unexpected end of input");
        let err = classify(Box::new(inner));
        assert!(err.is_json_parse());
        assert_eq!(err.message(), "unexpected end of input");

        let custom = ValidationError::new("quota", "too many alarms");
        assert_eq!(classify(Box::new(custom)).category(), "quota");
    }

    #[test]
    fn test_empty_category_is_filled() {
        let err = classify(Box::new(ValidationError::new("", "oops")));
        assert!(err.is_validate());
    }

    #[test]
    fn test_display_includes_category() {
        let err = ValidationError::validate("service: non zero value required");
        assert_eq!(err.to_string(), "validate: service: non zero value required");
    }
}
