//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic decoding: required fields,
//! numeric ranges, length bounds. Validation is a pure function from a
//! decoded schema value to a list of violations, and it reports *every*
//! violation, not just the first one.

use std::fmt;

/// A single validation violation, tied to the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Declarative constraints a configuration schema enforces on itself.
///
/// Implementations push one [`ValidationError`] per violated constraint and
/// never short-circuit. An empty vector means the value is accepted.
pub trait Validate {
    fn validate(&self) -> Vec<ValidationError>;
}

/// Render all violations into one descriptive line.
pub fn format_violations(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Push a violation unless `value` is non-empty.
pub fn require_non_empty(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(field, "must not be empty"));
    }
}

/// Push a violation unless `min <= value <= max`.
pub fn require_range<T: PartialOrd + fmt::Display + Copy>(
    errors: &mut Vec<ValidationError>,
    field: &str,
    value: T,
    min: T,
    max: T,
) {
    if value < min || value > max {
        errors.push(ValidationError::new(
            field,
            format!("must be between {min} and {max}, got {value}"),
        ));
    }
}

/// Push a violation unless `value` has at most `max` characters.
pub fn require_max_len(errors: &mut Vec<ValidationError>, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(ValidationError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        token: String,
        workers: u32,
    }

    impl Validate for Sample {
        fn validate(&self) -> Vec<ValidationError> {
            let mut errors = Vec::new();
            require_non_empty(&mut errors, "token", &self.token);
            require_range(&mut errors, "workers", self.workers, 1, 64);
            errors
        }
    }

    #[test]
    fn test_collects_all_violations() {
        let sample = Sample {
            token: "".into(),
            workers: 0,
        };
        let errors = sample.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "token");
        assert_eq!(errors[1].field, "workers");
    }

    #[test]
    fn test_valid_value_passes() {
        let sample = Sample {
            token: "abc".into(),
            workers: 8,
        };
        assert!(sample.validate().is_empty());
    }

    #[test]
    fn test_format_violations_joins_errors() {
        let errors = vec![
            ValidationError::new("a", "must not be empty"),
            ValidationError::new("b", "must be between 1 and 9, got 0"),
        ];
        let line = format_violations(&errors);
        assert!(line.contains("a: must not be empty"));
        assert!(line.contains(", b: "));
    }
}
