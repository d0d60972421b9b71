//! Input Validation
//!
//! Checks what the learner typed before anything is appended or sent:
//! blank input, oversized input and control characters are rejected. When in
//! doubt, reject.

use serde::{Deserialize, Serialize};

/// Default maximum message length in characters
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 4000;

/// Limits applied to learner input
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLimits {
    /// Maximum message length in characters
    pub max_input_length: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
        }
    }
}

/// Result of input validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationResult {
    /// Input is valid
    Valid,
    /// Input is empty or whitespace only
    Empty,
    /// Input is invalid with reason
    Invalid(String),
}

impl ValidationResult {
    /// Check if the result indicates valid input
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Get the error message if invalid
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Empty => Some("Message is empty"),
            Self::Invalid(msg) => Some(msg),
        }
    }
}

/// Validator for learner messages
#[derive(Clone, Debug, Default)]
pub struct InputValidator {
    limits: InputLimits,
}

impl InputValidator {
    /// Create a validator with the given limits
    #[must_use]
    pub fn new(limits: InputLimits) -> Self {
        Self { limits }
    }

    /// Validate a learner message
    #[must_use]
    pub fn validate_message(&self, content: &str) -> ValidationResult {
        if content.trim().is_empty() {
            return ValidationResult::Empty;
        }

        let length = content.chars().count();
        if length > self.limits.max_input_length {
            return ValidationResult::Invalid(format!(
                "Message too long: {length} characters (max: {})",
                self.limits.max_input_length
            ));
        }

        // Newline, tab and carriage return are fine
        if content
            .chars()
            .any(|c| c.is_control() && c != '\n' && c != '\t' && c != '\r')
        {
            return ValidationResult::Invalid(
                "Message contains invalid control characters".to_string(),
            );
        }

        ValidationResult::Valid
    }

    /// Configured limits
    #[must_use]
    pub fn limits(&self) -> &InputLimits {
        &self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_message() {
        let validator = InputValidator::default();
        assert!(validator.validate_message("日本語を勉強しています").is_valid());
        assert!(validator.validate_message("一行目\n二行目\tタブ").is_valid());
    }

    #[test]
    fn test_empty_and_whitespace() {
        let validator = InputValidator::default();
        assert_eq!(validator.validate_message(""), ValidationResult::Empty);
        assert_eq!(validator.validate_message(" \n\t　"), ValidationResult::Empty);
    }

    #[test]
    fn test_length_counts_characters() {
        let validator = InputValidator::new(InputLimits {
            max_input_length: 3,
        });
        assert!(validator.validate_message("日本語").is_valid());
        let result = validator.validate_message("日本語だ");
        assert!(result.error_message().unwrap().contains("too long"));
    }

    #[test]
    fn test_control_characters() {
        let validator = InputValidator::default();
        let result = validator.validate_message("Hello\x00world");
        assert!(!result.is_valid());
        assert!(result.error_message().unwrap().contains("control"));
    }
}
