//! Application layer errors.
//!
//! These errors represent failures while running a conversion, not invalid
//! declarations. Declaration errors are `DomainError` from `crate::domain`.

use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during conversion orchestration.
///
/// Unlike per-field cast failures, these abort the conversion.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// The target object could not be created.
    #[error("Cannot construct '{target}': {reason}")]
    ConstructionFailed { target: String, reason: String },

    /// A JSON-path expression could not be parsed or evaluated.
    #[error("JSON query '{expression}' failed: {reason}")]
    QueryFailed { expression: String, reason: String },

    /// An HTML selector could not be parsed or evaluated.
    #[error("HTML selector '{selector}' failed: {reason}")]
    SelectorFailed { selector: String, reason: String },

    /// The input stream could not be read.
    #[error("Failed to read input: {reason}")]
    ReadFailed { reason: String },

    /// Registry access failed (lock poisoned).
    #[error("Mapping registry error")]
    RegistryLockError,
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ConstructionFailed { target, .. } => vec![
                format!("Check that '{target}' is declared"),
                "Try: digester inspect --mapping <path> to list entities".into(),
            ],
            Self::QueryFailed { expression, .. } => vec![
                format!("Check the JSON-path expression: {expression}"),
                "Expressions start at the root, e.g. $.person.name".into(),
            ],
            Self::SelectorFailed { selector, .. } => vec![
                format!("Check the selector: {selector}"),
                "CSS selectors and simple XPath (//p[@class='x']) are supported".into(),
            ],
            Self::ReadFailed { .. } => vec![
                "Check that the input exists and is UTF-8 encoded".into(),
            ],
            Self::RegistryLockError => vec![
                "The mapping registry is unusable after a panic".into(),
                "Create a new digester".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConstructionFailed { .. } => ErrorCategory::NotFound,
            Self::QueryFailed { .. } | Self::SelectorFailed { .. } => ErrorCategory::Validation,
            Self::ReadFailed { .. } => ErrorCategory::Input,
            Self::RegistryLockError => ErrorCategory::Internal,
        }
    }
}
