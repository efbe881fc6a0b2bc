//! Unified error handling for Digester Core.
//!
//! This module provides a unified error type that wraps domain, cast and
//! application errors, with user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::{CastError, DomainError};

/// Root error type for Digester Core operations.
#[derive(Debug, Error, Clone)]
pub enum DigesterError {
    /// Invalid mapping declarations.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Conversion orchestration failures.
    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),

    /// A value could not be cast. Recovered per field during conversion.
    #[error("Cast error: {0}")]
    Cast(#[from] CastError),

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl DigesterError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Cast(e) => vec![
                format!("A value could not be converted: {e}"),
                "Check the field type against the input data".into(),
            ],
            Self::Configuration { message } => vec![
                format!("Configuration issue: {message}"),
                "Check your setup and try again".into(),
            ],
            Self::Internal { .. } => vec![
                "This appears to be a bug in Digester".into(),
                "Please report this issue at: https://github.com/cosecruz/digester/issues".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
                crate::domain::ErrorCategory::Internal => ErrorCategory::Internal,
            },
            Self::Application(e) => e.category(),
            Self::Cast(_) => ErrorCategory::Input,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Whether a conversion recovers from this error by skipping the field.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Cast(_))
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Input,
    NotFound,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type DigesterResult<T> = Result<T, DigesterError>;
