// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// Raised while declaring mappings. All errors are:
/// - Cloneable
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Declaration Errors
    // ========================================================================
    #[error("Unknown reference type '{value}'")]
    InvalidRefType { value: String },

    #[error("Unknown field kind '{value}'")]
    InvalidFieldKind { value: String },

    #[error("Entity '{entity}' declares a field with an empty name")]
    EmptyFieldName { entity: String },

    #[error("Entity '{entity}' declares field '{field}' more than once")]
    DuplicateField { entity: String, field: String },

    #[error("Entity name must not be empty")]
    EmptyEntityName,

    // ========================================================================
    // Mapping Files
    // ========================================================================
    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    #[error("Entity '{0}' is not declared")]
    UnknownEntity(String),
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidRefType { .. } => vec![
                "Valid reference types:".into(),
                "  • normal, hardcode, pass_through, json_path".into(),
                "  • html_id, html_css, html_xpath".into(),
            ],
            Self::InvalidFieldKind { .. } => vec![
                "Valid field kinds: text, integer, float, boolean, date, json".into(),
                "Nested records: entity:<name> or entities:<name>".into(),
            ],
            Self::DuplicateField { field, .. } => vec![
                format!("Merge the rules of '{field}' into a single field"),
                "Rules for different sources belong to the same field".into(),
            ],
            Self::UnknownEntity(name) => vec![
                format!("Declare an entity named '{name}' in a mapping file"),
                "Try: digester inspect --mapping <path>".into(),
            ],
            Self::InvalidMapping(msg) => vec![
                "Check the mapping file syntax".into(),
                format!("Details: {msg}"),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownEntity(_) => ErrorCategory::NotFound,
            _ => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Internal,
}

// ============================================================================
// Per-field failures
// ============================================================================

/// A raw value could not be coerced into the requested type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CastError {
    #[error("'{value}' is not numeric")]
    NotNumeric { value: String },

    #[error("'{value}' does not fit in {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("'{value}' is not a date in format '{format}'")]
    InvalidDate { value: String, format: String },

    #[error("invalid JSON: {reason}")]
    InvalidJson { reason: String },

    #[error("cannot cast {found} to {expected}")]
    Incompatible {
        expected: &'static str,
        found: &'static str,
    },
}

/// Why a single field was left at its default.
///
/// Field errors are recovered: they are logged and recorded in the
/// conversion report, and conversion continues with the next field.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    #[error(transparent)]
    Cast(#[from] CastError),

    #[error("setter rejected value: {reason}")]
    Setter { reason: String },
}
