//! Core domain layer for Digester.
//!
//! Pure data with no I/O: raw values, mapping rules, record declarations and
//! conversion reports. Parsing of concrete formats is done by adapters through
//! the ports defined in the application layer.

pub mod error;
pub mod record;
pub mod report;
pub mod rule;
pub mod value;

pub use error::{CastError, DomainError, ErrorCategory, FieldError};
pub use record::{FieldKind, Record};
pub use report::{ConversionReport, FieldOutcome, FieldReport};
pub use rule::{DEFAULT_SOURCE, MappingRule, RefType};
pub use value::{HtmlElement, HtmlQuery, HtmlSelection, Mapping, RawValue, Scalar, format_date};
