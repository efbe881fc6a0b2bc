//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the conversion engine needs from parsing
//! backends. The `digester-adapters` crate provides implementations.

use chrono::{DateTime, Utc};

use crate::domain::{CastError, HtmlQuery, HtmlSelection, Mapping, RawValue};
use crate::error::DigesterResult;

/// Port for value coercion between raw shapes.
///
/// Implemented by:
/// - `digester_adapters::caster::DefaultCaster` (serde_json + chrono + scraper)
///
/// Every method is a pure function of its input; failures are
/// [`CastError`]s, which the engine records per field and recovers from.
pub trait Caster: Send + Sync {
    /// Coerce a value into a single key/value level.
    ///
    /// Mappings are returned as-is; text holding a JSON object is parsed.
    fn to_map(&self, value: &RawValue) -> Result<Mapping, CastError>;

    /// Coerce a value into a list of key/value levels.
    ///
    /// Text holding a JSON array yields one mapping per element.
    fn to_map_list(&self, value: &RawValue) -> Result<Vec<Mapping>, CastError>;

    /// Canonical compact JSON text of a value.
    fn to_json(&self, value: &RawValue) -> Result<String, CastError>;

    /// Indented JSON text of a value.
    fn to_json_pretty(&self, value: &RawValue) -> Result<String, CastError>;

    /// Parse JSON text into a raw value.
    fn parse_json(&self, text: &str) -> Result<RawValue, CastError>;

    /// Coerce a value into a UTC timestamp using the configured date format.
    fn to_date(&self, value: &RawValue) -> Result<DateTime<Utc>, CastError>;

    /// String form of any value.
    fn to_text(&self, value: &RawValue) -> String;

    /// Coerce a value into an HTML tree, parsing text as a document.
    fn to_html(&self, value: &RawValue) -> Result<HtmlSelection, CastError>;
}

/// Port for JSON-path evaluation.
///
/// Implemented by:
/// - `digester_adapters::query::JsonPathQuery` (serde_json_path)
#[cfg_attr(test, mockall::automock)]
pub trait JsonQuery: Send + Sync {
    /// Evaluate `expression` against the JSON document `json`.
    ///
    /// A definite path yields its single value (or null when missing); an
    /// indefinite path yields a sequence of every match.
    fn query(&self, json: &str, expression: &str) -> DigesterResult<RawValue>;
}

/// Port for HTML element selection.
///
/// Implemented by:
/// - `digester_adapters::html::ScraperSelector` (scraper)
#[cfg_attr(test, mockall::automock)]
pub trait HtmlSelector: Send + Sync {
    /// Select elements below every element of `root`, in document order.
    fn select(&self, root: &HtmlSelection, query: &HtmlQuery) -> DigesterResult<HtmlSelection>;
}
