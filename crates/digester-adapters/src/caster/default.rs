//! Default [`Caster`] backed by `serde_json`, `chrono` and `scraper`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use digester_core::{
    application::ports::Caster,
    domain::{CastError, HtmlSelection, Mapping, RawValue, Scalar, format_date},
};
use tracing::trace;

use crate::html::parse_document;

/// ISO-8601 with milliseconds and a numeric offset, e.g.
/// `2015-08-06T05:43:38.239+0000`. A trailing `Z` is accepted as UTC.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

const DATE_ONLY_FORMAT: &str = "%Y-%m-%d";

/// Stateless caster with a configurable date format.
#[derive(Debug, Clone)]
pub struct DefaultCaster {
    date_format: String,
}

impl DefaultCaster {
    pub fn new() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    /// Use a different `chrono` format string for dates.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Configured format first (with offset, as UTC, or as a date at
    /// midnight), then RFC 3339, then `yyyy-MM-dd` at midnight.
    fn parse_date(&self, text: &str) -> Option<DateTime<Utc>> {
        let text = text.trim();
        let zulu = text
            .strip_suffix('Z')
            .map(|rest| format!("{rest}+0000"))
            .unwrap_or_else(|| text.to_string());

        DateTime::parse_from_str(&zulu, &self.date_format)
            .map(|d| d.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(text, &self.date_format)
                    .ok()
                    .map(|d| d.and_utc())
            })
            .or_else(|| midnight(NaiveDate::parse_from_str(text, &self.date_format).ok()))
            .or_else(|| {
                DateTime::parse_from_rfc3339(text)
                    .ok()
                    .map(|d| d.with_timezone(&Utc))
            })
            .or_else(|| midnight(NaiveDate::parse_from_str(text, DATE_ONLY_FORMAT).ok()))
    }
}

fn midnight(date: Option<NaiveDate>) -> Option<DateTime<Utc>> {
    date?.and_hms_opt(0, 0, 0).map(|d| d.and_utc())
}

impl Default for DefaultCaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Caster for DefaultCaster {
    fn to_map(&self, value: &RawValue) -> Result<Mapping, CastError> {
        match value {
            RawValue::Mapping(map) => Ok(map.clone()),
            RawValue::Scalar(Scalar::Text(text)) => match self.parse_json(text)? {
                RawValue::Mapping(map) => Ok(map),
                other => Err(CastError::Incompatible {
                    expected: "mapping",
                    found: other.kind_name(),
                }),
            },
            other => Err(CastError::Incompatible {
                expected: "mapping",
                found: other.kind_name(),
            }),
        }
    }

    fn to_map_list(&self, value: &RawValue) -> Result<Vec<Mapping>, CastError> {
        match value {
            RawValue::Sequence(items) => items.iter().map(|item| self.to_map(item)).collect(),
            RawValue::Scalar(Scalar::Text(text)) => match self.parse_json(text)? {
                RawValue::Sequence(items) => items.iter().map(|item| self.to_map(item)).collect(),
                RawValue::Mapping(map) => Ok(vec![map]),
                other => Err(CastError::Incompatible {
                    expected: "mapping list",
                    found: other.kind_name(),
                }),
            },
            other => self.to_map(other).map(|map| vec![map]),
        }
    }

    fn to_json(&self, value: &RawValue) -> Result<String, CastError> {
        serde_json::to_string(value).map_err(|e| CastError::InvalidJson {
            reason: e.to_string(),
        })
    }

    fn to_json_pretty(&self, value: &RawValue) -> Result<String, CastError> {
        serde_json::to_string_pretty(value).map_err(|e| CastError::InvalidJson {
            reason: e.to_string(),
        })
    }

    fn parse_json(&self, text: &str) -> Result<RawValue, CastError> {
        serde_json::from_str::<serde_json::Value>(text)
            .map(RawValue::from)
            .map_err(|e| CastError::InvalidJson {
                reason: e.to_string(),
            })
    }

    fn to_date(&self, value: &RawValue) -> Result<DateTime<Utc>, CastError> {
        if let RawValue::Scalar(Scalar::Date(date)) = value {
            return Ok(*date);
        }
        let text = self.to_text(value);
        let parsed = self.parse_date(&text);
        trace!(input = %text, ok = parsed.is_some(), "date parsed");
        parsed.ok_or_else(|| CastError::InvalidDate {
            value: text,
            format: self.date_format.clone(),
        })
    }

    fn to_text(&self, value: &RawValue) -> String {
        match value {
            RawValue::Null => String::new(),
            RawValue::Scalar(Scalar::Text(text)) => text.clone(),
            RawValue::Scalar(Scalar::Date(date)) => format_date(date),
            RawValue::Html(selection) => selection.outer_html(),
            other => other.to_string(),
        }
    }

    fn to_html(&self, value: &RawValue) -> Result<HtmlSelection, CastError> {
        match value {
            RawValue::Html(selection) => Ok(selection.clone()),
            RawValue::Scalar(Scalar::Text(text)) => Ok(parse_document(text)),
            other => Err(CastError::Incompatible {
                expected: "html",
                found: other.kind_name(),
            }),
        }
    }
}
