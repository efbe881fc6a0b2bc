//! Minimal in-crate caster for unit tests.
//!
//! Adapters provide the real implementation; this one only needs to be
//! faithful enough for the engine's own tests.

use chrono::{DateTime, NaiveDate, Utc};

use crate::application::ports::Caster;
use crate::domain::{
    CastError, HtmlElement, HtmlSelection, Mapping, RawValue, Scalar, format_date,
};

pub struct StubCaster;

impl Caster for StubCaster {
    fn to_map(&self, value: &RawValue) -> Result<Mapping, CastError> {
        match value {
            RawValue::Mapping(m) => Ok(m.clone()),
            RawValue::Scalar(Scalar::Text(s)) => match self.parse_json(s)? {
                RawValue::Mapping(m) => Ok(m),
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
            RawValue::Sequence(items) => items.iter().map(|i| self.to_map(i)).collect(),
            RawValue::Scalar(Scalar::Text(s)) => match self.parse_json(s)? {
                RawValue::Sequence(items) => items.iter().map(|i| self.to_map(i)).collect(),
                other => self.to_map(&other).map(|m| vec![m]),
            },
            other => self.to_map(other).map(|m| vec![m]),
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
        serde_json::from_str(text).map_err(|e| CastError::InvalidJson {
            reason: e.to_string(),
        })
    }

    fn to_date(&self, value: &RawValue) -> Result<DateTime<Utc>, CastError> {
        let text = self.to_text(value);
        DateTime::parse_from_rfc3339(&text)
            .map(|d| d.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                    .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
            })
            .map_err(|_| CastError::InvalidDate {
                value: text,
                format: "rfc3339".into(),
            })
    }

    fn to_text(&self, value: &RawValue) -> String {
        match value {
            RawValue::Null => String::new(),
            RawValue::Scalar(Scalar::Date(d)) => format_date(d),
            RawValue::Html(h) => h.outer_html(),
            other => other.to_string(),
        }
    }

    fn to_html(&self, value: &RawValue) -> Result<HtmlSelection, CastError> {
        match value {
            RawValue::Html(h) => Ok(h.clone()),
            RawValue::Scalar(Scalar::Text(s)) => Ok(HtmlSelection::single(HtmlElement {
                tag: "html".into(),
                id: None,
                text: s.clone(),
                html: s.clone(),
            })),
            other => Err(CastError::Incompatible {
                expected: "html",
                found: other.kind_name(),
            }),
        }
    }
}
