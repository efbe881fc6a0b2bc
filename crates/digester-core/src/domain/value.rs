//! Raw values: the untyped intermediate form of everything the engine reads.
//!
//! Inputs are converted into a [`RawValue`] once, strategies resolve into
//! [`RawValue`]s, and the caster turns them into field types. Raw values are
//! never persisted.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key/value level of a raw document.
pub type Mapping = BTreeMap<String, RawValue>;

/// Untyped value produced by parsing input or resolving a rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    #[default]
    Null,
    Scalar(Scalar),
    Sequence(Vec<RawValue>),
    Mapping(Mapping),
    /// Parsed HTML: a document root or the elements matched by a selector.
    Html(HtmlSelection),
}

/// Leaf values.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(DateTime<Utc>),
}

impl RawValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Text(value.into()))
    }

    /// Build a mapping from `(key, value)` pairs.
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<RawValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Short name of the variant, used in cast error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Scalar(Scalar::Bool(_)) => "bool",
            Self::Scalar(Scalar::Int(_)) => "integer",
            Self::Scalar(Scalar::Float(_)) => "float",
            Self::Scalar(Scalar::Text(_)) => "text",
            Self::Scalar(Scalar::Date(_)) => "date",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
            Self::Html(_) => "html",
        }
    }

    /// Trim surrounding whitespace of a text value in place.
    pub fn trim_text(self) -> Self {
        match self {
            Self::Scalar(Scalar::Text(s)) => {
                let trimmed = s.trim();
                if trimmed.len() == s.len() {
                    Self::Scalar(Scalar::Text(s))
                } else {
                    Self::text(trimmed)
                }
            }
            other => other,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Scalar(s) => fmt::Display::fmt(s, f),
            Self::Html(h) => f.write_str(&h.outer_html()),
            other => match serde_json::to_string(other) {
                Ok(json) => f.write_str(&json),
                Err(_) => f.write_str(other.kind_name()),
            },
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => f.write_str(&format_date(d)),
        }
    }
}

/// Canonical text form of a date: RFC 3339 with milliseconds, UTC as `Z`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ── Conversions ──────────────────────────────────────────────────────────────

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Int(value))
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        Self::Scalar(Scalar::Int(i64::from(value)))
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Float(value))
    }
}

impl From<DateTime<Utc>> for RawValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Scalar(Scalar::Date(value))
    }
}

impl From<Mapping> for RawValue {
    fn from(value: Mapping) -> Self {
        Self::Mapping(value)
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(value: Vec<RawValue>) -> Self {
        Self::Sequence(value)
    }
}

impl From<HtmlSelection> for RawValue {
    fn from(value: HtmlSelection) -> Self {
        Self::Html(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Scalar(Scalar::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Scalar(Scalar::Int(i)),
                None => Self::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => Self::text(s),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

// ── Serde ────────────────────────────────────────────────────────────────────

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Scalar(scalar) => scalar.serialize(serializer),
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Self::Html(selection) => serializer.serialize_str(&selection.outer_html()),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Date(d) => serializer.serialize_str(&format_date(d)),
        }
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

// ── HTML ─────────────────────────────────────────────────────────────────────

/// Snapshot of one parsed HTML element.
///
/// Elements are detached from the parser's tree so that raw values stay
/// `Send` and cheap to clone; selectors re-parse `html` when they need to
/// descend into an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    pub tag: String,
    pub id: Option<String>,
    /// Whitespace-normalized text content.
    pub text: String,
    /// Outer HTML.
    pub html: String,
}

/// Ordered set of HTML elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HtmlSelection(Vec<HtmlElement>);

impl HtmlSelection {
    pub fn new(elements: Vec<HtmlElement>) -> Self {
        Self(elements)
    }

    pub fn single(element: HtmlElement) -> Self {
        Self(vec![element])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> Option<&HtmlElement> {
        self.0.first()
    }

    pub fn elements(&self) -> &[HtmlElement] {
        &self.0
    }

    /// Combined text of all elements, separated by single spaces.
    pub fn text(&self) -> String {
        self.0
            .iter()
            .map(|e| e.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Outer HTML of all elements, one per line.
    pub fn outer_html(&self) -> String {
        self.0
            .iter()
            .map(|e| e.html.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl IntoIterator for HtmlSelection {
    type Item = HtmlElement;
    type IntoIter = std::vec::IntoIter<HtmlElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// How an HTML strategy locates elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlQuery {
    Id(String),
    Css(String),
    XPath(String),
}

impl HtmlQuery {
    pub fn expression(&self) -> &str {
        match self {
            Self::Id(e) | Self::Css(e) | Self::XPath(e) => e,
        }
    }
}

impl fmt::Display for HtmlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Css(css) => write!(f, "css:{css}"),
            Self::XPath(xpath) => write!(f, "xpath:{xpath}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn element(tag: &str, text: &str) -> HtmlElement {
        HtmlElement {
            tag: tag.into(),
            id: None,
            text: text.into(),
            html: format!("<{tag}>{text}</{tag}>"),
        }
    }

    #[test]
    fn json_numbers_keep_integer_precision() {
        let value = RawValue::from(serde_json::json!({"age": 24, "height": 1.8}));
        let map = value.as_mapping().unwrap();
        assert_eq!(map["age"], RawValue::Scalar(Scalar::Int(24)));
        assert_eq!(map["height"], RawValue::Scalar(Scalar::Float(1.8)));
    }

    #[test]
    fn serializes_dates_with_millis_and_zulu() {
        let date = Utc.with_ymd_and_hms(2015, 8, 6, 5, 43, 38).unwrap();
        let json = serde_json::to_string(&RawValue::from(date)).unwrap();
        assert_eq!(json, "\"2015-08-06T05:43:38.000Z\"");
    }

    #[test]
    fn serializes_html_as_outer_markup() {
        let value = RawValue::Html(HtmlSelection::single(element("p", "Bruno")));
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"<p>Bruno</p>\"");
    }

    #[test]
    fn selection_text_skips_empty_elements() {
        let selection = HtmlSelection::new(vec![
            element("span", "Palo"),
            element("span", ""),
            element("span", "Alto"),
        ]);
        assert_eq!(selection.text(), "Palo Alto");
    }

    #[test]
    fn trim_text_leaves_other_values_alone() {
        assert_eq!(RawValue::text("  Bruno ").trim_text(), RawValue::text("Bruno"));
        assert_eq!(RawValue::from(3i64).trim_text(), RawValue::from(3i64));
    }

    #[test]
    fn deserializes_from_json_text() {
        let value: RawValue = serde_json::from_str(r#"[{"a": null}, "x"]"#).unwrap();
        assert_eq!(
            value,
            RawValue::Sequence(vec![
                RawValue::mapping([("a", RawValue::Null)]),
                RawValue::text("x"),
            ])
        );
    }
}
