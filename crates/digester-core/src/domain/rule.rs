//! Mapping rules: how one field is resolved for one named source.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

// ── RefType ──────────────────────────────────────────────────────────────────

/// Resolution strategy of a [`MappingRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    /// Dotted path lookup over the input mapping.
    #[default]
    Normal,
    /// The rule value itself, ignoring the input.
    Hardcode,
    /// The whole input, handed to the field's type.
    PassThrough,
    /// JSON-path query over the canonical JSON of the input.
    JsonPath,
    HtmlId,
    HtmlCss,
    HtmlXpath,
}

impl RefType {
    pub const ALL: [RefType; 7] = [
        Self::Normal,
        Self::Hardcode,
        Self::PassThrough,
        Self::JsonPath,
        Self::HtmlId,
        Self::HtmlCss,
        Self::HtmlXpath,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Hardcode => "hardcode",
            Self::PassThrough => "pass_through",
            Self::JsonPath => "json_path",
            Self::HtmlId => "html_id",
            Self::HtmlCss => "html_css",
            Self::HtmlXpath => "html_xpath",
        }
    }

    pub const fn is_html(&self) -> bool {
        matches!(self, Self::HtmlId | Self::HtmlCss | Self::HtmlXpath)
    }
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefType {
    type Err = DomainError;

    /// Accepts snake, kebab and upper case spellings (`json_path`,
    /// `json-path`, `JSON_PATH`) as well as `passthrough`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "normal" => Ok(Self::Normal),
            "hardcode" | "hardcoded" => Ok(Self::Hardcode),
            "pass_through" | "passthrough" => Ok(Self::PassThrough),
            "json_path" | "jsonpath" => Ok(Self::JsonPath),
            "html_id" => Ok(Self::HtmlId),
            "html_css" => Ok(Self::HtmlCss),
            "html_xpath" => Ok(Self::HtmlXpath),
            _ => Err(DomainError::InvalidRefType {
                value: s.to_string(),
            }),
        }
    }
}

// ── MappingRule ──────────────────────────────────────────────────────────────

/// Source name of rules declared without one.
pub const DEFAULT_SOURCE: &str = "";

/// One way of resolving a field, active only for the named source.
///
/// Rules are immutable once built. The `html_text` and `trim` flags default
/// to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRule {
    source: String,
    ref_type: RefType,
    value: String,
    html_text: bool,
    trim: bool,
}

impl MappingRule {
    pub fn new(source: impl Into<String>, ref_type: RefType, value: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ref_type,
            value: value.into(),
            html_text: true,
            trim: true,
        }
    }

    pub fn normal(source: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(source, RefType::Normal, path)
    }

    pub fn hardcode(source: impl Into<String>, literal: impl Into<String>) -> Self {
        Self::new(source, RefType::Hardcode, literal)
    }

    pub fn pass_through(source: impl Into<String>) -> Self {
        Self::new(source, RefType::PassThrough, "")
    }

    pub fn json_path(source: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(source, RefType::JsonPath, expression)
    }

    pub fn html_id(source: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(source, RefType::HtmlId, id)
    }

    pub fn html_css(source: impl Into<String>, selector: impl Into<String>) -> Self {
        Self::new(source, RefType::HtmlCss, selector)
    }

    pub fn html_xpath(source: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(source, RefType::HtmlXpath, expression)
    }

    /// Return the matched HTML node instead of its text.
    pub fn with_html_text(mut self, html_text: bool) -> Self {
        self.html_text = html_text;
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ref_type(&self) -> RefType {
        self.ref_type
    }

    /// Path, query, selector or literal, depending on the strategy.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn html_text(&self) -> bool {
        self.html_text
    }

    pub fn trim(&self) -> bool {
        self.trim
    }

    /// Source names compare case-insensitively.
    pub fn matches_source(&self, source: &str) -> bool {
        self.source == source || self.source.to_lowercase() == source.to_lowercase()
    }
}

impl fmt::Display for MappingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {:?}", self.source, self.ref_type, self.value)?;
        if !self.html_text {
            f.write_str(" (node)")?;
        }
        if !self.trim {
            f.write_str(" (untrimmed)")?;
        }
        Ok(())
    }
}
