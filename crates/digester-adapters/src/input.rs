//! Input readers: turn file or stream contents into a [`RawValue`].
//!
//! | Format | Result |
//! |---|---|
//! | `json` | mappings, sequences and scalars |
//! | `html` | an HTML value holding the document root |
//! | `properties` | a mapping, dotted keys expanded into nested mappings |
//! | `text` | the raw text, re-parsed per rule by the engine |

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use digester_core::{
    application::{ApplicationError, ports::Caster},
    domain::{DomainError, Mapping, RawValue},
    error::DigesterResult,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::html::parse_document;

/// How input text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Pick by file extension, then by content.
    #[default]
    Auto,
    Json,
    Html,
    Properties,
    Text,
}

impl InputFormat {
    pub const ALL: [InputFormat; 5] = [
        Self::Auto,
        Self::Json,
        Self::Html,
        Self::Properties,
        Self::Text,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Json => "json",
            Self::Html => "html",
            Self::Properties => "properties",
            Self::Text => "text",
        }
    }

    /// Replace `Auto` with a concrete format for `content` read from `path`.
    pub fn resolve(self, path: Option<&Path>, content: &str) -> InputFormat {
        if self != Self::Auto {
            return self;
        }
        let detected = path
            .and_then(Self::from_extension)
            .unwrap_or_else(|| Self::sniff(content));
        debug!(format = detected.as_str(), "input format detected");
        detected
    }

    fn from_extension(path: &Path) -> Option<InputFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "html" | "htm" | "xhtml" => Some(Self::Html),
            "properties" | "props" => Some(Self::Properties),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }

    fn sniff(content: &str) -> InputFormat {
        let trimmed = content.trim_start();
        if trimmed.starts_with(['{', '[']) {
            Self::Json
        } else if trimmed.starts_with('<') {
            Self::Html
        } else if looks_like_properties(trimmed) {
            Self::Properties
        } else {
            Self::Text
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "json" => Ok(Self::Json),
            "html" | "htm" => Ok(Self::Html),
            "properties" | "props" => Ok(Self::Properties),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(DomainError::InvalidMapping(format!(
                "unknown input format '{s}'; expected one of: auto, json, html, properties, text"
            ))),
        }
    }
}

/// Parse `content` as `format`, resolving `Auto` against `path`.
pub fn read_input(
    content: &str,
    format: InputFormat,
    path: Option<&Path>,
    caster: &dyn Caster,
) -> DigesterResult<RawValue> {
    let value = match format.resolve(path, content) {
        InputFormat::Json => {
            caster
                .parse_json(content)
                .map_err(|e| ApplicationError::ReadFailed {
                    reason: format!("invalid JSON input: {e}"),
                })?
        }
        InputFormat::Html => RawValue::Html(parse_document(content)),
        InputFormat::Properties => RawValue::Mapping(parse_properties(content)),
        InputFormat::Text | InputFormat::Auto => RawValue::text(content),
    };
    Ok(value)
}

// ── Properties ───────────────────────────────────────────────────────────────

/// Parse a `.properties` document.
///
/// Supports `key=value`, `key: value` and `key value` lines, `#`/`!`
/// comments, trailing-backslash continuations and the usual escapes. Dotted
/// keys become nested mappings: `person.name=Bruno` yields
/// `{"person": {"name": "Bruno"}}`. A key that collides with a scalar of the
/// same prefix is kept flat.
pub fn parse_properties(text: &str) -> Mapping {
    let mut root = Mapping::new();
    for (key, value) in logical_lines(text).filter_map(|line| split_entry(&line)) {
        insert_dotted(&mut root, &key, value);
    }
    root
}

fn looks_like_properties(text: &str) -> bool {
    let mut entries = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with(['#', '!']))
        .peekable();
    entries.peek().is_some()
        && entries.all(|l| {
            l.find(['=', ':'])
                .is_some_and(|i| i > 0 && !l[..i].trim().contains(char::is_whitespace))
        })
}

/// Join continuation lines and drop comments and blanks.
fn logical_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    let mut lines = text.lines();
    std::iter::from_fn(move || {
        loop {
            let first = lines.next()?.trim_start();
            if first.is_empty() || first.starts_with(['#', '!']) {
                continue;
            }
            let mut logical = String::new();
            let mut current = first;
            while ends_with_continuation(current) {
                logical.push_str(&current[..current.len() - 1]);
                match lines.next() {
                    Some(next) => current = next.trim_start(),
                    None => return Some(logical),
                }
            }
            logical.push_str(current);
            return Some(logical);
        }
    })
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Split a logical line at the first unescaped `=`, `:` or whitespace.
fn split_entry(line: &str) -> Option<(String, String)> {
    let mut key = String::new();
    let mut chars = line.chars();
    let mut separator_seen = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    key.push(unescape(next));
                }
            }
            '=' | ':' => {
                separator_seen = true;
                break;
            }
            c if c.is_whitespace() => break,
            c => key.push(c),
        }
    }

    let mut rest = chars.as_str().trim_start();
    if !separator_seen {
        if let Some(stripped) = rest.strip_prefix(['=', ':']) {
            rest = stripped.trim_start();
        }
    }

    if key.is_empty() {
        warn!(line, "skipping property line without a key");
        return None;
    }
    Some((key, unescape_value(rest)))
}

fn unescape_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(unescape(next));
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn unescape(c: char) -> char {
    match c {
        't' => '\t',
        'n' => '\n',
        'r' => '\r',
        'f' => '\u{c}',
        other => other,
    }
}

fn insert_dotted(root: &mut Mapping, key: &str, value: String) {
    let segments: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let nestable = !parents.is_empty() && segments.iter().all(|s| !s.is_empty());
    if !nestable || collides(root, parents) {
        if nestable {
            warn!(key, "property key collides with a scalar; kept flat");
        }
        root.insert(key.to_string(), RawValue::text(value));
        return;
    }

    let mut level = root;
    for segment in parents {
        let entry = level
            .entry((*segment).to_string())
            .or_insert_with(|| RawValue::Mapping(Mapping::new()));
        let RawValue::Mapping(next) = entry else {
            return;
        };
        level = next;
    }
    level.insert((*last).to_string(), RawValue::text(value));
}

/// Whether some prefix of `parents` already holds a non-mapping value.
fn collides(root: &Mapping, parents: &[&str]) -> bool {
    let mut level = root;
    for segment in parents {
        match level.get(*segment) {
            None => return false,
            Some(RawValue::Mapping(next)) => level = next,
            Some(_) => return true,
        }
    }
    false
}
