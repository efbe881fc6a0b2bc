//! Records: targets whose schema is declared at runtime.
//!
//! Typed targets are Rust structs with a compiled schema. Records carry the
//! same bindings but store their fields as [`RawValue`]s keyed by name, so a
//! schema can be loaded from a mapping file.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::domain::error::DomainError;
use crate::domain::value::{Mapping, RawValue};

// ── FieldKind ────────────────────────────────────────────────────────────────

/// Declared type of a record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    /// Any JSON-shaped value; text holding JSON is parsed.
    Json,
    /// A nested record of the named entity.
    Entity(String),
    /// A sequence of nested records of the named entity.
    Entities(String),
}

impl FieldKind {
    /// Entity named by a nested kind.
    pub fn entity(&self) -> Option<&str> {
        match self {
            Self::Entity(name) | Self::Entities(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::Boolean => f.write_str("boolean"),
            Self::Date => f.write_str("date"),
            Self::Json => f.write_str("json"),
            Self::Entity(name) => write!(f, "entity:{name}"),
            Self::Entities(name) => write!(f, "entities:{name}"),
        }
    }
}

impl FromStr for FieldKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidFieldKind {
            value: s.to_string(),
        };

        if let Some((prefix, name)) = s.split_once(':') {
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid());
            }
            return match prefix.trim().to_ascii_lowercase().as_str() {
                "entity" => Ok(Self::Entity(name.to_string())),
                "entities" => Ok(Self::Entities(name.to_string())),
                _ => Err(invalid()),
            };
        }

        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "string" => Ok(Self::Text),
            "integer" | "int" | "long" => Ok(Self::Integer),
            "float" | "double" | "number" => Ok(Self::Float),
            "boolean" | "bool" => Ok(Self::Boolean),
            "date" | "datetime" => Ok(Self::Date),
            "json" | "any" => Ok(Self::Json),
            _ => Err(invalid()),
        }
    }
}

// ── Record ───────────────────────────────────────────────────────────────────

/// Dynamically typed target object.
///
/// Fields keep their declaration order; unset fields hold [`RawValue::Null`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    entity: String,
    fields: Vec<(String, RawValue)>,
}

impl Record {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fields: Vec::new(),
        }
    }

    /// A record with every named field present and null.
    pub fn with_fields<I, S>(entity: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity: entity.into(),
            fields: names
                .into_iter()
                .map(|n| (n.into(), RawValue::Null))
                .collect(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Replace the value of `field`, appending it if undeclared.
    pub fn set(&mut self, field: &str, value: RawValue) {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field.to_string(), value)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flatten into a raw mapping, as stored in a parent record.
    pub fn into_raw(self) -> RawValue {
        RawValue::Mapping(self.fields.into_iter().collect::<Mapping>())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_kind_parses_aliases_and_entities() {
        assert_eq!(FieldKind::from_str("String").unwrap(), FieldKind::Text);
        assert_eq!(FieldKind::from_str("long").unwrap(), FieldKind::Integer);
        assert_eq!(
            FieldKind::from_str("entity:address").unwrap(),
            FieldKind::Entity("address".into())
        );
        assert_eq!(
            FieldKind::from_str("Entities: address").unwrap(),
            FieldKind::Entities("address".into())
        );
        assert!(FieldKind::from_str("entity:").is_err());
        assert!(FieldKind::from_str("uuid").is_err());
    }

    #[test]
    fn field_kind_display_parses_back() {
        let kind = FieldKind::Entities("address".into());
        assert_eq!(FieldKind::from_str(&kind.to_string()).unwrap(), kind);
    }

    #[test]
    fn record_serializes_in_declaration_order() {
        let mut record = Record::with_fields("person", ["name", "age", "city"]);
        record.set("age", RawValue::from(24i64));
        record.set("name", RawValue::text("Bruno"));

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"name":"Bruno","age":24,"city":null}"#);
    }

    #[test]
    fn set_appends_undeclared_fields() {
        let mut record = Record::new("person");
        record.set("nickname", RawValue::text("B"));
        assert_eq!(record.get("nickname"), Some(&RawValue::text("B")));
        assert_eq!(record.len(), 1);
    }
}
