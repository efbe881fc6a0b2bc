//! Per-field conversion outcomes.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::domain::error::FieldError;

/// Outcome of converting one input into one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub target: String,
    pub source: String,
    pub fields: Vec<FieldReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldReport {
    pub field: String,
    pub outcome: FieldOutcome,
}

/// What happened to a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    /// A value was cast and handed to the setter.
    Applied,
    /// The field was populated by nested conversions, one report each.
    Nested(Vec<ConversionReport>),
    /// No rule matches the source; the field was not touched.
    Unmapped,
    /// The rule resolved to nothing.
    Empty,
    /// Resolution or casting failed; the field kept its default.
    Failed(FieldError),
}

impl FieldOutcome {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Nested(_) => "nested",
            Self::Unmapped => "unmapped",
            Self::Empty => "empty",
            Self::Failed(_) => "failed",
        }
    }
}

impl Serialize for FieldOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("FieldOutcome", 2)?;
        state.serialize_field("status", self.label())?;
        match self {
            Self::Nested(reports) => state.serialize_field("nested", reports)?,
            Self::Failed(err) => state.serialize_field("error", &err.to_string())?,
            _ => state.skip_field("detail")?,
        }
        state.end()
    }
}

impl ConversionReport {
    pub fn new(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
            fields: Vec::new(),
        }
    }

    pub fn push(&mut self, field: impl Into<String>, outcome: FieldOutcome) {
        self.fields.push(FieldReport {
            field: field.into(),
            outcome,
        });
    }

    pub fn outcome(&self, field: &str) -> Option<&FieldOutcome> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| &f.outcome)
    }

    /// `true` when no field failed, including fields of nested conversions.
    pub fn is_complete(&self) -> bool {
        self.fields.iter().all(|f| match &f.outcome {
            FieldOutcome::Failed(_) => false,
            FieldOutcome::Nested(reports) => reports.iter().all(Self::is_complete),
            _ => true,
        })
    }

    /// Every failure as `(dotted.field.path, error)`. Elements of nested
    /// collections are addressed by index.
    pub fn failures(&self) -> Vec<(String, &FieldError)> {
        let mut out = Vec::new();
        self.collect_failures("", &mut out);
        out
    }

    fn collect_failures<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a FieldError)>) {
        for field in &self.fields {
            let path = if prefix.is_empty() {
                field.field.clone()
            } else {
                format!("{prefix}.{}", field.field)
            };
            match &field.outcome {
                FieldOutcome::Failed(err) => out.push((path, err)),
                FieldOutcome::Nested(reports) if reports.len() == 1 => {
                    reports[0].collect_failures(&path, out);
                }
                FieldOutcome::Nested(reports) => {
                    for (i, report) in reports.iter().enumerate() {
                        report.collect_failures(&format!("{path}[{i}]"), out);
                    }
                }
                _ => {}
            }
        }
    }

    /// Number of fields that received a value at this level.
    pub fn applied(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| matches!(f.outcome, FieldOutcome::Applied | FieldOutcome::Nested(_)))
            .count()
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from '{}': {}/{} fields applied",
            self.target,
            self.source,
            self.applied(),
            self.fields.len()
        )
    }
}
