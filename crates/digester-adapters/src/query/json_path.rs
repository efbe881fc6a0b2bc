//! JSON-path evaluation with `serde_json_path`.

use digester_core::{
    application::{ApplicationError, ports::JsonQuery},
    domain::RawValue,
    error::DigesterResult,
};
use serde_json_path::JsonPath;
use tracing::{instrument, trace};

/// Evaluates RFC 9535 JSON-path expressions.
///
/// A definite path (no wildcards, recursive descent, filters, unions or
/// slices) yields its single value or null. Any other path yields a sequence
/// of every match, possibly empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPathQuery;

impl JsonPathQuery {
    pub fn new() -> Self {
        Self
    }
}

impl JsonQuery for JsonPathQuery {
    #[instrument(skip(self, json), level = "trace")]
    fn query(&self, json: &str, expression: &str) -> DigesterResult<RawValue> {
        let failed = |reason: String| ApplicationError::QueryFailed {
            expression: expression.to_string(),
            reason,
        };

        let path = JsonPath::parse(expression).map_err(|e| failed(e.to_string()))?;
        let document: serde_json::Value =
            serde_json::from_str(json).map_err(|e| failed(format!("invalid document: {e}")))?;

        let nodes = path.query(&document);
        trace!(matches = nodes.len(), "path evaluated");

        let value = if is_definite(expression) {
            nodes
                .into_iter()
                .next()
                .cloned()
                .map(RawValue::from)
                .unwrap_or_default()
        } else {
            RawValue::Sequence(nodes.into_iter().cloned().map(RawValue::from).collect())
        };
        Ok(value)
    }
}

/// Whether `expression` can select at most one node.
///
/// Looks for `..`, `*`, filters (`?`) and, inside brackets, unions (`,`) and
/// slices (`:`). Quoted member names are skipped.
pub fn is_definite(expression: &str) -> bool {
    if expression.contains("..") {
        return false;
    }

    let mut quote = None;
    let mut in_brackets = false;
    for c in expression.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => in_brackets = true,
            (None, ']') => in_brackets = false,
            (None, '*' | '?') => return false,
            (None, ',' | ':') if in_brackets => return false,
            _ => {}
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use digester_core::error::DigesterError;

    const DOC: &str = r#"{
        "personName": "Bruno",
        "addresses": [
            {"street": "Castro St", "city": "San Francisco"},
            {"street": "Av X", "city": "Joinville"}
        ]
    }"#;

    #[test]
    fn definite_paths_yield_a_value_or_null() {
        let query = JsonPathQuery::new();
        assert_eq!(query.query(DOC, "$.personName").unwrap(), RawValue::text("Bruno"));
        assert_eq!(
            query.query(DOC, "$.addresses[1].city").unwrap(),
            RawValue::text("Joinville")
        );
        assert_eq!(query.query(DOC, "$.missing").unwrap(), RawValue::Null);
    }

    #[test]
    fn indefinite_paths_yield_sequences() {
        let query = JsonPathQuery::new();
        assert_eq!(
            query.query(DOC, "$.addresses[*].city").unwrap(),
            RawValue::Sequence(vec![
                RawValue::text("San Francisco"),
                RawValue::text("Joinville")
            ])
        );
        assert_eq!(
            query.query(DOC, "$..nothing").unwrap(),
            RawValue::Sequence(Vec::new())
        );
    }

    #[test]
    fn parse_errors_are_query_failures() {
        let err = JsonPathQuery::new().query(DOC, "$[").unwrap_err();
        assert!(matches!(
            err,
            DigesterError::Application(ApplicationError::QueryFailed { .. })
        ));
    }

    #[test]
    fn definiteness() {
        assert!(is_definite("$.a.b[0]"));
        assert!(is_definite("$['a*b']"));
        assert!(!is_definite("$..a"));
        assert!(!is_definite("$.a[*]"));
        assert!(!is_definite("$.a[0,1]"));
        assert!(!is_definite("$.a[0:2]"));
        assert!(!is_definite("$.a[?@.b == 1]"));
    }
}
