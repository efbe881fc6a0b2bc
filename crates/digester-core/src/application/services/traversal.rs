//! Recursive dotted-path lookup over unevenly shaped containers.
//!
//! A path such as `personAddress.addressCity` is walked one segment at a
//! time over a *frontier* of values. Every frontier value is first
//! normalized into zero or more key/value levels by [`level_maps`], then
//! the segment is looked up in each level. All non-null hits form the next
//! frontier, so a sequence fans out and every match stays alive.

use std::borrow::Cow;

use tracing::trace;

use crate::application::ports::Caster;
use crate::domain::{Mapping, RawValue};

/// Every value reachable through `path`, in input order.
pub fn get_all_recursive(root: &RawValue, path: &str, caster: &dyn Caster) -> Vec<RawValue> {
    let mut frontier: Vec<Cow<'_, RawValue>> = vec![Cow::Borrowed(root)];

    for segment in path.split('.') {
        let mut next = Vec::new();
        for node in frontier {
            for level in level_maps(node, caster) {
                lookup(level, segment, &mut next);
            }
        }
        trace!(segment, hits = next.len(), "path segment resolved");
        if next.is_empty() {
            return Vec::new();
        }
        frontier = next;
    }

    frontier.into_iter().map(Cow::into_owned).collect()
}

/// First value reachable through `path`, or null.
pub fn get_recursive(root: &RawValue, path: &str, caster: &dyn Caster) -> RawValue {
    get_all_recursive(root, path, caster)
        .into_iter()
        .next()
        .unwrap_or_default()
}

/// Normalize one frontier value into the key/value levels it contributes.
///
/// - a mapping is its own level,
/// - a sequence contributes one level per element that is, or can be cast
///   to, a mapping (other elements are skipped),
/// - text is parsed as JSON: an object is one level, an array one level
///   per element,
/// - anything else contributes nothing.
fn level_maps<'a>(value: Cow<'a, RawValue>, caster: &dyn Caster) -> Vec<Cow<'a, Mapping>> {
    match value {
        Cow::Borrowed(RawValue::Mapping(m)) => vec![Cow::Borrowed(m)],
        Cow::Owned(RawValue::Mapping(m)) => vec![Cow::Owned(m)],
        Cow::Borrowed(RawValue::Sequence(items)) => items
            .iter()
            .filter_map(|item| element_map(Cow::Borrowed(item), caster))
            .collect(),
        Cow::Owned(RawValue::Sequence(items)) => items
            .into_iter()
            .filter_map(|item| element_map(Cow::Owned(item), caster))
            .collect(),
        other if other.as_text().is_some() => caster
            .to_map_list(&other)
            .map(|maps| maps.into_iter().map(Cow::Owned).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn element_map<'a>(item: Cow<'a, RawValue>, caster: &dyn Caster) -> Option<Cow<'a, Mapping>> {
    match item {
        Cow::Borrowed(RawValue::Mapping(m)) => Some(Cow::Borrowed(m)),
        Cow::Owned(RawValue::Mapping(m)) => Some(Cow::Owned(m)),
        other => caster.to_map(&other).ok().map(Cow::Owned),
    }
}

fn lookup<'a>(level: Cow<'a, Mapping>, segment: &str, out: &mut Vec<Cow<'a, RawValue>>) {
    match level {
        Cow::Borrowed(map) => {
            if let Some(hit) = map.get(segment).filter(|v| !v.is_null()) {
                out.push(Cow::Borrowed(hit));
            }
        }
        Cow::Owned(mut map) => {
            if let Some(hit) = map.remove(segment).filter(|v| !v.is_null()) {
                out.push(Cow::Owned(hit));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::StubCaster;

    fn address(city: &str) -> RawValue {
        RawValue::mapping([
            ("address", RawValue::text("Av X")),
            ("addressCity", RawValue::text(city)),
        ])
    }

    #[test]
    fn nested_map_path() {
        let root = RawValue::mapping([("personAddress", address("Joinville"))]);
        assert_eq!(
            get_recursive(&root, "personAddress.addressCity", &StubCaster),
            RawValue::text("Joinville")
        );
    }

    #[test]
    fn sequence_fans_out() {
        let root = RawValue::mapping([(
            "personAddress",
            RawValue::Sequence(vec![address("Joinville"), address("Curitiba")]),
        )]);

        assert_eq!(
            get_recursive(&root, "personAddress.addressCity", &StubCaster),
            RawValue::text("Joinville")
        );
        assert_eq!(
            get_all_recursive(&root, "personAddress.addressCity", &StubCaster),
            vec![RawValue::text("Joinville"), RawValue::text("Curitiba")]
        );
    }

    #[test]
    fn json_text_is_reparsed() {
        let root = RawValue::mapping([(
            "personAddress",
            RawValue::text(r#"[{"addressCity":"Joinville"},{"addressCity":"Blumenau"}]"#),
        )]);
        assert_eq!(
            get_all_recursive(&root, "personAddress.addressCity", &StubCaster),
            vec![RawValue::text("Joinville"), RawValue::text("Blumenau")]
        );

        let root = RawValue::mapping([(
            "personAddress",
            RawValue::text(r#"{"addressCity":"Joinville"}"#),
        )]);
        assert_eq!(
            get_recursive(&root, "personAddress.addressCity", &StubCaster),
            RawValue::text("Joinville")
        );
    }

    #[test]
    fn null_hits_and_missing_segments_are_skipped() {
        let root = RawValue::mapping([(
            "items",
            RawValue::Sequence(vec![
                RawValue::mapping([("name", RawValue::Null)]),
                RawValue::text("not a map"),
                RawValue::mapping([("name", RawValue::text("second"))]),
            ]),
        )]);
        assert_eq!(
            get_all_recursive(&root, "items.name", &StubCaster),
            vec![RawValue::text("second")]
        );
        assert_eq!(get_recursive(&root, "items.missing", &StubCaster), RawValue::Null);
    }

    #[test]
    fn scalars_contribute_nothing() {
        let root = RawValue::mapping([("age", RawValue::from(24i64))]);
        assert!(get_all_recursive(&root, "age.value", &StubCaster).is_empty());
        assert_eq!(get_recursive(&root, "age", &StubCaster), RawValue::from(24i64));
    }
}
