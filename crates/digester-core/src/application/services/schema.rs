//! Target schemas: the static description of how a type is populated.
//!
//! A [`TargetSchema`] lists one [`FieldBinding`] per field, each with its
//! ordered rules and a typed setter slot. Schemas are built once through
//! [`SchemaBuilder`] and cached by the [`MappingRegistry`](super::MappingRegistry).
//!
//! ```rust,ignore
//! TargetSchema::builder("person")
//!     .field("name", [MappingRule::normal("crm", "fullName")], |p: &mut Person, v: String| p.name = v)
//!     .entity("address", [MappingRule::normal("crm", "personAddress")], |p: &mut Person, a: Address| p.address = a)
//!     .build()
//! ```

use std::borrow::Cow;
use std::collections::HashSet;
use std::marker::PhantomData;

use tracing::trace;

use crate::application::services::cast::{Castable, cast, cast_kind};
use crate::application::services::digester::Digester;
use crate::application::services::resolver::Resolution;
use crate::domain::{
    ConversionReport, DomainError, FieldError, FieldKind, FieldOutcome, HtmlSelection, MappingRule,
    RawValue, Record,
};
use crate::error::DigesterResult;

/// A type that can be the target of a conversion.
///
/// Implementors declare their schema; the registry calls [`Entity::schema`]
/// once per process and caches the result.
pub trait Entity: Sized + Send + 'static {
    fn schema() -> Result<TargetSchema<Self>, DomainError>;
}

// ── Schema ───────────────────────────────────────────────────────────────────

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Ordered field bindings of one target type.
pub struct TargetSchema<T> {
    name: String,
    bindings: Vec<FieldBinding<T>>,
    factory: Factory<T>,
}

impl<T: Default + 'static> TargetSchema<T> {
    /// Start a schema whose instances begin as `T::default()`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder<T> {
        SchemaBuilder::new(name.into(), Box::new(T::default))
    }
}

impl TargetSchema<Record> {
    /// Start a schema for a dynamic record entity.
    pub fn record(entity: impl Into<String>) -> SchemaBuilder<Record> {
        let entity = entity.into();
        let name = entity.clone();
        SchemaBuilder::new(entity, Box::new(move || Record::new(name.clone())))
    }
}

impl<T> TargetSchema<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every declared field, including those without rules.
    pub fn bindings(&self) -> &[FieldBinding<T>] {
        &self.bindings
    }

    pub fn binding(&self, field: &str) -> Option<&FieldBinding<T>> {
        self.bindings.iter().find(|b| b.name == field)
    }

    /// Fields with at least one rule for `source`.
    pub fn bindings_for_source<'s>(
        &'s self,
        source: &'s str,
    ) -> impl Iterator<Item = &'s FieldBinding<T>> + 's {
        self.bindings
            .iter()
            .filter(move |b| b.rule_for(source).is_some())
    }

    /// Fresh target instance with every field at its default.
    pub fn instantiate(&self) -> T {
        (self.factory)()
    }
}

impl<T> std::fmt::Debug for TargetSchema<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetSchema")
            .field("name", &self.name)
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// One field: its rules and the slot that applies resolved values.
pub struct FieldBinding<T> {
    name: String,
    rules: Vec<MappingRule>,
    slot: Box<dyn FieldSlot<T>>,
}

impl<T> FieldBinding<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    /// First declared rule whose source matches, case-insensitively.
    pub fn rule_for(&self, source: &str) -> Option<&MappingRule> {
        self.rules.iter().find(|r| r.matches_source(source))
    }

    /// Declared type label, e.g. `i32` or `entity:address`.
    pub fn kind(&self) -> String {
        self.slot.kind()
    }

    pub(crate) fn slot(&self) -> &dyn FieldSlot<T> {
        self.slot.as_ref()
    }
}

impl<T> std::fmt::Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("rules", &self.rules)
            .finish()
    }
}

// ── Builder ──────────────────────────────────────────────────────────────────

/// Fluent builder for [`TargetSchema`].
pub struct SchemaBuilder<T> {
    name: String,
    bindings: Vec<FieldBinding<T>>,
    factory: Factory<T>,
}

impl<T: 'static> SchemaBuilder<T> {
    fn new(name: String, factory: Factory<T>) -> Self {
        Self {
            name,
            bindings: Vec::new(),
            factory,
        }
    }

    /// Leaf field cast to `F` and handed to `setter`.
    pub fn field<F, S>(
        self,
        name: impl Into<String>,
        rules: impl IntoIterator<Item = MappingRule>,
        setter: S,
    ) -> Self
    where
        F: Castable,
        S: Fn(&mut T, F) + Send + Sync + 'static,
    {
        self.try_field(name, rules, move |target: &mut T, value: F| {
            setter(target, value);
            Ok(())
        })
    }

    /// Leaf field whose setter may reject the value.
    ///
    /// A rejection is recorded as a failed field; conversion continues.
    pub fn try_field<F, S>(
        self,
        name: impl Into<String>,
        rules: impl IntoIterator<Item = MappingRule>,
        setter: S,
    ) -> Self
    where
        F: Castable,
        S: Fn(&mut T, F) -> Result<(), String> + Send + Sync + 'static,
    {
        self.slot(
            name,
            rules,
            ValueSlot {
                setter,
                _marker: PhantomData,
            },
        )
    }

    /// Nested entity, converted recursively with the same source name.
    pub fn entity<E, S>(
        self,
        name: impl Into<String>,
        rules: impl IntoIterator<Item = MappingRule>,
        setter: S,
    ) -> Self
    where
        E: Entity,
        S: Fn(&mut T, E) + Send + Sync + 'static,
    {
        self.slot(
            name,
            rules,
            EntitySlot {
                setter,
                _marker: PhantomData,
            },
        )
    }

    /// Collection of nested entities.
    ///
    /// A resolved sequence converts element-wise. A single value, or the
    /// whole input under a pass-through rule, yields a one-element list.
    pub fn entities<E, S>(
        self,
        name: impl Into<String>,
        rules: impl IntoIterator<Item = MappingRule>,
        setter: S,
    ) -> Self
    where
        E: Entity,
        S: Fn(&mut T, Vec<E>) + Send + Sync + 'static,
    {
        self.slot(
            name,
            rules,
            EntitiesSlot {
                setter,
                _marker: PhantomData,
            },
        )
    }

    /// Field with a custom slot.
    pub fn slot(
        mut self,
        name: impl Into<String>,
        rules: impl IntoIterator<Item = MappingRule>,
        slot: impl FieldSlot<T> + 'static,
    ) -> Self {
        self.bindings.push(FieldBinding {
            name: name.into(),
            rules: rules.into_iter().collect(),
            slot: Box::new(slot),
        });
        self
    }

    /// Validate field names and finish the schema.
    pub fn build(self) -> Result<TargetSchema<T>, DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::EmptyEntityName);
        }

        let mut seen = HashSet::new();
        for binding in &self.bindings {
            if binding.name.trim().is_empty() {
                return Err(DomainError::EmptyFieldName {
                    entity: self.name.clone(),
                });
            }
            if !seen.insert(binding.name.as_str()) {
                return Err(DomainError::DuplicateField {
                    entity: self.name.clone(),
                    field: binding.name.clone(),
                });
            }
        }

        Ok(TargetSchema {
            name: self.name,
            bindings: self.bindings,
            factory: self.factory,
        })
    }
}

impl SchemaBuilder<Record> {
    /// Record field of a runtime kind. Declared fields start out null.
    pub fn record_field(
        mut self,
        name: impl Into<String>,
        kind: FieldKind,
        rules: impl IntoIterator<Item = MappingRule>,
    ) -> Self {
        let name = name.into();
        self = self.slot(
            name.clone(),
            rules,
            RecordSlot {
                field: name,
                kind,
            },
        );

        let entity = self.name.clone();
        let fields: Vec<String> = self.bindings.iter().map(|b| b.name.clone()).collect();
        self.factory = Box::new(move || Record::with_fields(entity.clone(), fields.iter().cloned()));
        self
    }
}

// ── Slots ────────────────────────────────────────────────────────────────────

/// Applies a resolved value to one field of `T`.
pub trait FieldSlot<T>: Send + Sync {
    /// Declared type label.
    fn kind(&self) -> String;

    /// Cast or convert `resolved` and store it in `target`.
    ///
    /// Recoverable problems are returned as [`FieldOutcome::Failed`]; an
    /// `Err` aborts the whole conversion.
    fn apply(
        &self,
        target: &mut T,
        source: &str,
        resolved: Resolution<'_>,
        digester: &Digester,
    ) -> DigesterResult<FieldOutcome>;
}

struct ValueSlot<F, S> {
    setter: S,
    _marker: PhantomData<fn() -> F>,
}

impl<T, F, S> FieldSlot<T> for ValueSlot<F, S>
where
    F: Castable,
    S: Fn(&mut T, F) -> Result<(), String> + Send + Sync,
{
    fn kind(&self) -> String {
        F::KIND.to_string()
    }

    fn apply(
        &self,
        target: &mut T,
        _source: &str,
        resolved: Resolution<'_>,
        digester: &Digester,
    ) -> DigesterResult<FieldOutcome> {
        let outcome = match cast::<F>(resolved.into_value(), digester.caster()) {
            Ok(Some(value)) => match (self.setter)(target, value) {
                Ok(()) => FieldOutcome::Applied,
                Err(reason) => FieldOutcome::Failed(FieldError::Setter { reason }),
            },
            Ok(None) => FieldOutcome::Empty,
            Err(err) => FieldOutcome::Failed(FieldError::Cast(err)),
        };
        Ok(outcome)
    }
}

struct EntitySlot<E, S> {
    setter: S,
    _marker: PhantomData<fn() -> E>,
}

impl<T, E, S> FieldSlot<T> for EntitySlot<E, S>
where
    E: Entity,
    S: Fn(&mut T, E) + Send + Sync,
{
    fn kind(&self) -> String {
        format!("entity:{}", short_type_name::<E>())
    }

    fn apply(
        &self,
        target: &mut T,
        source: &str,
        resolved: Resolution<'_>,
        digester: &Digester,
    ) -> DigesterResult<FieldOutcome> {
        let input = match &resolved {
            Resolution::Value(v) => v,
            Resolution::PassThrough(v) => *v,
        };
        Ok(match digester.convert_raw::<E>(source, input)? {
            Some(conversion) => {
                (self.setter)(target, conversion.value);
                FieldOutcome::Nested(vec![conversion.report])
            }
            None => FieldOutcome::Empty,
        })
    }
}

struct EntitiesSlot<E, S> {
    setter: S,
    _marker: PhantomData<fn() -> E>,
}

impl<T, E, S> FieldSlot<T> for EntitiesSlot<E, S>
where
    E: Entity,
    S: Fn(&mut T, Vec<E>) + Send + Sync,
{
    fn kind(&self) -> String {
        format!("entities:{}", short_type_name::<E>())
    }

    fn apply(
        &self,
        target: &mut T,
        source: &str,
        resolved: Resolution<'_>,
        digester: &Digester,
    ) -> DigesterResult<FieldOutcome> {
        let inputs = collection_inputs(&resolved);

        let mut values = Vec::with_capacity(inputs.len());
        let mut reports: Vec<ConversionReport> = Vec::with_capacity(inputs.len());
        for input in &inputs {
            if let Some(conversion) = digester.convert_raw::<E>(source, input)? {
                values.push(conversion.value);
                reports.push(conversion.report);
            }
        }
        trace!(count = values.len(), "nested collection converted");

        (self.setter)(target, values);
        Ok(FieldOutcome::Nested(reports))
    }
}

/// Slot of a dynamic record field.
struct RecordSlot {
    field: String,
    kind: FieldKind,
}

impl FieldSlot<Record> for RecordSlot {
    fn kind(&self) -> String {
        self.kind.to_string()
    }

    fn apply(
        &self,
        target: &mut Record,
        source: &str,
        resolved: Resolution<'_>,
        digester: &Digester,
    ) -> DigesterResult<FieldOutcome> {
        match &self.kind {
            FieldKind::Entity(entity) => {
                let input = match &resolved {
                    Resolution::Value(v) => v,
                    Resolution::PassThrough(v) => *v,
                };
                Ok(match digester.convert_record_raw(entity, source, input)? {
                    Some(conversion) => {
                        target.set(&self.field, conversion.value.into_raw());
                        FieldOutcome::Nested(vec![conversion.report])
                    }
                    None => FieldOutcome::Empty,
                })
            }
            FieldKind::Entities(entity) => {
                let inputs = collection_inputs(&resolved);
                let mut values = Vec::with_capacity(inputs.len());
                let mut reports = Vec::with_capacity(inputs.len());
                for input in &inputs {
                    if let Some(conversion) = digester.convert_record_raw(entity, source, input)? {
                        values.push(conversion.value.into_raw());
                        reports.push(conversion.report);
                    }
                }
                target.set(&self.field, RawValue::Sequence(values));
                Ok(FieldOutcome::Nested(reports))
            }
            kind => Ok(
                match cast_kind(resolved.into_value(), kind, digester.caster()) {
                    Ok(RawValue::Null) => FieldOutcome::Empty,
                    Ok(value) => {
                        target.set(&self.field, value);
                        FieldOutcome::Applied
                    }
                    Err(err) => FieldOutcome::Failed(FieldError::Cast(err)),
                },
            ),
        }
    }
}

/// One input per element of a collection field: sequence items and matched
/// HTML elements convert separately, anything else converts once.
fn collection_inputs<'a>(resolved: &'a Resolution<'_>) -> Vec<Cow<'a, RawValue>> {
    match resolved {
        Resolution::Value(RawValue::Sequence(items)) => items.iter().map(Cow::Borrowed).collect(),
        Resolution::Value(RawValue::Html(selection)) if selection.len() > 1 => selection
            .elements()
            .iter()
            .map(|element| Cow::Owned(RawValue::Html(HtmlSelection::single(element.clone()))))
            .collect(),
        Resolution::Value(single) => vec![Cow::Borrowed(single)],
        Resolution::PassThrough(input) => vec![Cow::Borrowed(*input)],
    }
}

/// Last path segment of a type name, lowercased: `app::model::Address` → `address`.
fn short_type_name<E>() -> String {
    let full = std::any::type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Person {
        name: String,
        age: i32,
    }

    #[test]
    fn builder_keeps_declaration_order() {
        let schema = TargetSchema::builder("person")
            .field("name", [MappingRule::normal("a", "n")], |p: &mut Person, v: String| p.name = v)
            .field("age", [], |p: &mut Person, v: i32| p.age = v)
            .build()
            .unwrap();

        let names: Vec<_> = schema.bindings().iter().map(FieldBinding::name).collect();
        assert_eq!(names, ["name", "age"]);
        assert_eq!(schema.binding("age").unwrap().kind(), "i32");
        assert_eq!(schema.bindings_for_source("A").count(), 1);
    }

    #[test]
    fn first_matching_rule_wins() {
        let schema = TargetSchema::builder("person")
            .field(
                "name",
                [
                    MappingRule::normal("crm", "fullName"),
                    MappingRule::normal("CRM", "name"),
                    MappingRule::normal("web", "title"),
                ],
                |p: &mut Person, v: String| p.name = v,
            )
            .build()
            .unwrap();

        let binding = schema.binding("name").unwrap();
        assert_eq!(binding.rule_for("crm").unwrap().value(), "fullName");
        assert_eq!(binding.rule_for("WEB").unwrap().value(), "title");
        assert!(binding.rule_for("other").is_none());
    }

    #[test]
    fn duplicate_and_empty_fields_are_rejected() {
        let duplicate = TargetSchema::builder("person")
            .field("name", [], |p: &mut Person, v: String| p.name = v)
            .field("name", [], |p: &mut Person, v: String| p.name = v)
            .build();
        assert!(matches!(duplicate, Err(DomainError::DuplicateField { .. })));

        let empty = TargetSchema::builder("person")
            .field(" ", [], |p: &mut Person, v: String| p.name = v)
            .build();
        assert!(matches!(empty, Err(DomainError::EmptyFieldName { .. })));

        let unnamed = TargetSchema::<Person>::builder("").build();
        assert!(matches!(unnamed, Err(DomainError::EmptyEntityName)));
    }

    #[test]
    fn record_schema_instantiates_declared_fields() {
        let schema = TargetSchema::record("person")
            .record_field("name", FieldKind::Text, [])
            .record_field("address", FieldKind::Entity("address".into()), [])
            .build()
            .unwrap();

        let record = schema.instantiate();
        assert_eq!(record.entity(), "person");
        assert_eq!(record.get("address"), Some(&RawValue::Null));
        assert_eq!(schema.binding("address").unwrap().kind(), "entity:address");
    }

    #[test]
    fn short_type_names() {
        assert_eq!(short_type_name::<Person>(), "person");
        assert_eq!(short_type_name::<Vec<String>>(), "vec");
    }
}
