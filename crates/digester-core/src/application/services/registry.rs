//! Schema cache.
//!
//! Typed schemas are built on first use and cached by `TypeId`. Record
//! schemas are registered explicitly, usually from mapping files, and looked
//! up by entity name. Nothing is ever evicted.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::application::ApplicationError;
use crate::application::services::schema::{Entity, TargetSchema};
use crate::domain::Record;
use crate::error::{DigesterError, DigesterResult};

type AnySchema = Arc<dyn Any + Send + Sync>;

/// Thread-safe registry of target schemas.
#[derive(Default)]
pub struct MappingRegistry {
    typed: RwLock<HashMap<TypeId, AnySchema>>,
    records: RwLock<HashMap<String, Arc<TargetSchema<Record>>>>,
}

impl MappingRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema of `T`, building and caching it on first request.
    ///
    /// Two threads racing on the same type may both build the schema; the
    /// first insert wins and both get an equivalent result.
    pub fn bindings_for<T: Entity>(&self) -> DigesterResult<Arc<TargetSchema<T>>> {
        let key = TypeId::of::<T>();

        let cached = self
            .typed
            .read()
            .map_err(|_| ApplicationError::RegistryLockError)?
            .get(&key)
            .cloned();
        if let Some(schema) = cached {
            return downcast(schema);
        }

        let built: AnySchema = Arc::new(T::schema()?);
        debug!(target_type = std::any::type_name::<T>(), "schema built");

        let schema = self
            .typed
            .write()
            .map_err(|_| ApplicationError::RegistryLockError)?
            .entry(key)
            .or_insert(built)
            .clone();
        downcast(schema)
    }

    /// Register (or replace) a record schema under its entity name.
    pub fn register_record(&self, schema: TargetSchema<Record>) -> DigesterResult<()> {
        let name = schema.name().to_string();
        let mut records = self
            .records
            .write()
            .map_err(|_| ApplicationError::RegistryLockError)?;
        if records.insert(name.clone(), Arc::new(schema)).is_some() {
            debug!(entity = %name, "record schema replaced");
        }
        Ok(())
    }

    /// Schema of the record entity `name`, if registered.
    pub fn record_bindings(&self, name: &str) -> DigesterResult<Option<Arc<TargetSchema<Record>>>> {
        let records = self
            .records
            .read()
            .map_err(|_| ApplicationError::RegistryLockError)?;
        Ok(records.get(name).cloned())
    }

    /// Registered record entity names, sorted.
    pub fn record_entities(&self) -> DigesterResult<Vec<String>> {
        let records = self
            .records
            .read()
            .map_err(|_| ApplicationError::RegistryLockError)?;
        let mut names: Vec<String> = records.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Number of cached typed and registered record schemas.
    pub fn len(&self) -> usize {
        let typed = self.typed.read().map(|m| m.len()).unwrap_or(0);
        let records = self.records.read().map(|m| m.len()).unwrap_or(0);
        typed + records
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn downcast<T: Entity>(schema: AnySchema) -> DigesterResult<Arc<TargetSchema<T>>> {
    schema
        .downcast::<TargetSchema<T>>()
        .map_err(|_| DigesterError::Internal {
            message: format!(
                "cached schema does not belong to {}",
                std::any::type_name::<T>()
            ),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, FieldKind, MappingRule};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug, Default)]
    struct Counted {
        value: String,
    }

    impl Entity for Counted {
        fn schema() -> Result<TargetSchema<Self>, DomainError> {
            BUILDS.fetch_add(1, Ordering::SeqCst);
            TargetSchema::builder("counted")
                .field("value", [MappingRule::normal("s", "v")], |c: &mut Counted, v: String| {
                    c.value = v
                })
                .build()
        }
    }

    #[derive(Debug, Default)]
    struct Broken;

    impl Entity for Broken {
        fn schema() -> Result<TargetSchema<Self>, DomainError> {
            TargetSchema::builder("broken")
                .field("x", [], |_: &mut Broken, _: String| {})
                .field("x", [], |_: &mut Broken, _: String| {})
                .build()
        }
    }

    #[test]
    fn typed_schema_is_built_once() {
        let registry = MappingRegistry::new();
        let first = registry.bindings_for::<Counted>().unwrap();
        let second = registry.bindings_for::<Counted>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn schema_errors_surface_and_are_not_cached() {
        let registry = MappingRegistry::new();
        assert!(matches!(
            registry.bindings_for::<Broken>(),
            Err(DigesterError::Domain(DomainError::DuplicateField { .. }))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn records_are_listed_by_name() {
        let registry = MappingRegistry::new();
        for name in ["person", "address"] {
            let schema = TargetSchema::record(name)
                .record_field("id", FieldKind::Integer, [])
                .build()
                .unwrap();
            registry.register_record(schema).unwrap();
        }

        assert_eq!(registry.record_entities().unwrap(), ["address", "person"]);
        assert!(registry.record_bindings("person").unwrap().is_some());
        assert!(registry.record_bindings("ghost").unwrap().is_none());
    }
}
