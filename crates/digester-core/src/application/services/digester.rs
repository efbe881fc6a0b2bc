//! Digester - main conversion orchestrator.
//!
//! For every field binding of the target schema:
//! 1. Pick the first rule matching the source name
//! 2. Resolve it into a raw value
//! 3. Cast and apply it through the field's slot
//!
//! Cast failures and setter rejections are recovered per field and recorded
//! in the [`ConversionReport`]. Query and selector failures, schema errors
//! and unknown record entities abort the conversion.

use std::io::Read;

use tracing::{debug, instrument, warn};

use crate::application::{
    ApplicationError,
    ports::{Caster, HtmlSelector, JsonQuery},
    services::{
        registry::MappingRegistry,
        resolver::ValueResolver,
        schema::{Entity, TargetSchema},
    },
};
use crate::domain::{ConversionReport, DEFAULT_SOURCE, FieldError, FieldOutcome, RawValue, Record};
use crate::error::{DigesterError, DigesterResult};

/// A converted value together with its per-field report.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion<T> {
    pub value: T,
    pub report: ConversionReport,
}

/// Conversion context.
///
/// Owns the parsing backends and the schema registry. A `Digester` is
/// `Send + Sync`; all per-conversion state lives on the stack of the call.
pub struct Digester {
    caster: Box<dyn Caster>,
    query: Box<dyn JsonQuery>,
    selector: Box<dyn HtmlSelector>,
    registry: MappingRegistry,
}

impl Digester {
    /// Create a digester with the given adapters.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use digester_core::application::Digester;
    ///
    /// let digester = Digester::new(
    ///     Box::new(caster),   // impl Caster
    ///     Box::new(query),    // impl JsonQuery
    ///     Box::new(selector), // impl HtmlSelector
    /// );
    /// ```
    pub fn new(
        caster: Box<dyn Caster>,
        query: Box<dyn JsonQuery>,
        selector: Box<dyn HtmlSelector>,
    ) -> Self {
        Self {
            caster,
            query,
            selector,
            registry: MappingRegistry::new(),
        }
    }

    /// Replace the schema registry, e.g. one pre-loaded with record schemas.
    pub fn with_registry(mut self, registry: MappingRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    pub fn caster(&self) -> &dyn Caster {
        self.caster.as_ref()
    }

    pub fn resolver(&self) -> ValueResolver<'_> {
        ValueResolver::new(
            self.caster.as_ref(),
            self.query.as_ref(),
            self.selector.as_ref(),
        )
    }

    // -------------------------------------------------------------------------
    // Typed conversions
    // -------------------------------------------------------------------------

    /// Convert `input` into `T` using the rules declared for `source`.
    ///
    /// Returns `Ok(None)` for a null input.
    pub fn convert<T: Entity>(
        &self,
        source: &str,
        input: impl Into<RawValue>,
    ) -> DigesterResult<Option<T>> {
        Ok(self
            .convert_with_report(source, input)?
            .map(|conversion| conversion.value))
    }

    /// Convert with the rules declared under [`DEFAULT_SOURCE`].
    pub fn convert_default<T: Entity>(&self, input: impl Into<RawValue>) -> DigesterResult<Option<T>> {
        self.convert(DEFAULT_SOURCE, input)
    }

    /// Like [`Digester::convert`], also returning the per-field report.
    pub fn convert_with_report<T: Entity>(
        &self,
        source: &str,
        input: impl Into<RawValue>,
    ) -> DigesterResult<Option<Conversion<T>>> {
        self.convert_raw(source, &input.into())
    }

    /// Borrowing form used for nested conversions.
    #[instrument(skip_all, fields(target = std::any::type_name::<T>(), source = %source))]
    pub fn convert_raw<T: Entity>(
        &self,
        source: &str,
        input: &RawValue,
    ) -> DigesterResult<Option<Conversion<T>>> {
        if input.is_null() {
            return Ok(None);
        }
        let schema = self.registry.bindings_for::<T>()?;
        self.populate(&schema, source, input).map(Some)
    }

    /// Read a UTF-8 stream fully and convert its text.
    pub fn convert_reader<T: Entity>(
        &self,
        source: &str,
        mut reader: impl Read,
    ) -> DigesterResult<Option<T>> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| ApplicationError::ReadFailed {
                reason: e.to_string(),
            })?;
        self.convert(source, RawValue::text(text))
    }

    // -------------------------------------------------------------------------
    // Record conversions
    // -------------------------------------------------------------------------

    /// Convert `input` into a record of the registered `entity`.
    ///
    /// An unregistered entity is a construction failure.
    pub fn convert_record(
        &self,
        entity: &str,
        source: &str,
        input: impl Into<RawValue>,
    ) -> DigesterResult<Option<Conversion<Record>>> {
        self.convert_record_raw(entity, source, &input.into())
    }

    #[instrument(skip_all, fields(entity = %entity, source = %source))]
    pub fn convert_record_raw(
        &self,
        entity: &str,
        source: &str,
        input: &RawValue,
    ) -> DigesterResult<Option<Conversion<Record>>> {
        let schema = self.registry.record_bindings(entity)?.ok_or_else(|| {
            ApplicationError::ConstructionFailed {
                target: entity.to_string(),
                reason: "no record schema registered under this name".into(),
            }
        })?;
        if input.is_null() {
            return Ok(None);
        }
        self.populate(&schema, source, input).map(Some)
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    /// Instantiate the target and apply every binding that has a rule for
    /// `source`.
    fn populate<T>(
        &self,
        schema: &TargetSchema<T>,
        source: &str,
        input: &RawValue,
    ) -> DigesterResult<Conversion<T>> {
        let resolver = self.resolver();
        let mut target = schema.instantiate();
        let mut report = ConversionReport::new(schema.name(), source);

        for binding in schema.bindings() {
            let Some(rule) = binding.rule_for(source) else {
                report.push(binding.name(), FieldOutcome::Unmapped);
                continue;
            };

            let outcome = match resolver.resolve(rule, input) {
                Ok(resolved) if resolved.is_null() => FieldOutcome::Empty,
                Ok(resolved) => binding.slot().apply(&mut target, source, resolved, self)?,
                Err(DigesterError::Cast(err)) => FieldOutcome::Failed(FieldError::Cast(err)),
                Err(err) => return Err(err),
            };

            match &outcome {
                FieldOutcome::Failed(err) => warn!(
                    target_type = schema.name(),
                    field = binding.name(),
                    rule = %rule,
                    error = %err,
                    "field skipped"
                ),
                other => debug!(field = binding.name(), outcome = other.label(), "field processed"),
            }
            report.push(binding.name(), outcome);
        }

        Ok(Conversion {
            value: target,
            report,
        })
    }
}
