//! Rule dispatch: turns one mapping rule and one input into a raw value.

use tracing::{debug, instrument};

use crate::application::ports::{Caster, HtmlSelector, JsonQuery};
use crate::application::services::traversal;
use crate::domain::{HtmlQuery, MappingRule, RawValue, RefType};
use crate::error::DigesterResult;

/// Raw result of resolving a rule, before casting.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'i> {
    Value(RawValue),
    /// The whole input, for the field's own type to consume.
    PassThrough(&'i RawValue),
}

impl Resolution<'_> {
    pub fn is_null(&self) -> bool {
        match self {
            Self::Value(v) => v.is_null(),
            Self::PassThrough(v) => v.is_null(),
        }
    }

    pub fn into_value(self) -> RawValue {
        match self {
            Self::Value(v) => v,
            Self::PassThrough(v) => v.clone(),
        }
    }
}

/// Strategy dispatcher over the injected ports.
///
/// Caster failures surface as `DigesterError::Cast` and are recovered per
/// field by the caller; query and selector failures abort the conversion.
pub struct ValueResolver<'p> {
    caster: &'p dyn Caster,
    query: &'p dyn JsonQuery,
    selector: &'p dyn HtmlSelector,
}

impl<'p> ValueResolver<'p> {
    pub fn new(
        caster: &'p dyn Caster,
        query: &'p dyn JsonQuery,
        selector: &'p dyn HtmlSelector,
    ) -> Self {
        Self {
            caster,
            query,
            selector,
        }
    }

    #[instrument(skip_all, level = "trace", fields(ref_type = %rule.ref_type(), value = rule.value()))]
    pub fn resolve<'i>(
        &self,
        rule: &MappingRule,
        input: &'i RawValue,
    ) -> DigesterResult<Resolution<'i>> {
        let value = match rule.ref_type() {
            RefType::Hardcode => return Ok(Resolution::Value(RawValue::text(rule.value()))),
            RefType::PassThrough => return Ok(Resolution::PassThrough(input)),
            RefType::Normal => self.resolve_path(rule.value(), input)?,
            RefType::JsonPath => self.resolve_json_path(rule.value(), input)?,
            RefType::HtmlId => self.resolve_html(HtmlQuery::Id(rule.value().into()), rule, input)?,
            RefType::HtmlCss => self.resolve_html(HtmlQuery::Css(rule.value().into()), rule, input)?,
            RefType::HtmlXpath => {
                self.resolve_html(HtmlQuery::XPath(rule.value().into()), rule, input)?
            }
        };

        let value = if rule.trim() { value.trim_text() } else { value };
        debug!(kind = value.kind_name(), "rule resolved");
        Ok(Resolution::Value(value))
    }

    // -------------------------------------------------------------------------
    // Strategies
    // -------------------------------------------------------------------------

    fn resolve_path(&self, path: &str, input: &RawValue) -> DigesterResult<RawValue> {
        if input.as_mapping().is_some() {
            return Ok(traversal::get_recursive(input, path, self.caster));
        }
        let root = RawValue::Mapping(self.caster.to_map(input)?);
        Ok(traversal::get_recursive(&root, path, self.caster))
    }

    fn resolve_json_path(&self, expression: &str, input: &RawValue) -> DigesterResult<RawValue> {
        let root = match input {
            RawValue::Mapping(_) => self.caster.to_json(input)?,
            other => self
                .caster
                .to_json(&RawValue::Mapping(self.caster.to_map(other)?))?,
        };
        self.query.query(&root, expression)
    }

    fn resolve_html(
        &self,
        query: HtmlQuery,
        rule: &MappingRule,
        input: &RawValue,
    ) -> DigesterResult<RawValue> {
        let root = match input {
            RawValue::Html(selection) => selection.clone(),
            other => self.caster.to_html(other)?,
        };
        let selection = self.selector.select(&root, &query)?;

        if selection.is_empty() {
            return Ok(RawValue::Null);
        }
        Ok(if rule.html_text() {
            RawValue::text(selection.text())
        } else {
            RawValue::Html(selection)
        })
    }
}
