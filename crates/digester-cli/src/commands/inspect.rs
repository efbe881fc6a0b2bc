//! Implementation of the `digester inspect` command.

use serde::Serialize;
use tracing::instrument;

use digester_adapters::MappingLoader;
use digester_core::{
    application::TargetSchema,
    domain::{MappingRule, Record},
    error::DigesterError,
};

use crate::{
    cli::InspectArgs,
    commands::ensure_exists,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

#[derive(Debug, Serialize)]
struct EntityView<'a> {
    name: &'a str,
    fields: Vec<FieldView<'a>>,
}

#[derive(Debug, Serialize)]
struct FieldView<'a> {
    name: &'a str,
    kind: String,
    rules: Vec<&'a MappingRule>,
}

#[instrument(skip_all, fields(path = %args.mapping.display()))]
pub fn execute(args: InspectArgs, output: OutputManager) -> CliResult<()> {
    ensure_exists("mapping", &args.mapping)?;
    let schemas = MappingLoader::new(&args.mapping)
        .load()
        .map_err(DigesterError::from)
        .with_cli_context(|| format!("loading mappings from {}", args.mapping.display()))?;

    let views = select(&schemas, args.entity.as_deref(), args.source.as_deref())?;

    if output.is_json() {
        return output.json(&views);
    }

    if views.is_empty() {
        output.warning("No entities declared")?;
        return Ok(());
    }
    for entity in &views {
        output.data(&format!("{}:", entity.name))?;
        for field in &entity.fields {
            output.data(&format!("  {} ({})", field.name, field.kind))?;
            if field.rules.is_empty() {
                output.data("    (unmapped)")?;
            }
            for rule in &field.rules {
                output.data(&format!("    {rule}"))?;
            }
        }
    }
    Ok(())
}

/// Views of `schemas`, narrowed to one entity and to one source's rules.
fn select<'a>(
    schemas: &'a [TargetSchema<Record>],
    entity: Option<&str>,
    source: Option<&str>,
) -> CliResult<Vec<EntityView<'a>>> {
    if let Some(name) = entity {
        if !schemas.iter().any(|s| s.name() == name) {
            return Err(CliError::UnknownEntity {
                name: name.to_string(),
                available: schemas.iter().map(|s| s.name().to_string()).collect(),
            });
        }
    }

    let views = schemas
        .iter()
        .filter(|schema| entity.is_none_or(|name| schema.name() == name))
        .map(|schema| EntityView {
            name: schema.name(),
            fields: schema
                .bindings()
                .iter()
                .map(|binding| FieldView {
                    name: binding.name(),
                    kind: binding.kind(),
                    rules: binding
                        .rules()
                        .iter()
                        .filter(|rule| source.is_none_or(|s| rule.matches_source(s)))
                        .collect(),
                })
                .collect(),
        })
        .collect();
    Ok(views)
}
