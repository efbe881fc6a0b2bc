//! Implementation of the `digester convert` command.
//!
//! Responsibility: load mapping files, read one input, call the core
//! conversion and print the record. No mapping logic lives here.

use std::fs;
use std::io::{self, IsTerminal};
use std::path::Path;

use serde::Serialize;
use tracing::{info, instrument, warn};

use digester_adapters::{DefaultCaster, InputFormat, MappingLoader, build_digester, read_input};
use digester_core::{
    application::Conversion,
    domain::{ConversionReport, FieldOutcome, Record},
};

use crate::{
    cli::ConvertArgs,
    commands::ensure_exists,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Record and report together, for `--report --output-format json`.
#[derive(Serialize)]
struct ReportEnvelope<'a> {
    record: &'a Record,
    report: &'a ConversionReport,
}

/// Execute the `digester convert` command.
///
/// 1. Resolve source, format and date format (flags, then config)
/// 2. Load the mapping files into a fresh registry
/// 3. Read and parse the input
/// 4. Convert and print the record, plus the report when asked
#[instrument(skip_all, fields(entity = %args.entity))]
pub fn execute(args: ConvertArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let output = output.with_pretty(args.pretty);
    let source = resolve_source(args.source.as_deref(), &config)?;
    let format = args
        .format
        .map(InputFormat::from)
        .unwrap_or(config.defaults.input_format);
    let date_format = args
        .date_format
        .clone()
        .unwrap_or_else(|| config.caster.date_format.clone());

    ensure_exists("mapping", &args.mapping)?;
    let digester = build_digester(DefaultCaster::new().with_date_format(date_format));
    let loaded = MappingLoader::new(&args.mapping)
        .register_into(digester.registry())
        .with_cli_context(|| format!("loading mappings from {}", args.mapping.display()))?;
    info!(entities = loaded, path = %args.mapping.display(), "mappings loaded");

    if digester.registry().record_bindings(&args.entity)?.is_none() {
        return Err(CliError::UnknownEntity {
            available: digester.registry().record_entities()?,
            name: args.entity,
        });
    }

    let input_path = args.input.as_deref().filter(|p| *p != Path::new("-"));
    let text = read_text(input_path)?;
    let raw = read_input(&text, format, input_path, digester.caster())?;

    let Some(Conversion { value, report }) =
        digester.convert_record(&args.entity, &source, raw)?
    else {
        info!("input is null; nothing converted");
        output.data("null")?;
        return Ok(());
    };

    if args.report && output.is_json() {
        output.json(&ReportEnvelope {
            record: &value,
            report: &report,
        })?;
        return Ok(());
    }

    output.json(&value)?;
    if args.report {
        output.header(&report.to_string())?;
        print_fields(&report, "", &output)?;
    } else if !report.is_complete() {
        let failed = report.failures().len();
        warn!(failed, "conversion is partial");
        output.warning(&format!(
            "{failed} field(s) could not be converted; rerun with --report for details"
        ))?;
    }
    Ok(())
}

/// `--source`, else `defaults.source`; blank names count as absent.
fn resolve_source(flag: Option<&str>, config: &AppConfig) -> CliResult<String> {
    flag.or(config.defaults.source.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(CliError::MissingSource)
}

/// The file at `path`, or all of stdin when `path` is `None`.
fn read_text(path: Option<&Path>) -> CliResult<String> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CliError::PathNotFound {
                what: "input",
                path: path.to_path_buf(),
            },
            _ => CliError::IoError {
                message: format!("failed to read input '{}'", path.display()),
                source: e,
            },
        }),
        None => {
            if io::stdin().is_terminal() {
                return Err(CliError::InvalidInput {
                    message: "no input given; pass --input FILE or pipe data on stdin".into(),
                    source: None,
                });
            }
            io::read_to_string(io::stdin()).with_cli_context(|| "failed to read standard input")
        }
    }
}

fn print_fields(report: &ConversionReport, prefix: &str, output: &OutputManager) -> CliResult<()> {
    for field in &report.fields {
        let path = format!("{prefix}{}", field.field);
        match &field.outcome {
            FieldOutcome::Applied => output.success(&path)?,
            FieldOutcome::Failed(err) => output.error(&format!("{path}: {err}"))?,
            FieldOutcome::Nested(reports) if reports.len() == 1 => {
                print_fields(&reports[0], &format!("{path}."), output)?;
            }
            FieldOutcome::Nested(reports) => {
                for (i, nested) in reports.iter().enumerate() {
                    print_fields(nested, &format!("{path}[{i}]."), output)?;
                }
            }
            outcome => output.print(&format!("  {path}: {}", outcome.label()))?,
        }
    }
    Ok(())
}
