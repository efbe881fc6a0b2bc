//! Flags shared by every `digester` subcommand.
//!
//! Flattened into [`super::Cli`]. None of these change what a conversion
//! produces; they only control logging, status lines and where settings
//! come from.

use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Log more about mapping files and field resolution.
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Log more detail (-v, -vv, -vvv)",
        long_help = "Log more detail to stderr. RUST_LOG overrides this flag.
    (none)  - Warnings, such as skipped mapping files or failed fields
    -v      - Mapping files loaded and conversions run
    -vv     - Outcome of every field
    -vvv    - JSON queries, HTML selections and casts"
    )]
    pub verbose: u8,

    /// Only errors reach stderr; converted data still goes to stdout.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Hide status lines and warnings"
    )]
    pub quiet: bool,

    /// Honours `NO_COLOR` (<https://no-color.org>).
    #[arg(
        long = "no-color",
        global = true,
        env = "NO_COLOR",
        help = "Disable colored status lines"
    )]
    pub no_color: bool,

    /// Settings file read before `DIGESTER__*` environment variables.
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "FILE",
        help = "Settings file (default: platform config dir)",
        long_help = "Settings file with [defaults], [caster] and [output] tables. \
It must exist, except for `init`, which creates it. Without this flag the \
platform config directory is used when a file is there."
    )]
    pub config: Option<PathBuf>,

    /// Rendering of status lines, reports and logs.
    #[arg(
        long = "output-format",
        global = true,
        value_enum,
        default_value = "auto",
        help = "Rendering of reports, listings and logs"
    )]
    pub output_format: OutputFormat,
}

/// Rendering chosen with `--output-format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human on a terminal, plain when piped.
    #[default]
    Auto,
    /// Colored status symbols.
    Human,
    /// No colors.
    Plain,
    /// JSON listings, `{record, report}` envelopes and JSON log lines.
    Json,
}
