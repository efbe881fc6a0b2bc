//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums. No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use digester_adapters::InputFormat;

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "digester",
    bin_name = "digester",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Declarative field mapping from JSON, HTML and property sources",
    long_about = "Digester converts semi-structured input into records by \
                  following per-field mapping rules declared in TOML files.",
    after_help = "EXAMPLES:\n\
        \x20 digester convert -m mappings/ -e person -s crm -i person.json\n\
        \x20 curl -s https://example.com/profile | digester convert -m mappings/ -e person -s web -f html\n\
        \x20 digester inspect -m mappings/ --source crm\n\
        \x20 digester completions bash > /usr/share/bash-completion/completions/digester",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert one input into a record.
    #[command(
        visible_alias = "c",
        about = "Convert an input into a record",
        after_help = "EXAMPLES:\n\
            \x20 digester convert -m person.toml -e person -s crm -i person.json\n\
            \x20 digester convert -m mappings/ -e person -s web -i page.html --report\n\
            \x20 cat person.properties | digester convert -m mappings/ -e person -s props -f properties"
    )]
    Convert(ConvertArgs),

    /// Show the entities and rules declared in mapping files.
    #[command(
        visible_alias = "ls",
        about = "Inspect mapping files",
        after_help = "EXAMPLES:\n\
            \x20 digester inspect -m mappings/\n\
            \x20 digester inspect -m mappings/ --entity person --source crm"
    )]
    Inspect(InspectArgs),

    /// Write a default configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 digester init            # platform config directory\n\
            \x20 digester -c ./digester.toml init --force"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 digester completions bash > ~/.local/share/bash-completion/completions/digester\n\
            \x20 digester completions zsh  > ~/.zfunc/_digester\n\
            \x20 digester completions fish > ~/.config/fish/completions/digester.fish"
    )]
    Completions(CompletionsArgs),

    /// Read the active configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 digester config get defaults.source\n\
            \x20 digester config list\n\
            \x20 digester config path"
    )]
    Config(ConfigCommands),
}

// ── convert ───────────────────────────────────────────────────────────────────

/// Arguments for `digester convert`.
#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Mapping file, or a directory searched for `*.toml` files.
    #[arg(
        short = 'm',
        long = "mapping",
        value_name = "PATH",
        help = "Mapping file or directory"
    )]
    pub mapping: PathBuf,

    /// Entity to build.
    #[arg(
        short = 'e',
        long = "entity",
        value_name = "NAME",
        help = "Entity to build"
    )]
    pub entity: String,

    /// Source name selecting which rules apply. Defaults to
    /// `defaults.source` from the configuration.
    #[arg(
        short = 's',
        long = "source",
        value_name = "NAME",
        help = "Source name (case-insensitive)"
    )]
    pub source: Option<String>,

    /// Input file; `-` or absent reads standard input.
    #[arg(
        short = 'i',
        long = "input",
        value_name = "FILE",
        help = "Input file ('-' for stdin)"
    )]
    pub input: Option<PathBuf>,

    /// Input format. Defaults to `defaults.input_format`.
    #[arg(
        short = 'f',
        long = "format",
        value_name = "FORMAT",
        value_enum,
        help = "Input format"
    )]
    pub format: Option<FormatArg>,

    /// `chrono` format string for date fields.
    #[arg(
        long = "date-format",
        value_name = "FORMAT",
        help = "Date format for date fields (chrono syntax)"
    )]
    pub date_format: Option<String>,

    /// Also print per-field outcomes.
    #[arg(long = "report", help = "Print per-field outcomes")]
    pub report: bool,

    /// Pretty-print the JSON output.
    #[arg(long = "pretty", help = "Pretty-print JSON output")]
    pub pretty: bool,
}

/// Input formats accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum FormatArg {
    Auto,
    Json,
    /// Also accepted as `htm`.
    #[value(alias = "htm")]
    Html,
    /// Also accepted as `props`.
    #[value(alias = "props")]
    Properties,
    Text,
}

impl From<FormatArg> for InputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Auto => Self::Auto,
            FormatArg::Json => Self::Json,
            FormatArg::Html => Self::Html,
            FormatArg::Properties => Self::Properties,
            FormatArg::Text => Self::Text,
        }
    }
}

impl std::fmt::Display for FormatArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(InputFormat::from(*self).as_str())
    }
}

// ── inspect ───────────────────────────────────────────────────────────────────

/// Arguments for `digester inspect`.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Mapping file, or a directory searched for `*.toml` files.
    #[arg(
        short = 'm',
        long = "mapping",
        value_name = "PATH",
        help = "Mapping file or directory"
    )]
    pub mapping: PathBuf,

    /// Only show this entity.
    #[arg(short = 'e', long = "entity", value_name = "NAME", help = "Filter by entity")]
    pub entity: Option<String>,

    /// Only show rules for this source.
    #[arg(short = 's', long = "source", value_name = "NAME", help = "Filter by source")]
    pub source: Option<String>,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `digester init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `digester completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `digester config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `caster.date_format`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_convert_command() {
        let cli = Cli::parse_from([
            "digester",
            "convert",
            "--mapping",
            "mappings",
            "--entity",
            "person",
            "--source",
            "SourceTest",
            "--report",
        ]);
        let Commands::Convert(args) = cli.command else {
            panic!("expected Convert command");
        };
        assert_eq!(args.entity, "person");
        assert_eq!(args.source.as_deref(), Some("SourceTest"));
        assert!(args.input.is_none());
        assert!(args.format.is_none());
        assert!(args.report);
    }

    #[test]
    fn format_aliases() {
        let cli = Cli::parse_from([
            "digester", "convert", "-m", "m.toml", "-e", "person", "-f", "props",
        ]);
        if let Commands::Convert(args) = cli.command {
            assert_eq!(args.format, Some(FormatArg::Properties));
            assert_eq!(InputFormat::from(FormatArg::Properties), InputFormat::Properties);
        } else {
            panic!("expected Convert command");
        }
    }

    #[test]
    fn format_display_matches_input_format() {
        assert_eq!(FormatArg::Html.to_string(), "html");
        assert_eq!(FormatArg::Auto.to_string(), "auto");
    }

    #[test]
    fn convert_requires_mapping_and_entity() {
        assert!(Cli::try_parse_from(["digester", "convert", "-e", "person"]).is_err());
        assert!(Cli::try_parse_from(["digester", "convert", "-m", "m.toml"]).is_err());
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["digester", "--quiet", "--verbose", "config", "list"]);
        assert!(result.is_err());
    }
}
