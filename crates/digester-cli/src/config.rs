//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value. The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables prefixed `DIGESTER__`, e.g.
//!    `DIGESTER__CASTER__DATE_FORMAT`
//! 3. Config file (`--config`, else the platform config directory)
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use digester_adapters::{DEFAULT_DATE_FORMAT, InputFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

const ENV_PREFIX: &str = "DIGESTER";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fallbacks for `convert` flags.
    pub defaults: Defaults,
    /// Casting settings.
    pub caster: CasterConfig,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub input_format: InputFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CasterConfig {
    pub date_format: String,
}

impl Default for CasterConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub pretty: bool,
}

impl AppConfig {
    /// Load configuration from defaults, file and environment.
    ///
    /// An explicit `config_file` must exist unless `allow_missing` is set;
    /// the default location is always optional.
    pub fn load(config_file: Option<&PathBuf>, allow_missing: bool) -> anyhow::Result<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.clone(), !allow_missing),
            None => (Self::config_path(), false),
        };
        debug!(path = %path.display(), required, "loading configuration");

        Config::builder()
            .add_source(File::from(path.as_path()).format(FileFormat::Toml).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?
            .try_deserialize()
            .context("failed to deserialize configuration")
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.digester.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "digester", "digester")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".digester.toml"))
    }

    /// The file `load` reads for the given `--config` value.
    pub fn active_path(config_file: Option<&Path>) -> PathBuf {
        config_file
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path)
    }

    /// Value of a dotted key, as shown by `config get`.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "defaults.source" => self.defaults.source.clone().unwrap_or_default(),
            "defaults.input_format" => self.defaults.input_format.to_string(),
            "caster.date_format" => self.caster.date_format.clone(),
            "output.no_color" => self.output.no_color.to_string(),
            "output.pretty" => self.output.pretty.to_string(),
            _ => return None,
        };
        Some(value)
    }

    pub const KEYS: [&'static str; 5] = [
        "defaults.source",
        "defaults.input_format",
        "caster.date_format",
        "output.no_color",
        "output.pretty",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.defaults.input_format, InputFormat::Auto);
        assert_eq!(cfg.caster.date_format, DEFAULT_DATE_FORMAT);
        assert!(!cfg.output.no_color);
        assert!(cfg.defaults.source.is_none());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digester.toml");
        fs::write(
            &path,
            "[defaults]\nsource = \"SourceTest\"\ninput_format = \"json\"\n\n[output]\npretty = true\n",
        )
        .unwrap();

        let cfg = AppConfig::load(Some(&path), false).unwrap();
        assert_eq!(cfg.defaults.source.as_deref(), Some("SourceTest"));
        assert_eq!(cfg.defaults.input_format, InputFormat::Json);
        assert!(cfg.output.pretty);
        assert_eq!(cfg.caster.date_format, DEFAULT_DATE_FORMAT);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.toml");
        assert!(AppConfig::load(Some(&absent), false).is_err());
        assert_eq!(AppConfig::load(Some(&absent), true).unwrap(), AppConfig::default());
    }

    #[test]
    fn written_defaults_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digester.toml");
        fs::write(&path, toml::to_string_pretty(&AppConfig::default()).unwrap()).unwrap();
        assert_eq!(AppConfig::load(Some(&path), false).unwrap(), AppConfig::default());
    }

    #[test]
    fn get_known_and_unknown_keys() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.get("defaults.input_format").as_deref(), Some("auto"));
        assert_eq!(cfg.get("output.pretty").as_deref(), Some("false"));
        assert!(cfg.get("does.not.exist").is_none());
        assert!(AppConfig::KEYS.iter().all(|k| cfg.get(k).is_some()));
    }

    #[test]
    fn config_path_is_not_empty() {
        assert!(!AppConfig::config_path().as_os_str().is_empty());
    }
}
