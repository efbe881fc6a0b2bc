//! Subcommand handlers. Each module exposes an `execute` function.

use std::path::Path;

use crate::error::{CliError, CliResult};

pub mod completions;
pub mod config;
pub mod convert;
pub mod init;
pub mod inspect;

/// Fail with a not-found error when `path` does not exist.
pub(crate) fn ensure_exists(what: &'static str, path: &Path) -> CliResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::PathNotFound {
            what,
            path: path.to_path_buf(),
        })
    }
}
