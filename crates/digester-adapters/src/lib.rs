//! Infrastructure adapters for Digester.
//!
//! This crate implements the ports defined in `digester-core::application::ports`
//! and contains every parsing backend and all file I/O.

pub mod caster;
pub mod html;
pub mod input;
pub mod mapping_loader;
pub mod query;

use digester_core::application::Digester;

// Re-export commonly used adapters
pub use caster::{DEFAULT_DATE_FORMAT, DefaultCaster};
pub use html::ScraperSelector;
pub use input::{InputFormat, parse_properties, read_input};
pub use mapping_loader::MappingLoader;
pub use query::JsonPathQuery;

/// Digester wired with the default adapters.
pub fn default_digester() -> Digester {
    build_digester(DefaultCaster::new())
}

/// Digester wired with `caster` and the default query and selector.
pub fn build_digester(caster: DefaultCaster) -> Digester {
    Digester::new(
        Box::new(caster),
        Box::new(JsonPathQuery::new()),
        Box::new(ScraperSelector::new()),
    )
}
