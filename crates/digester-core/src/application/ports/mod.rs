//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `digester-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by the engine, implemented by infrastructure
//!   - `Caster`: Value coercion (maps, JSON, dates, HTML parsing)
//!   - `JsonQuery`: JSON-path evaluation
//!   - `HtmlSelector`: Element selection by id, CSS or XPath
//!
//! - **Driving (Input) Ports**: Called by the external world
//!   - `Digester` conversion entrypoints, used by the CLI

pub mod output;

pub use output::{Caster, HtmlSelector, JsonQuery};

#[cfg(test)]
pub use output::{MockHtmlSelector, MockJsonQuery};
