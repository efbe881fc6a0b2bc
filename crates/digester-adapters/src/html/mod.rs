//! HTML parsing and selection adapters.
//!
//! Documents are parsed with `scraper` into detached [`HtmlElement`]s that
//! keep their outer HTML, so a selection can be re-parsed and queried again
//! by nested conversions.
//!
//! [`HtmlElement`]: digester_core::domain::HtmlElement

pub mod document;
mod selector;
pub mod xpath;

pub use document::parse_document;
pub use selector::ScraperSelector;
