//! JSON-path query adapters.

mod json_path;

pub use json_path::{JsonPathQuery, is_definite};
