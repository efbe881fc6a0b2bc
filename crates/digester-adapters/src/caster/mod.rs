//! Value coercion adapters.

mod default;

pub use default::{DEFAULT_DATE_FORMAT, DefaultCaster};
