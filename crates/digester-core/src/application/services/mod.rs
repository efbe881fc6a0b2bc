//! Application services - conversion orchestration.

pub mod cast;
pub mod digester;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod traversal;

#[cfg(test)]
mod test_support;

pub use cast::{Castable, Json, cast, cast_kind};
pub use digester::{Conversion, Digester};
pub use registry::MappingRegistry;
pub use resolver::{Resolution, ValueResolver};
pub use schema::{Entity, FieldBinding, FieldSlot, SchemaBuilder, TargetSchema};
pub use traversal::{get_all_recursive, get_recursive};
