//! Application layer - use cases and port definitions.
//!
//! Orchestrates the domain types through the output ports. Contains no
//! parsing code of its own.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::{Caster, HtmlSelector, JsonQuery};
pub use services::{
    Castable, Conversion, Digester, Entity, FieldBinding, FieldSlot, Json, MappingRegistry,
    Resolution, SchemaBuilder, TargetSchema, ValueResolver,
};
