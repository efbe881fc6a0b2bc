//! Digester Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the Digester
//! mapping engine, following hexagonal (ports and adapters) architecture.
//!
//! Digester populates typed objects from semi-structured input (key/value
//! mappings, JSON documents, HTML documents, flat property lists) by following
//! per-field mapping rules keyed by a named *source*.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          digester-cli (CLI)             │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │ (Digester, ValueResolver, Registry)     │
//! │   Resolve → Cast → Apply per field      │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │   (Caster, JsonQuery, HtmlSelector)     │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    digester-adapters (Infrastructure)   │
//! │ (DefaultCaster, JsonPathQuery, Scraper) │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (RawValue, MappingRule, Record, Report) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use digester_core::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! impl Entity for Person {
//!     fn schema() -> Result<TargetSchema<Self>, DomainError> {
//!         TargetSchema::builder("person")
//!             .field("name", [MappingRule::normal("crm", "fullName")], |p: &mut Person, v: String| p.name = v)
//!             .field("age", [MappingRule::normal("crm", "age")], |p: &mut Person, v: i32| p.age = v)
//!             .build()
//!     }
//! }
//!
//! // Adapters are injected; see `digester_adapters::default_digester`.
//! let digester = Digester::new(caster, query, selector);
//! let person: Option<Person> = digester.convert("crm", input)?;
//! ```

// Domain layer (values, rules, reports, records)
pub mod domain;

// Application layer (ports and the conversion services)
pub mod application;

// Error types
pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        Castable, Conversion, Digester, Entity, FieldBinding, Json, MappingRegistry, SchemaBuilder,
        TargetSchema,
        ports::{Caster, HtmlSelector, JsonQuery},
    };
    pub use crate::domain::{
        CastError, ConversionReport, DEFAULT_SOURCE, DomainError, FieldError, FieldKind,
        FieldOutcome, HtmlElement, HtmlQuery, HtmlSelection, Mapping, MappingRule, RawValue, Record,
        RefType, Scalar,
    };
    pub use crate::error::{DigesterError, DigesterResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
