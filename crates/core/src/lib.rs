//! OpenAPI to TanStack Query client generator.
//!
//! The pass is one-directional:
//!
//! 1. [`document`] parses the OpenAPI document and checks its references
//! 2. [`schema`] resolves component and inline schemas to [`schema::SchemaNode`]s
//! 3. [`route`] builds one [`route::Route`] per (path, method)
//! 4. [`emit`] renders `schemas.ts`, `client.ts`, the binding modules and `index.ts`
//! 5. [`output`] diffs and writes the files
//!
//! [`generate::generate`] runs steps 2 to 4 for a parsed document.

pub mod config;
pub mod document;
pub mod emit;
pub mod error;
pub mod generate;
pub mod output;
pub mod route;
pub mod schema;

pub use config::{EmitConfig, GeneratorConfig, Grouping, Int64Repr};
pub use document::{Document, DocumentSource, load, parse_document};
pub use error::{GenerateError, Result};
pub use generate::{GeneratedOutput, generate, generate_from_source};
