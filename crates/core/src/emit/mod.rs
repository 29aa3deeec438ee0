//! TypeScript emission.
//!
//! The route model is lowered to a small TypeScript AST ([`ast`]) and printed
//! through the [`Emit`] trait:
//!
//! - [`typescript`]: schema nodes to types, plus the shared declarations
//! - [`bindings`]: per-route `Args`/`Response` types, key builders, options
//!   factories and hooks
//! - [`client`]: the low-level `client.ts` runtime and `ApiClient` tree
//! - [`module`]: grouping and file assembly

pub mod ast;
pub mod bindings;
pub mod client;
pub mod module;
pub mod printer;
pub mod typescript;
mod utils;

pub use bindings::{BindingEmitter, RouteBindings, accessor_method, accessor_path, query_key};
pub use module::{GeneratedFile, emit_files, group_routes, group_stem};
pub use printer::Emit;
pub use typescript::{TypeEmitter, TypeNames};
