//! Document loader: parsing, local reference dereferencing and cycle analysis.
//!
//! Non-schema components (parameters, request bodies, responses) are
//! dereferenced eagerly through [`Document::deref_parameter`] and friends.
//! Schema references stay symbolic; [`ReferenceGraph`] validates them and
//! flags the recursive ones.

mod loader;
pub mod pointer;
mod refs;
pub mod spec;

use indexmap::IndexMap;

pub use loader::{DocumentSource, Format, load, parse_document};
pub use pointer::{ComponentKind, Pointer};
pub use refs::{ReferenceGraph, collect_refs, schema_ref_target};

use crate::error::{GenerateError, Result};
use pointer::parse_component_ref;
use spec::{Components, OpenApiDocument, Parameter, RefOr, RequestBody, Response, Schema};

/// Longest `$ref -> $ref` chain followed before giving up.
const MAX_REF_CHAIN: usize = 32;

/// A parsed document plus its schema reference graph.
#[derive(Debug)]
pub struct Document {
    /// Deserialized object model.
    pub spec: OpenApiDocument,
    /// Schema references, cycles and reference failures.
    pub graph: ReferenceGraph,
    empty_components: Components,
}

impl Document {
    /// Wrap a parsed document and build its reference graph.
    pub fn new(spec: OpenApiDocument) -> Self {
        let empty_components = Components::default();
        let graph = ReferenceGraph::build(
            &spec
                .components
                .as_ref()
                .unwrap_or(&empty_components)
                .schemas,
        );
        Self {
            spec,
            graph,
            empty_components,
        }
    }

    /// `components`, empty when the document has none.
    pub fn components(&self) -> &Components {
        self.spec.components.as_ref().unwrap_or(&self.empty_components)
    }

    /// Named component schemas in declaration order.
    pub fn schemas(&self) -> &IndexMap<String, Schema> {
        &self.components().schemas
    }

    /// Title from `info`, if any.
    pub fn title(&self) -> Option<&str> {
        self.spec.info.as_ref().and_then(|info| info.title.as_deref())
    }

    /// Follow `$ref`s to an inline parameter.
    pub fn deref_parameter<'a>(
        &'a self,
        item: &'a RefOr<Parameter>,
        at: &Pointer,
    ) -> Result<&'a Parameter> {
        deref(item, at, ComponentKind::Parameters, |name| {
            self.components().parameters.get(name)
        })
    }

    /// Follow `$ref`s to an inline request body.
    pub fn deref_request_body<'a>(
        &'a self,
        item: &'a RefOr<RequestBody>,
        at: &Pointer,
    ) -> Result<&'a RequestBody> {
        deref(item, at, ComponentKind::RequestBodies, |name| {
            self.components().request_bodies.get(name)
        })
    }

    /// Follow `$ref`s to an inline response.
    pub fn deref_response<'a>(
        &'a self,
        item: &'a RefOr<Response>,
        at: &Pointer,
    ) -> Result<&'a Response> {
        deref(item, at, ComponentKind::Responses, |name| {
            self.components().responses.get(name)
        })
    }
}

/// Follow a chain of component references until an inline item is found.
fn deref<'a, T>(
    mut item: &'a RefOr<T>,
    at: &Pointer,
    expected: ComponentKind,
    lookup: impl Fn(&str) -> Option<&'a RefOr<T>>,
) -> Result<&'a T> {
    for _ in 0..MAX_REF_CHAIN {
        match item {
            RefOr::Item(value) => return Ok(value),
            RefOr::Ref(reference) => {
                let (kind, name) = parse_component_ref(&reference.ref_path, at)?;
                if kind != expected {
                    return Err(GenerateError::reference(
                        &reference.ref_path,
                        at.to_string(),
                        format!(
                            "expected a reference into `{}`, found `{}`",
                            expected.as_str(),
                            kind.as_str()
                        ),
                    ));
                }
                item = lookup(&name).ok_or_else(|| {
                    GenerateError::reference(
                        &reference.ref_path,
                        at.to_string(),
                        format!("component `{name}` does not exist"),
                    )
                })?;
            }
        }
    }
    Err(GenerateError::reference(
        "",
        at.to_string(),
        format!("reference chain longer than {MAX_REF_CHAIN} links (cycle?)"),
    ))
}
