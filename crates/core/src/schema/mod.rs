//! Schema resolver: canonical [`SchemaNode`]s for inline and named schemas.

mod node;
mod resolve;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

pub use node::{Additional, Field, LiteralValue, PrimitiveKind, SchemaNode};
pub use resolve::SchemaResolver;

use crate::document::{ComponentKind, Document, Pointer};
use crate::error::GenerateError;

/// A resolved `components.schemas` entry.
#[derive(Debug, Clone, Serialize)]
pub struct NamedSchema {
    /// Name as declared in the document.
    pub name: String,
    /// Canonical form.
    pub node: SchemaNode,
    /// Participates in a reference cycle.
    pub recursive: bool,
    /// Schema description, rendered as a doc comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Resolve every component schema in declaration order.
///
/// Schemas that fail, and every schema that references a failed one, are
/// returned in the second map instead of the first.
pub fn resolve_components(
    doc: &Document,
) -> (IndexMap<String, NamedSchema>, IndexMap<String, GenerateError>) {
    let resolver = SchemaResolver::new(doc.schemas());
    let mut resolved = IndexMap::new();
    let mut failed: IndexMap<String, GenerateError> = doc
        .graph
        .failures()
        .iter()
        .map(|(name, err)| (name.clone(), err.clone()))
        .collect();

    for (name, schema) in doc.schemas() {
        if failed.contains_key(name) {
            continue;
        }
        let pointer = Pointer::component(ComponentKind::Schemas, name);
        match resolver.resolve(schema, &pointer) {
            Ok(node) => {
                resolved.insert(
                    name.clone(),
                    NamedSchema {
                        name: name.clone(),
                        node,
                        recursive: doc.graph.is_recursive(name),
                        description: schema.description.clone(),
                    },
                );
            }
            Err(err) => {
                failed.insert(name.clone(), err);
            }
        }
    }
    let failed = doc.graph.propagate(failed);

    resolved.retain(|name, _| !failed.contains_key(name));
    for (name, err) in &failed {
        warn!(schema = %name, error = %err, "Skipping invalid schema.");
    }
    debug!(
        resolved = resolved.len(),
        failed = failed.len(),
        "Resolved component schemas."
    );
    (resolved, failed)
}
