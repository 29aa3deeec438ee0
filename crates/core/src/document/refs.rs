//! Reference graph over `components.schemas`.
//!
//! Schema references stay symbolic (`Reference(name)`) in the canonical
//! model, so cycles never cause infinite expansion. This module still needs
//! the graph to:
//! - reject dangling or unsupported `$ref`s up front,
//! - flag schemas that participate in a cycle (recursive named types),
//! - reject pure alias cycles, which have no structure to emit,
//! - spread failures to every schema that depends on a broken one.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use super::pointer::{ComponentKind, Pointer, parse_component_ref};
use super::spec::{AdditionalProperties, Schema};
use crate::error::{GenerateError, Result};

/// Outgoing schema references of every named component schema.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    edges: IndexMap<String, IndexSet<String>>,
    recursive: IndexSet<String>,
    failures: IndexMap<String, GenerateError>,
}

impl ReferenceGraph {
    /// Build the graph and run every structural check.
    pub fn build(schemas: &IndexMap<String, Schema>) -> Self {
        let mut graph = Self::default();
        let mut aliases = IndexSet::new();

        for (name, schema) in schemas {
            let pointer = Pointer::component(ComponentKind::Schemas, name);
            let mut refs = Vec::new();
            collect_refs(schema, &pointer, &mut refs);

            let mut targets = IndexSet::new();
            for (reference, at) in refs {
                match schema_ref_target(&reference, &at, schemas) {
                    Ok(target) => {
                        targets.insert(target);
                    }
                    Err(err) => {
                        graph.failures.entry(name.clone()).or_insert(err);
                    }
                }
            }
            if is_alias(schema) {
                aliases.insert(name.clone());
            }
            graph.edges.insert(name.clone(), targets);
        }

        for component in graph.strongly_connected() {
            let cyclic = component.len() > 1
                || component
                    .iter()
                    .any(|name| graph.edges.get(name).is_some_and(|e| e.contains(name)));
            if !cyclic {
                continue;
            }
            if component.iter().all(|name| aliases.contains(name)) {
                for name in &component {
                    let pointer = Pointer::component(ComponentKind::Schemas, name);
                    graph.failures.entry(name.clone()).or_insert_with(|| {
                        GenerateError::schema(
                            pointer.to_string(),
                            format!(
                                "reference cycle made only of aliases: {}",
                                component.iter().cloned().collect::<Vec<_>>().join(" -> ")
                            ),
                        )
                    });
                }
            } else {
                debug!(schemas = ?component, "Detected recursive schema group.");
                graph.recursive.extend(component);
            }
        }

        let failures = std::mem::take(&mut graph.failures);
        graph.failures = graph.propagate(failures);
        graph
    }

    /// Whether `name` is part of a reference cycle.
    pub fn is_recursive(&self, name: &str) -> bool {
        self.recursive.contains(name)
    }

    /// Schemas that failed a structural check (or depend on one that did).
    pub fn failures(&self) -> &IndexMap<String, GenerateError> {
        &self.failures
    }

    /// Direct schema dependencies of `name`.
    pub fn dependencies(&self, name: &str) -> impl Iterator<Item = &String> {
        self.edges.get(name).into_iter().flatten()
    }

    /// Mark every schema that (transitively) references a failed one as failed.
    ///
    /// Existing entries are kept; dependents get a `ReferenceError` naming the
    /// broken dependency. Result order follows declaration order.
    pub fn propagate(
        &self,
        mut failed: IndexMap<String, GenerateError>,
    ) -> IndexMap<String, GenerateError> {
        loop {
            let mut newly_failed = Vec::new();
            for (name, targets) in &self.edges {
                if failed.contains_key(name) {
                    continue;
                }
                if let Some(broken) = targets.iter().find(|t| failed.contains_key(*t)) {
                    newly_failed.push((name.clone(), broken.clone()));
                }
            }
            if newly_failed.is_empty() {
                break;
            }
            for (name, broken) in newly_failed {
                let pointer = Pointer::component(ComponentKind::Schemas, &name);
                failed.insert(
                    name,
                    GenerateError::reference(
                        format!("#/components/schemas/{broken}"),
                        pointer.to_string(),
                        format!("referenced schema `{broken}` is invalid"),
                    ),
                );
            }
        }

        let order: IndexMap<_, _> = self
            .edges
            .keys()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        failed.sort_by_cached_key(|name, _| order.get(name.as_str()).copied().unwrap_or(usize::MAX));
        failed
    }

    /// Tarjan's algorithm, visiting roots in declaration order.
    fn strongly_connected(&self) -> Vec<Vec<String>> {
        struct State<'a> {
            graph: &'a ReferenceGraph,
            index: usize,
            indices: IndexMap<&'a str, usize>,
            lowlink: IndexMap<&'a str, usize>,
            stack: Vec<&'a str>,
            on_stack: IndexSet<&'a str>,
            components: Vec<Vec<String>>,
        }

        fn visit<'a>(state: &mut State<'a>, node: &'a str) {
            state.indices.insert(node, state.index);
            state.lowlink.insert(node, state.index);
            state.index += 1;
            state.stack.push(node);
            state.on_stack.insert(node);

            let graph = state.graph;
            for target in graph.dependencies(node) {
                let target = target.as_str();
                if !state.indices.contains_key(target) {
                    visit(state, target);
                    let low = state.lowlink[target].min(state.lowlink[node]);
                    state.lowlink.insert(node, low);
                } else if state.on_stack.contains(target) {
                    let low = state.indices[target].min(state.lowlink[node]);
                    state.lowlink.insert(node, low);
                }
            }

            if state.lowlink[node] == state.indices[node] {
                let mut component = Vec::new();
                while let Some(member) = state.stack.pop() {
                    state.on_stack.swap_remove(member);
                    component.push(member.to_string());
                    if member == node {
                        break;
                    }
                }
                component.reverse();
                state.components.push(component);
            }
        }

        let mut state = State {
            graph: self,
            index: 0,
            indices: IndexMap::new(),
            lowlink: IndexMap::new(),
            stack: Vec::new(),
            on_stack: IndexSet::new(),
            components: Vec::new(),
        };
        for name in self.edges.keys() {
            if !state.indices.contains_key(name.as_str()) {
                visit(&mut state, name);
            }
        }
        state.components
    }
}

/// Resolve a schema `$ref` to the target component name.
pub fn schema_ref_target(
    reference: &str,
    at: &Pointer,
    schemas: &IndexMap<String, Schema>,
) -> Result<String> {
    let (kind, name) = parse_component_ref(reference, at)?;
    if kind != ComponentKind::Schemas {
        return Err(GenerateError::reference(
            reference,
            at.to_string(),
            format!("a schema cannot reference `{}` components", kind.as_str()),
        ));
    }
    if !schemas.contains_key(&name) {
        return Err(GenerateError::reference(
            reference,
            at.to_string(),
            format!("schema `{name}` does not exist"),
        ));
    }
    Ok(name)
}

/// A schema that is nothing but a pointer to another schema.
fn is_alias(schema: &Schema) -> bool {
    if schema.ref_path.is_some() {
        return true;
    }
    match &schema.all_of {
        Some(members) => {
            schema.properties.is_none()
                && members.iter().filter(|m| !m.is_annotation_only()).count() == 1
                && members.iter().any(|m| m.ref_path.is_some())
        }
        None => false,
    }
}

/// Collect every `$ref` in `schema` with the pointer of the node holding it.
pub fn collect_refs(schema: &Schema, at: &Pointer, out: &mut Vec<(String, Pointer)>) {
    if let Some(reference) = &schema.ref_path {
        out.push((reference.clone(), at.clone()));
    }
    if let Some(properties) = &schema.properties {
        let base = at.join("properties");
        for (name, property) in properties {
            collect_refs(property, &base.join(name.as_str()), out);
        }
    }
    if let Some(items) = &schema.items {
        collect_refs(items, &at.join("items"), out);
    }
    if let Some(AdditionalProperties::Schema(additional)) = &schema.additional_properties {
        collect_refs(additional, &at.join("additionalProperties"), out);
    }
    for (keyword, members) in [
        ("prefixItems", &schema.prefix_items),
        ("allOf", &schema.all_of),
        ("anyOf", &schema.any_of),
        ("oneOf", &schema.one_of),
    ] {
        if let Some(members) = members {
            let base = at.join(keyword);
            for (i, member) in members.iter().enumerate() {
                collect_refs(member, &base.join_index(i), out);
            }
        }
    }
}
