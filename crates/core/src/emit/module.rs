//! Assembles the emitted files: `schemas.ts`, `client.ts`, one binding module
//! per route group and `index.ts`.

use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use tracing::debug;

use super::ast::{TsImport, TsModule};
use super::bindings::{BindingEmitter, RouteBindings};
use super::client::client_module;
use super::printer::Emit;
use super::typescript::{TypeEmitter, TypeNames};
use crate::config::{EmitConfig, Grouping};
use crate::route::{OperationKind, Route, RouteModel};

/// A file to write, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Relative path, e.g. `guilds.ts`.
    pub path: PathBuf,
    /// Full file text.
    pub contents: String,
}

impl GeneratedFile {
    fn new(stem: &str, module: &TsModule) -> Self {
        Self {
            path: PathBuf::from(format!("{stem}.ts")),
            contents: module.emit(),
        }
    }
}

const SCHEMAS_STEM: &str = "schemas";
const CLIENT_STEM: &str = "client";
const INDEX_STEM: &str = "index";

/// Module stem a route's bindings are written to.
pub fn group_stem(route: &Route, grouping: Grouping) -> String {
    let (raw, fallback) = match grouping {
        Grouping::Single => return "api".to_string(),
        Grouping::Segment => (
            route
                .path
                .split('/')
                .find(|segment| !segment.is_empty() && !segment.contains('{')),
            "root",
        ),
        Grouping::Tag => (route.tags.first().map(String::as_str), "default"),
    };
    let mut stem = raw.map(sanitize_stem).unwrap_or_default();
    if stem.is_empty() {
        stem = fallback.to_string();
    }
    if [SCHEMAS_STEM, CLIENT_STEM, INDEX_STEM].contains(&stem.as_str()) {
        stem.push_str("-routes");
    }
    stem
}

/// Lower-case file stem; runs of other characters become one `-`.
fn sanitize_stem(raw: &str) -> String {
    let mut stem = String::new();
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.is_empty() && !stem.ends_with('-') {
            stem.push('-');
        }
    }
    while stem.ends_with('-') {
        stem.pop();
    }
    stem
}

/// First lines of every file.
pub fn banner(config: &EmitConfig, title: Option<&str>) -> Vec<String> {
    match &config.banner {
        Some(custom) => custom.lines().map(str::to_string).collect(),
        None => vec![match title {
            Some(title) => format!(
                "This file was generated by hookgen from \"{title}\". Do not edit it by hand."
            ),
            None => "This file was generated by hookgen. Do not edit it by hand.".to_string(),
        }],
    }
}

/// Route indices bucketed by module stem, in first-seen order.
pub fn group_routes(routes: &[Route], grouping: Grouping) -> IndexMap<String, Vec<usize>> {
    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (index, route) in routes.iter().enumerate() {
        groups
            .entry(group_stem(route, grouping))
            .or_default()
            .push(index);
    }
    groups
}

/// Render every output file for a route model.
pub fn emit_files(model: &RouteModel, config: &EmitConfig) -> Vec<GeneratedFile> {
    let names = TypeNames::assign(model.schemas.keys().map(String::as_str), &model.routes);
    let types = TypeEmitter::new(&names, config.int64);
    let emitter = BindingEmitter::new(types);
    let header = banner(config, model.title.as_deref());

    let bindings: Vec<RouteBindings> = model
        .routes
        .par_iter()
        .map(|route| emitter.route(route))
        .collect();

    let mut files = Vec::new();

    let mut schemas = TsModule {
        banner: header.clone(),
        types: types.declarations(model.schemas.values()),
        ..TsModule::default()
    };
    if schemas.types.is_empty() {
        schemas.raw.push("export {};".to_string());
    }
    files.push(GeneratedFile::new(SCHEMAS_STEM, &schemas));

    let groups = group_routes(&model.routes, config.grouping);
    let client_groups: Vec<(String, Vec<&Route>)> = groups
        .iter()
        .map(|(stem, indices)| {
            (
                stem.clone(),
                indices.iter().map(|&i| &model.routes[i]).collect(),
            )
        })
        .collect();
    files.push(GeneratedFile::new(
        CLIENT_STEM,
        &client_module(&client_groups, header.clone()),
    ));

    for (stem, indices) in &groups {
        let members: Vec<&RouteBindings> = indices.iter().map(|&i| &bindings[i]).collect();
        let module = binding_module(&members, &names, config, header.clone());
        debug!(module = %stem, routes = members.len(), "Emitted binding module.");
        files.push(GeneratedFile::new(stem, &module));
    }

    let mut index = TsModule {
        banner: header,
        ..TsModule::default()
    };
    let exports = [SCHEMAS_STEM, CLIENT_STEM]
        .into_iter()
        .map(str::to_string)
        .chain(groups.keys().cloned())
        .map(|stem| format!("export * from \"./{stem}\";"))
        .collect::<Vec<_>>()
        .join("\n");
    index.raw.push(exports);
    files.push(GeneratedFile::new(INDEX_STEM, &index));

    files
}

fn binding_module(
    members: &[&RouteBindings],
    names: &TypeNames,
    config: &EmitConfig,
    banner: Vec<String>,
) -> TsModule {
    let has_queries = members
        .iter()
        .any(|bindings| bindings.kind == OperationKind::Query);
    let has_mutations = members
        .iter()
        .any(|bindings| bindings.kind == OperationKind::Mutation);

    let mut runtime_items = Vec::new();
    let mut type_items = Vec::new();
    if has_queries {
        runtime_items.push("useQuery".to_string());
        type_items.push("UseQueryOptions".to_string());
    }
    if has_mutations {
        runtime_items.push("useMutation".to_string());
        type_items.push("UseMutationOptions".to_string());
    }

    let mut imports = Vec::new();
    if !runtime_items.is_empty() {
        imports.push(TsImport {
            items: runtime_items,
            from: config.query_import.clone(),
            type_only: false,
        });
        imports.push(TsImport {
            items: type_items,
            from: config.query_import.clone(),
            type_only: true,
        });
    }
    imports.push(TsImport {
        items: vec!["ApiClient".to_string(), "ClientRequestOptions".to_string()],
        from: format!("./{CLIENT_STEM}"),
        type_only: true,
    });

    let schema_refs: IndexSet<String> = members
        .iter()
        .flat_map(|bindings| bindings.schema_refs.iter())
        .map(|name| names.get(name))
        .collect();
    if !schema_refs.is_empty() {
        imports.push(TsImport {
            items: schema_refs.into_iter().collect(),
            from: format!("./{SCHEMAS_STEM}"),
            type_only: true,
        });
    }

    TsModule {
        banner,
        imports,
        types: members
            .iter()
            .flat_map(|bindings| bindings.types.iter().cloned())
            .collect(),
        raw: vec![],
        functions: members
            .iter()
            .flat_map(|bindings| bindings.functions.iter().cloned())
            .collect(),
    }
}
