//! The generation pass: document in, files out.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::EmitConfig;
use crate::document::{Document, DocumentSource, load};
use crate::emit::{GeneratedFile, accessor_method, accessor_path, emit_files};
use crate::error::{GenerateError, Result};
use crate::route::{Failure, FailureSubject, RouteModel, build_model};

/// Everything a pass produced.
#[derive(Debug)]
pub struct GeneratedOutput {
    /// Resolved schemas, routes and failures.
    pub model: RouteModel,
    /// Rendered files in output order.
    pub files: Vec<GeneratedFile>,
}

impl GeneratedOutput {
    /// Schemas and routes that were skipped.
    pub fn failures(&self) -> &[Failure] {
        &self.model.failures
    }
}

/// Build the route model for a parsed document and render every file.
pub fn generate(doc: &Document, config: &EmitConfig) -> GeneratedOutput {
    let mut model = build_model(doc);
    drop_accessor_conflicts(&mut model);
    let files = emit_files(&model, config);
    info!(
        routes = model.routes.len(),
        schemas = model.schemas.len(),
        failures = model.failures.len(),
        files = files.len(),
        "Generated client bindings."
    );
    GeneratedOutput { model, files }
}

/// Load a document from any source and generate.
pub async fn generate_from_source(
    source: &DocumentSource,
    config: &EmitConfig,
) -> Result<GeneratedOutput> {
    let doc = load(source).await?;
    Ok(generate(&doc, config))
}

/// Two routes must not land on the same client member (`/` and `/index`
/// both map to `client.index`). Later routes lose.
fn drop_accessor_conflicts(model: &mut RouteModel) {
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut failures = Vec::new();
    model.routes.retain(|route| {
        let mut accessor = accessor_path(&route.path);
        accessor.push(accessor_method(route));
        let accessor = accessor.join(".");
        if let Some(owner) = owners.get(&accessor) {
            warn!(method = %route.method, path = %route.path, accessor = %accessor, "Skipping route with a conflicting client accessor.");
            failures.push(Failure {
                subject: FailureSubject::Route {
                    method: route.method,
                    path: route.path.clone(),
                },
                error: GenerateError::RouteModel {
                    method: route.method.as_str().to_string(),
                    path: route.path.clone(),
                    message: format!("client accessor `{accessor}` is already used by {owner}"),
                },
            });
            return false;
        }
        owners.insert(accessor, format!("{} {}", route.method, route.path));
        true
    });
    model.failures.extend(failures);
}
