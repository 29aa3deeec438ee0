//! Route model construction.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use super::model::{
    BodyContent, BodyKind, Failure, FailureSubject, HttpMethod, ParamLocation, Parameter,
    RequestBody, ResponseVariant, Route, RouteModel, StatusCode, placeholders, route_key,
};
use super::naming::route_name;
use crate::document::spec::{self, MediaType, Operation, PathItem, RefOr};
use crate::document::{Document, Pointer};
use crate::error::{GenerateError, Result};
use crate::schema::{SchemaNode, SchemaResolver, resolve_components};

/// Walk the document and build the route model.
///
/// Errors scoped to one schema or route are recorded in
/// [`RouteModel::failures`]; everything else still makes it into the model.
pub fn build_model(doc: &Document) -> RouteModel {
    let (schemas, schema_failures) = resolve_components(doc);
    let builder = RouteBuilder {
        doc,
        resolver: SchemaResolver::new(doc.schemas()),
    };

    let mut failures: Vec<Failure> = schema_failures
        .iter()
        .map(|(name, error)| Failure {
            subject: FailureSubject::Schema(name.clone()),
            error: error.clone(),
        })
        .collect();
    let mut routes = Vec::new();
    let mut seen_templates: IndexMap<(String, HttpMethod), String> = IndexMap::new();
    let mut seen_names: IndexMap<String, String> = IndexMap::new();

    for (path, item) in &doc.spec.paths {
        for (method_name, operation) in item.operations() {
            let Some(method) = HttpMethod::parse(method_name) else {
                continue;
            };

            let key = (route_key(path), method);
            if let Some(first) = seen_templates.get(&key) {
                warn!(
                    method = %method,
                    path = %path,
                    first = %first,
                    "Skipping route that duplicates an earlier path."
                );
                continue;
            }
            seen_templates.insert(key, path.clone());

            let result = builder
                .build_route(path, item, method, operation)
                .and_then(|route| {
                    if let Some(first) = seen_names.get(&route.name) {
                        return Err(route_error(
                            method,
                            path,
                            format!("name `{}` is already used by {first}", route.name),
                        ));
                    }
                    Ok(route)
                })
                .and_then(|route| {
                    let broken = route
                        .references()
                        .into_iter()
                        .find(|name| schema_failures.contains_key(name));
                    match broken {
                        Some(name) => Err(GenerateError::reference(
                            format!("#/components/schemas/{name}"),
                            Pointer::root()
                                .join("paths")
                                .join(path.as_str())
                                .join(method.as_lower())
                                .to_string(),
                            format!("route depends on invalid schema `{name}`"),
                        )),
                        None => Ok(route),
                    }
                });

            match result {
                Ok(route) => {
                    debug!(method = %method, path = %path, name = %route.name, "Built route.");
                    seen_names.insert(route.name.clone(), format!("{method} {path}"));
                    routes.push(route);
                }
                Err(error) => {
                    warn!(method = %method, path = %path, error = %error, "Skipping route.");
                    failures.push(Failure {
                        subject: FailureSubject::Route {
                            method,
                            path: path.clone(),
                        },
                        error,
                    });
                }
            }
        }
    }

    RouteModel {
        title: doc.title().map(str::to_string),
        routes,
        schemas,
        failures,
    }
}

fn route_error(method: HttpMethod, path: &str, message: impl Into<String>) -> GenerateError {
    GenerateError::RouteModel {
        method: method.as_str().to_string(),
        path: path.to_string(),
        message: message.into(),
    }
}

struct RouteBuilder<'a> {
    doc: &'a Document,
    resolver: SchemaResolver<'a>,
}

impl RouteBuilder<'_> {
    fn build_route(
        &self,
        path: &str,
        item: &PathItem,
        method: HttpMethod,
        operation: &Operation,
    ) -> Result<Route> {
        let item_at = Pointer::root().join("paths").join(path);
        let at = item_at.join(method.as_lower());

        let shared = self.parameters(
            &item.parameters,
            &item_at.join("parameters"),
            method,
            path,
        )?;
        let own = self.parameters(&operation.parameters, &at.join("parameters"), method, path)?;
        let parameters = merge_parameters(shared, own);
        check_placeholders(&parameters, method, path)?;

        let request_body = match &operation.request_body {
            Some(body) => self.request_body(body, &at.join("requestBody"))?,
            None => None,
        };
        let responses = self.responses(&operation.responses, &at.join("responses"), method, path)?;

        Ok(Route {
            path: path.to_string(),
            method,
            name: route_name(method, path),
            operation_id: operation.operation_id.clone(),
            summary: operation.summary.clone().or_else(|| item.summary.clone()),
            tags: operation.tags.clone(),
            deprecated: operation.deprecated,
            parameters,
            request_body,
            responses,
        })
    }

    fn parameters(
        &self,
        declared: &[RefOr<spec::Parameter>],
        at: &Pointer,
        method: HttpMethod,
        path: &str,
    ) -> Result<Vec<Parameter>> {
        let mut out: Vec<Parameter> = Vec::with_capacity(declared.len());
        for (i, item) in declared.iter().enumerate() {
            let param_at = at.join_index(i);
            let param = self.doc.deref_parameter(item, &param_at)?;
            let location = ParamLocation::parse(&param.location).ok_or_else(|| {
                route_error(
                    method,
                    path,
                    format!(
                        "parameter `{}` has unsupported location `{}`",
                        param.name, param.location
                    ),
                )
            })?;
            if out
                .iter()
                .any(|p| p.name == param.name && p.location == location)
            {
                return Err(route_error(
                    method,
                    path,
                    format!(
                        "parameter `{}` ({}) is declared twice",
                        param.name,
                        location.as_str()
                    ),
                ));
            }

            let schema = match (&param.schema, &param.content) {
                (Some(schema), _) => self.resolver.resolve(schema, &param_at.join("schema"))?,
                (None, Some(content)) => match content.iter().next() {
                    Some((media_type, MediaType { schema: Some(schema) })) => self
                        .resolver
                        .resolve(schema, &param_at.join("content").join(media_type.as_str()))?,
                    _ => SchemaNode::any(),
                },
                (None, None) => SchemaNode::any(),
            };

            out.push(Parameter {
                name: param.name.clone(),
                location,
                required: location == ParamLocation::Path || param.required,
                schema,
                description: param.description.clone(),
            });
        }
        Ok(out)
    }

    fn request_body(
        &self,
        body: &RefOr<spec::RequestBody>,
        at: &Pointer,
    ) -> Result<Option<RequestBody>> {
        let body = self.doc.deref_request_body(body, at)?;
        let content_at = at.join("content");
        let mut contents = Vec::with_capacity(body.content.len());
        for (content_type, media) in &body.content {
            let kind = BodyKind::from_content_type(content_type);
            let schema = match &media.schema {
                Some(schema) => self
                    .resolver
                    .resolve(schema, &content_at.join(content_type.as_str()).join("schema"))?,
                None if kind == BodyKind::Raw => SchemaNode::binary(),
                None => SchemaNode::any(),
            };
            contents.push(BodyContent {
                content_type: content_type.clone(),
                kind,
                schema,
            });
        }
        if contents.is_empty() {
            return Ok(None);
        }
        Ok(Some(RequestBody {
            required: body.required,
            contents,
        }))
    }

    fn responses(
        &self,
        declared: &IndexMap<String, RefOr<spec::Response>>,
        at: &Pointer,
        method: HttpMethod,
        path: &str,
    ) -> Result<Vec<ResponseVariant>> {
        let mut variants = Vec::new();
        for (status_key, item) in declared {
            let status = StatusCode::parse(status_key).ok_or_else(|| {
                route_error(
                    method,
                    path,
                    format!("invalid response status `{status_key}`"),
                )
            })?;
            let response_at = at.join(status_key.as_str());
            let response = self.doc.deref_response(item, &response_at)?;
            if response.content.is_empty() {
                variants.push(ResponseVariant {
                    status,
                    content_type: None,
                    schema: None,
                });
                continue;
            }
            for (content_type, media) in &response.content {
                let schema = match &media.schema {
                    Some(schema) => self.resolver.resolve(
                        schema,
                        &response_at
                            .join("content")
                            .join(content_type.as_str())
                            .join("schema"),
                    )?,
                    None => default_response_schema(content_type),
                };
                variants.push(ResponseVariant {
                    status,
                    content_type: Some(content_type.clone()),
                    schema: Some(schema),
                });
            }
        }
        Ok(variants)
    }
}

/// Schema for a response content entry that declares none.
fn default_response_schema(content_type: &str) -> SchemaNode {
    match BodyKind::from_content_type(content_type) {
        BodyKind::Json => SchemaNode::any(),
        _ if content_type.starts_with("text/") => SchemaNode::string(),
        _ => SchemaNode::binary(),
    }
}

/// Operation-level parameters replace path-level ones with the same name and
/// location in place; new ones are appended.
fn merge_parameters(shared: Vec<Parameter>, own: Vec<Parameter>) -> Vec<Parameter> {
    let mut merged = shared;
    for param in own {
        match merged
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            Some(slot) => *slot = param,
            None => merged.push(param),
        }
    }
    merged
}

fn check_placeholders(parameters: &[Parameter], method: HttpMethod, path: &str) -> Result<()> {
    let in_template: IndexSet<&str> = placeholders(path).into_iter().collect();
    let declared: IndexSet<&str> = parameters
        .iter()
        .filter(|p| p.location == ParamLocation::Path)
        .map(|p| p.name.as_str())
        .collect();

    if let Some(missing) = in_template.difference(&declared).next() {
        return Err(route_error(
            method,
            path,
            format!("placeholder `{missing}` has no path parameter"),
        ));
    }
    if let Some(extra) = declared.difference(&in_template).next() {
        return Err(route_error(
            method,
            path,
            format!("path parameter `{extra}` has no placeholder in the template"),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::schema::PrimitiveKind;

    fn model(yaml: &str) -> RouteModel {
        build_model(&parse_document(yaml, None).unwrap())
    }

    #[test]
    fn test_methods_follow_openapi_order() {
        let model = model(
            r#"
openapi: 3.1.0
paths:
  /items:
    post: { responses: { "201": { description: created } } }
    get: { responses: { "200": { description: ok } } }
  /gateway:
    get: { responses: { "200": { description: ok } } }
"#,
        );
        let names: Vec<_> = model.routes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["GetItems", "PostItems", "GetGateway"]);
    }

    #[test]
    fn test_operation_parameter_overrides_path_level() {
        let model = model(
            r#"
openapi: 3.1.0
paths:
  /guilds/{guild_id}/members:
    parameters:
      - { name: guild_id, in: path, schema: { type: string } }
      - { name: limit, in: query, schema: { type: integer } }
    get:
      parameters:
        - { name: limit, in: query, required: true, schema: { type: integer, format: int32 } }
        - { name: after, in: query, schema: { type: string } }
      responses: { "200": { description: ok } }
"#,
        );
        let route = &model.routes[0];
        let params: Vec<_> = route
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.required))
            .collect();
        assert_eq!(params, [("guild_id", true), ("limit", true), ("after", false)]);
        assert_eq!(
            route.parameters[1].schema,
            SchemaNode::Primitive {
                primitive: PrimitiveKind::Integer,
                format: Some("int32".into())
            }
        );
    }

    #[test]
    fn test_duplicate_parameter_is_route_error() {
        let model = model(
            r#"
openapi: 3.1.0
paths:
  /search:
    get:
      parameters:
        - { name: q, in: query, schema: { type: string } }
        - { name: q, in: query, schema: { type: string } }
      responses: { "200": { description: ok } }
"#,
        );
        assert!(model.routes.is_empty());
        assert_eq!(model.failures[0].error.kind(), "RouteModelError");
    }

    #[test]
    fn test_placeholder_mismatch_is_route_error() {
        let model = model(
            r#"
openapi: 3.1.0
paths:
  /users/{user_id}:
    get: { responses: { "200": { description: ok } } }
  /users:
    get:
      parameters:
        - { name: user_id, in: path, required: true, schema: { type: string } }
      responses: { "200": { description: ok } }
  /ok:
    get: { responses: { "200": { description: ok } } }
"#,
        );
        assert_eq!(model.routes.len(), 1);
        let messages: Vec<_> = model.failures.iter().map(|f| f.error.to_string()).collect();
        assert!(messages[0].contains("placeholder `user_id` has no path parameter"));
        assert!(messages[1].contains("path parameter `user_id` has no placeholder"));
    }

    #[test]
    fn test_same_colon_template_is_deduplicated() {
        let model = model(
            r#"
openapi: 3.1.0
paths:
  /posts/{id}:
    parameters: [{ name: id, in: path, schema: { type: string } }]
    get: { responses: { "200": { description: ok } } }
  /posts/{post_id}:
    parameters: [{ name: post_id, in: path, schema: { type: string } }]
    get: { responses: { "200": { description: ok } } }
    delete: { responses: { "204": { description: gone } } }
"#,
        );
        let names: Vec<_> = model.routes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["GetPostsId", "DeletePostsPostId"]);
        assert!(model.failures.is_empty());
    }

    #[test]
    fn test_name_collision_is_route_error() {
        let model = model(
            r#"
openapi: 3.1.0
paths:
  /users.json:
    get: { responses: { "200": { description: ok } } }
  /users/json:
    get: { responses: { "200": { description: ok } } }
"#,
        );
        assert_eq!(model.routes.len(), 1);
        assert!(
            model.failures[0]
                .error
                .to_string()
                .contains("name `GetUsersJson` is already used by GET /users.json")
        );
    }

    #[test]
    fn test_trailing_slash_route_is_reported() {
        let model = model(
            r#"
openapi: 3.1.0
paths:
  /users:
    get: { responses: { "200": { description: ok } } }
  /users/:
    get: { responses: { "200": { description: ok } } }
"#,
        );
        assert_eq!(model.routes.len(), 1);
        assert_eq!(model.failures.len(), 1);
        assert_eq!(model.failures[0].subject.to_string(), "route GET /users/");
        assert!(
            model.failures[0]
                .error
                .to_string()
                .contains("name `GetUsers` is already used by GET /users")
        );
    }

    #[test]
    fn test_multipart_file_is_binary() {
        let model = model(
            r#"
openapi: 3.1.0
paths:
  /uploads:
    post:
      requestBody:
        required: true
        content:
          multipart/form-data:
            schema:
              type: object
              required: [file]
              properties:
                file: { type: string, format: binary }
                caption: { type: string }
      responses: { "204": { description: done } }
"#,
        );
        let body = model.routes[0].request_body.as_ref().unwrap();
        assert!(body.required);
        let preferred = body.preferred().unwrap();
        assert_eq!(preferred.kind, BodyKind::Multipart);
        let SchemaNode::Object { fields, .. } = &preferred.schema else {
            unreachable!("multipart schema is an object");
        };
        assert_eq!(fields["file"].schema, SchemaNode::binary());
        assert_eq!(fields["caption"].schema, SchemaNode::string());
    }

    #[test]
    fn test_responses_keep_every_status_and_content_type() {
        let model = model(
            r##"
openapi: 3.1.0
paths:
  /report:
    get:
      responses:
        "200":
          description: ok
          content:
            application/json: { schema: { type: object } }
            text/csv: {}
        "204": { description: empty }
        "404": { $ref: "#/components/responses/NotFound" }
components:
  responses:
    NotFound:
      description: missing
      content:
        application/json: { schema: { type: string } }
"##,
        );
        let route = &model.routes[0];
        let summary: Vec<_> = route
            .responses
            .iter()
            .map(|v| (v.status.to_string(), v.content_type.clone()))
            .collect();
        assert_eq!(
            summary,
            [
                ("200".to_string(), Some("application/json".to_string())),
                ("200".to_string(), Some("text/csv".to_string())),
                ("204".to_string(), None),
                ("404".to_string(), Some("application/json".to_string())),
            ]
        );
        assert_eq!(route.responses[1].schema, Some(SchemaNode::string()));
        assert_eq!(route.success_variants().len(), 3);
    }

    #[test]
    fn test_route_depending_on_failed_schema_is_isolated() {
        let model = model(
            r##"
openapi: 3.1.0
paths:
  /broken:
    get:
      responses:
        "200":
          description: ok
          content:
            application/json: { schema: { $ref: "#/components/schemas/Broken" } }
  /fine:
    get: { responses: { "200": { description: ok } } }
components:
  schemas:
    Broken:
      allOf:
        - { type: object, properties: { id: { type: string } } }
        - { type: string }
"##,
        );
        let names: Vec<_> = model.routes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["GetFine"]);
        let subjects: Vec<_> = model.failures.iter().map(|f| f.subject.to_string()).collect();
        assert_eq!(subjects, ["schema Broken", "route GET /broken"]);
    }
}
