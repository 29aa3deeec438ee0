//! Per-route client bindings: `<Name>Args`, `<Name>Response`, the cache-key
//! builder, the options factory and the hook wrapper.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use super::ast::{
    ObjectEntry, TsExpr, TsFunction, TsLiteral, TsParam, TsPrimitive, TsProp, TsStmt, TsType,
    TsTypeDef, TypeDefKind,
};
use super::typescript::{TypeEmitter, args_type_name, response_type_name};
use super::utils::{make_string_record, needs_bracket_notation};
use crate::route::{
    OperationKind, ParamLocation, ResponseVariant, Route, StatusCode, colon_template,
};

/// Declarations emitted for one route.
#[derive(Debug, Clone)]
pub struct RouteBindings {
    /// Query or mutation.
    pub kind: OperationKind,
    /// `Args` and `Response` declarations.
    pub types: Vec<TsTypeDef>,
    /// Key builder, options factory and hook.
    pub functions: Vec<TsFunction>,
    /// Component schemas the declarations mention.
    pub schema_refs: IndexSet<String>,
}

/// Cache key for a route as the generated key builder would produce it.
///
/// `args` is ignored for routes that take no arguments.
pub fn query_key(route: &Route, args: Option<&Value>) -> Value {
    let template = Value::String(route.colon_template());
    if route.has_args() {
        let args = args
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        Value::Array(vec![template, args])
    } else {
        Value::Array(vec![template])
    }
}

/// Property chain from the client root to a route's path node.
///
/// Static segments are kept as written, placeholder segments use the `:param`
/// form, and the root path maps to `index`.
pub fn accessor_path(path: &str) -> Vec<String> {
    let segments: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(colon_template)
        .collect();
    if segments.is_empty() {
        vec!["index".to_string()]
    } else {
        segments
    }
}

/// Name of the method a route is exposed under on its path node (`$get`).
pub fn accessor_method(route: &Route) -> String {
    format!("${}", route.method.as_lower())
}

/// Whether one success status declares several content types, so responses
/// carry a `contentType` tag.
pub fn is_content_tagged(route: &Route) -> bool {
    group_by_status(&route.success_variants())
        .values()
        .any(|variants| variants.len() > 1)
}

fn group_by_status<'r>(
    variants: &[&'r ResponseVariant],
) -> IndexMap<StatusCode, Vec<&'r ResponseVariant>> {
    let mut groups: IndexMap<StatusCode, Vec<&ResponseVariant>> = IndexMap::new();
    for &variant in variants {
        groups.entry(variant.status).or_default().push(variant);
    }
    groups
}

fn member_access(object: TsExpr, prop: &str) -> TsExpr {
    if needs_bracket_notation(prop) {
        object.index(TsExpr::string(prop))
    } else {
        object.member(prop)
    }
}

fn client_call(route: &Route) -> TsExpr {
    let node = accessor_path(&route.path)
        .iter()
        .fold(TsExpr::ident("client"), |object, segment| {
            member_access(object, segment)
        });
    node.member(accessor_method(route))
}

/// Builds [`RouteBindings`] for routes.
#[derive(Debug, Clone, Copy)]
pub struct BindingEmitter<'a> {
    types: TypeEmitter<'a>,
}

impl<'a> BindingEmitter<'a> {
    /// Emitter using `types` for schema nodes.
    pub fn new(types: TypeEmitter<'a>) -> Self {
        Self { types }
    }

    /// Every declaration for `route`.
    pub fn route(&self, route: &Route) -> RouteBindings {
        let mut schema_refs = IndexSet::new();
        let types = vec![
            self.args_def(route, &mut schema_refs),
            self.response_def(route, &mut schema_refs),
        ];
        let functions = match route.kind() {
            OperationKind::Query => vec![
                query_key_fn(route),
                query_options_fn(route),
                query_hook_fn(route),
            ],
            OperationKind::Mutation => vec![
                mutation_key_fn(route),
                mutation_options_fn(route),
                mutation_hook_fn(route),
            ],
        };
        RouteBindings {
            kind: route.kind(),
            types,
            functions,
            schema_refs,
        }
    }

    /// `<Name>Args`: one section per parameter location plus the body.
    fn args_def(&self, route: &Route, refs: &mut IndexSet<String>) -> TsTypeDef {
        let mut properties = Vec::new();
        for location in ParamLocation::ALL {
            let params: Vec<_> = route.params_in(location).collect();
            if params.is_empty() {
                continue;
            }
            let props = params
                .iter()
                .map(|param| {
                    param.schema.collect_references(refs);
                    TsProp::new(param.name.clone(), self.types.ts_type(&param.schema))
                        .optional(!param.required)
                        .doc(param.description.clone())
                })
                .collect();
            let optional = params.iter().all(|param| !param.required);
            properties.push(
                TsProp::new(location.args_key(), TsType::object(props)).optional(optional),
            );
        }
        if let Some(body) = &route.request_body
            && let Some(content) = body.preferred()
        {
            content.schema.collect_references(refs);
            properties.push(
                TsProp::new(content.kind.args_key(), self.types.ts_type(&content.schema))
                    .optional(!body.required),
            );
        }

        let name = args_type_name(route);
        let kind = if properties.is_empty() {
            TypeDefKind::TypeAlias {
                ty: make_string_record(TsType::Primitive(TsPrimitive::Never)),
            }
        } else {
            TypeDefKind::Interface {
                properties,
                index: None,
            }
        };
        TsTypeDef {
            name,
            kind,
            doc: None,
        }
    }

    /// `<Name>Response`: a union over success statuses.
    fn response_def(&self, route: &Route, refs: &mut IndexSet<String>) -> TsTypeDef {
        let success = route.success_variants();
        let ty = if success.is_empty() {
            TsType::object(vec![
                TsProp::new("status", TsType::Primitive(TsPrimitive::Number)),
                TsProp::new("data", TsType::Primitive(TsPrimitive::Unknown)),
            ])
        } else {
            let mut entries = Vec::new();
            for (status, variants) in group_by_status(&success) {
                let tagged = variants.len() > 1;
                for variant in variants {
                    let mut props = vec![TsProp::new("status", status_type(status))];
                    if tagged && let Some(content_type) = &variant.content_type {
                        props.push(TsProp::new(
                            "contentType",
                            TsType::Literal(TsLiteral::String(content_type.clone())),
                        ));
                    }
                    let data = match &variant.schema {
                        Some(schema) => {
                            schema.collect_references(refs);
                            self.types.ts_type(schema)
                        }
                        None => TsType::Primitive(TsPrimitive::Undefined),
                    };
                    props.push(TsProp::new("data", data));
                    entries.push(TsType::object(props));
                }
            }
            if entries.len() == 1 {
                entries.remove(0)
            } else {
                TsType::Union(entries)
            }
        };
        TsTypeDef {
            name: response_type_name(route),
            kind: TypeDefKind::TypeAlias { ty },
            doc: None,
        }
    }
}

fn status_type(status: StatusCode) -> TsType {
    match status {
        StatusCode::Exact(code) => TsType::Literal(TsLiteral::Int(i64::from(code))),
        StatusCode::Range(_) | StatusCode::Default => TsType::Primitive(TsPrimitive::Number),
    }
}

fn client_param() -> TsParam {
    TsParam::new("client", TsType::named("ApiClient"))
}

fn client_options_param() -> TsParam {
    TsParam::new("clientOptions", TsType::named("ClientRequestOptions")).optional()
}

/// `args: <Name>Args`, defaulted to `{}` when every part is optional.
fn args_param(route: &Route) -> Option<TsParam> {
    if !route.has_args() {
        return None;
    }
    let param = TsParam::new("args", TsType::named(args_type_name(route)));
    Some(if route.args_optional() {
        param.with_default("{}")
    } else {
        param
    })
}

/// Argument passed to the client method: the caller's args or `{}`.
fn args_value(route: &Route) -> TsExpr {
    if route.has_args() {
        TsExpr::ident("args")
    } else {
        TsExpr::Object(vec![])
    }
}

fn hook_doc(route: &Route) -> String {
    let mut doc = route
        .summary
        .clone()
        .unwrap_or_else(|| format!("{} {}", route.method, route.path));
    if route.deprecated {
        doc.push_str("\n\n@deprecated");
    }
    doc
}

fn exported_fn(name: String, params: Vec<TsParam>, body: TsExpr) -> TsFunction {
    TsFunction {
        name,
        type_params: vec![],
        params,
        return_type: None,
        body: vec![TsStmt::Return(body)],
        is_export: true,
        is_arrow: false,
        doc: None,
    }
}

fn query_key_name(route: &Route) -> String {
    format!("get{}QueryKey", route.name)
}

fn query_options_name(route: &Route) -> String {
    format!("get{}QueryOptions", route.name)
}

fn mutation_key_name(route: &Route) -> String {
    format!("get{}MutationKey", route.name)
}

fn mutation_options_name(route: &Route) -> String {
    format!("get{}MutationOptions", route.name)
}

/// `export const get<Name>QueryKey = (args) => ["/path/:id", args] as const;`
fn query_key_fn(route: &Route) -> TsFunction {
    let mut items = vec![TsExpr::string(route.colon_template())];
    let params: Vec<TsParam> = args_param(route).into_iter().collect();
    if !params.is_empty() {
        items.push(TsExpr::ident("args"));
    }
    TsFunction {
        is_arrow: true,
        ..exported_fn(query_key_name(route), params, TsExpr::const_array(items))
    }
}

fn query_options_fn(route: &Route) -> TsFunction {
    let mut params = vec![client_param()];
    let mut key_args = Vec::new();
    if let Some(args) = args_param(route) {
        params.push(args);
        key_args.push(TsExpr::ident("args"));
    }
    params.push(client_options_param());

    let signal_param = TsParam {
        name: "{ signal }".into(),
        ty: Some(TsType::object(vec![TsProp::new(
            "signal",
            TsType::named("AbortSignal"),
        )])),
        optional: false,
        default: None,
    };
    let request = TsExpr::call(
        client_call(route),
        vec![
            args_value(route),
            TsExpr::Object(vec![
                ObjectEntry::Spread(TsExpr::ident("clientOptions")),
                ObjectEntry::Shorthand("signal".into()),
            ]),
        ],
    );
    let body = TsExpr::Object(vec![
        ObjectEntry::Prop(
            "queryKey".into(),
            TsExpr::call(TsExpr::ident(query_key_name(route)), key_args),
        ),
        ObjectEntry::Prop(
            "queryFn".into(),
            TsExpr::Arrow {
                params: vec![signal_param],
                body: Box::new(request),
            },
        ),
    ]);
    exported_fn(query_options_name(route), params, body)
}

fn query_hook_fn(route: &Route) -> TsFunction {
    let response = response_type_name(route);
    let options_type = TsType::object(vec![
        TsProp::new(
            "query",
            TsType::named(format!(
                "Omit<UseQueryOptions<{response}, Error, TData>, \"queryKey\" | \"queryFn\">"
            )),
        )
        .optional(true),
        TsProp::new("client", TsType::named("ClientRequestOptions")).optional(true),
    ]);

    let mut params = vec![client_param()];
    let mut factory_args = vec![TsExpr::ident("client")];
    if let Some(args) = args_param(route) {
        params.push(args);
        factory_args.push(TsExpr::ident("args"));
    }
    params.push(TsParam::new("options", options_type).optional());
    factory_args.push(TsExpr::ident("options").optional_member("client"));

    let body = TsExpr::call(
        TsExpr::ident("useQuery"),
        vec![TsExpr::Object(vec![
            ObjectEntry::Spread(TsExpr::call(
                TsExpr::ident(query_options_name(route)),
                factory_args,
            )),
            ObjectEntry::Spread(TsExpr::ident("options").optional_member("query")),
        ])],
    );
    TsFunction {
        type_params: vec![format!("TData = {response}")],
        doc: Some(hook_doc(route)),
        ..exported_fn(format!("use{}", route.name), params, body)
    }
}

/// `export const get<Name>MutationKey = () => ["/path/:id", "POST"] as const;`
fn mutation_key_fn(route: &Route) -> TsFunction {
    let items = vec![
        TsExpr::string(route.colon_template()),
        TsExpr::string(route.method.as_str()),
    ];
    TsFunction {
        is_arrow: true,
        ..exported_fn(mutation_key_name(route), vec![], TsExpr::const_array(items))
    }
}

fn mutation_options_fn(route: &Route) -> TsFunction {
    let params = vec![client_param(), client_options_param()];
    let fn_params = if route.has_args() {
        vec![TsParam::new("args", TsType::named(args_type_name(route)))]
    } else {
        vec![]
    };
    let request = TsExpr::call(
        client_call(route),
        vec![args_value(route), TsExpr::ident("clientOptions")],
    );
    let body = TsExpr::Object(vec![
        ObjectEntry::Prop(
            "mutationKey".into(),
            TsExpr::call(TsExpr::ident(mutation_key_name(route)), vec![]),
        ),
        ObjectEntry::Prop(
            "mutationFn".into(),
            TsExpr::Arrow {
                params: fn_params,
                body: Box::new(request),
            },
        ),
    ]);
    exported_fn(mutation_options_name(route), params, body)
}

fn mutation_hook_fn(route: &Route) -> TsFunction {
    let response = response_type_name(route);
    let variables = if route.has_args() {
        args_type_name(route)
    } else {
        "void".to_string()
    };
    let options_type = TsType::object(vec![
        TsProp::new(
            "mutation",
            TsType::named(format!(
                "Omit<UseMutationOptions<{response}, Error, {variables}, TContext>, \"mutationKey\" | \"mutationFn\">"
            )),
        )
        .optional(true),
        TsProp::new("client", TsType::named("ClientRequestOptions")).optional(true),
    ]);
    let params = vec![
        client_param(),
        TsParam::new("options", options_type).optional(),
    ];
    let body = TsExpr::call(
        TsExpr::ident("useMutation"),
        vec![TsExpr::Object(vec![
            ObjectEntry::Spread(TsExpr::call(
                TsExpr::ident(mutation_options_name(route)),
                vec![
                    TsExpr::ident("client"),
                    TsExpr::ident("options").optional_member("client"),
                ],
            )),
            ObjectEntry::Spread(TsExpr::ident("options").optional_member("mutation")),
        ])],
    );
    TsFunction {
        type_params: vec!["TContext = unknown".to_string()],
        doc: Some(hook_doc(route)),
        ..exported_fn(format!("use{}", route.name), params, body)
    }
}
