//! The low-level client module (`client.ts`).
//!
//! Holds the transport runtime, the `ApiClient` interface whose nested members
//! mirror path segments, and `createApiClient`, which builds that tree from a
//! table of route descriptors.

use indexmap::IndexMap;

use super::ast::{
    ObjectEntry, TsExpr, TsImport, TsLiteral, TsModule, TsParam, TsProp, TsType, TsTypeDef,
    TypeDefKind,
};
use super::bindings::{accessor_method, accessor_path, is_content_tagged};
use super::printer::Emit;
use super::typescript::{args_type_name, response_type_name};
use crate::route::Route;

const RUNTIME: &str = r#"export interface ClientConfig {
  /** Prepended to every request path. */
  baseUrl?: string;
  /** Sent with every request; a function is called once per request. */
  headers?: Record<string, string> | (() => Record<string, string> | Promise<Record<string, string>>);
  /** Replacement for the global `fetch`. */
  fetch?: typeof fetch;
  /** Base `RequestInit` merged into every request. */
  init?: RequestInit;
}

export interface ClientRequestOptions {
  headers?: Record<string, string>;
  signal?: AbortSignal;
  init?: RequestInit;
}

export class ApiError extends Error {
  status: number;
  statusText: string;
  body: unknown;

  constructor(status: number, statusText: string, body: unknown) {
    super(`HTTP ${status}: ${statusText}`);
    this.name = "ApiError";
    this.status = status;
    this.statusText = statusText;
    this.body = body;
  }
}

type BodyKind = "json" | "multipart" | "urlencoded" | "raw";

interface RouteDescriptor {
  accessor: string[];
  method: string;
  path: string;
  body?: BodyKind;
  contentType?: string;
  tagged?: boolean;
}

interface RequestArgs {
  param?: Record<string, unknown>;
  query?: Record<string, unknown>;
  header?: Record<string, unknown>;
  cookie?: Record<string, unknown>;
  json?: unknown;
  form?: unknown;
  body?: unknown;
}

interface ClientResponse {
  status: number;
  data: unknown;
  contentType?: string;
}

function present(value: unknown): boolean {
  return value !== undefined && value !== null;
}

function stringify(value: unknown): string {
  return typeof value === "object" ? JSON.stringify(value) : String(value);
}

function buildUrl(baseUrl: string, path: string, args: RequestArgs): string {
  const resolved = path.replace(/\{([^}]+)\}/g, (_, name: string) => {
    const value = args.param?.[name];
    if (!present(value)) {
      throw new Error(`Missing path parameter "${name}" for ${path}`);
    }
    return encodeURIComponent(String(value));
  });
  const search = new URLSearchParams();
  for (const [key, value] of Object.entries(args.query ?? {})) {
    if (!present(value)) continue;
    for (const item of Array.isArray(value) ? value : [value]) {
      search.append(key, stringify(item));
    }
  }
  const query = search.toString();
  return `${baseUrl}${resolved}${query ? `?${query}` : ""}`;
}

async function buildHeaders(
  config: ClientConfig,
  args: RequestArgs,
  options?: ClientRequestOptions,
): Promise<Headers> {
  const headers = new Headers(config.init?.headers);
  const shared = typeof config.headers === "function" ? await config.headers() : config.headers;
  for (const [key, value] of Object.entries(shared ?? {})) headers.set(key, value);
  for (const [key, value] of Object.entries(args.header ?? {})) {
    if (present(value)) headers.set(key, stringify(value));
  }
  const cookies = Object.entries(args.cookie ?? {})
    .filter(([, value]) => present(value))
    .map(([key, value]) => `${encodeURIComponent(key)}=${encodeURIComponent(stringify(value))}`);
  if (cookies.length > 0) headers.set("Cookie", cookies.join("; "));
  new Headers(options?.init?.headers).forEach((value, key) => headers.set(key, value));
  for (const [key, value] of Object.entries(options?.headers ?? {})) headers.set(key, value);
  return headers;
}

function appendFormValue(form: FormData, key: string, value: unknown): void {
  if (!present(value)) return;
  if (value instanceof Blob) {
    form.append(key, value);
  } else if (Array.isArray(value)) {
    for (const item of value) appendFormValue(form, key, item);
  } else {
    form.append(key, stringify(value));
  }
}

function encodeBody(route: RouteDescriptor, args: RequestArgs, headers: Headers): BodyInit | undefined {
  switch (route.body) {
    case "json":
      if (args.json === undefined) return undefined;
      headers.set("Content-Type", route.contentType ?? "application/json");
      return JSON.stringify(args.json);
    case "multipart": {
      if (args.form === undefined) return undefined;
      const form = new FormData();
      for (const [key, value] of Object.entries(args.form as Record<string, unknown>)) {
        appendFormValue(form, key, value);
      }
      return form;
    }
    case "urlencoded": {
      if (args.form === undefined) return undefined;
      const search = new URLSearchParams();
      for (const [key, value] of Object.entries(args.form as Record<string, unknown>)) {
        if (!present(value)) continue;
        for (const item of Array.isArray(value) ? value : [value]) {
          search.append(key, stringify(item));
        }
      }
      headers.set("Content-Type", "application/x-www-form-urlencoded");
      return search;
    }
    case "raw":
      if (args.body === undefined) return undefined;
      if (route.contentType) headers.set("Content-Type", route.contentType);
      return args.body as BodyInit;
    default:
      return undefined;
  }
}

function mediaType(response: Response): string {
  return (response.headers.get("Content-Type") ?? "").split(";")[0].trim();
}

async function readBody(response: Response): Promise<unknown> {
  if (response.status === 204 || response.status === 205 || response.status === 304) {
    return undefined;
  }
  const type = mediaType(response);
  if (type === "application/json" || type.endsWith("+json")) {
    const text = await response.text();
    return text ? JSON.parse(text) : undefined;
  }
  if (type.startsWith("text/")) return response.text();
  return response.blob();
}

async function request(
  config: ClientConfig,
  route: RouteDescriptor,
  args: RequestArgs,
  options?: ClientRequestOptions,
): Promise<ClientResponse> {
  const headers = await buildHeaders(config, args, options);
  const body = encodeBody(route, args, headers);
  const doFetch = config.fetch ?? fetch;
  const response = await doFetch(buildUrl(config.baseUrl ?? "", route.path, args), {
    ...config.init,
    ...options?.init,
    method: route.method,
    headers,
    body,
    signal: options?.signal ?? options?.init?.signal ?? config.init?.signal,
  });
  const data = await readBody(response);
  if (!response.ok) {
    throw new ApiError(response.status, response.statusText, data);
  }
  const result: ClientResponse = { status: response.status, data };
  if (route.tagged) result.contentType = mediaType(response);
  return result;
}"#;

const CREATE_CLIENT: &str = r#"export function createApiClient(config: ClientConfig = {}): ApiClient {
  const root: Record<string, unknown> = {};
  for (const route of routes) {
    let node = root;
    for (const segment of route.accessor) {
      node = (node[segment] ??= {}) as Record<string, unknown>;
    }
    node[`$${route.method.toLowerCase()}`] = (args: RequestArgs = {}, options?: ClientRequestOptions) =>
      request(config, route, args, options);
  }
  return root as unknown as ApiClient;
}"#;

/// A node of the accessor tree.
#[derive(Debug, Default)]
struct AccessorNode {
    methods: Vec<TsProp>,
    children: IndexMap<String, AccessorNode>,
}

impl AccessorNode {
    fn insert(&mut self, path: &[String], method: TsProp) {
        match path.split_first() {
            None => self.methods.push(method),
            Some((head, rest)) => self
                .children
                .entry(head.clone())
                .or_default()
                .insert(rest, method),
        }
    }

    /// Methods first, then child segments in first-seen order.
    fn into_props(self) -> Vec<TsProp> {
        let mut props = self.methods;
        for (segment, child) in self.children {
            props.push(TsProp::new(segment, TsType::object(child.into_props())));
        }
        props
    }
}

/// Method signature on the client tree:
/// `$get: (args: A, options?: ClientRequestOptions) => Promise<R>`.
fn method_prop(route: &Route) -> TsProp {
    let mut args = TsParam::new("args", TsType::named(args_type_name(route)));
    if route.args_optional() {
        args = args.optional();
    }
    let ty = TsType::Function {
        params: vec![
            args,
            TsParam::new("options", TsType::named("ClientRequestOptions")).optional(),
        ],
        ret: Box::new(TsType::named(format!(
            "Promise<{}>",
            response_type_name(route)
        ))),
    };
    TsProp::new(accessor_method(route), ty)
}

/// Runtime descriptor literal for one route.
fn descriptor(route: &Route) -> TsExpr {
    let mut entries = vec![
        ObjectEntry::Prop(
            "accessor".into(),
            TsExpr::Array(
                accessor_path(&route.path)
                    .into_iter()
                    .map(TsExpr::string)
                    .collect(),
            ),
        ),
        ObjectEntry::Prop("method".into(), TsExpr::string(route.method.as_str())),
        ObjectEntry::Prop("path".into(), TsExpr::string(route.path.clone())),
    ];
    if let Some(content) = route
        .request_body
        .as_ref()
        .and_then(|body| body.preferred())
    {
        entries.push(ObjectEntry::Prop(
            "body".into(),
            TsExpr::string(content.kind.runtime_name()),
        ));
        entries.push(ObjectEntry::Prop(
            "contentType".into(),
            TsExpr::string(content.content_type.clone()),
        ));
    }
    if is_content_tagged(route) {
        entries.push(ObjectEntry::Prop(
            "tagged".into(),
            TsExpr::Literal(TsLiteral::Bool(true)),
        ));
    }
    TsExpr::Object(entries)
}

/// Build `client.ts` for routes grouped by the binding module that declares
/// their `Args`/`Response` types.
pub fn client_module(groups: &[(String, Vec<&Route>)], banner: Vec<String>) -> TsModule {
    let mut imports = Vec::new();
    let mut tree = AccessorNode::default();
    let mut table = String::from("const routes: RouteDescriptor[] = [\n");

    for (stem, routes) in groups {
        if routes.is_empty() {
            continue;
        }
        let mut items = Vec::new();
        for route in routes {
            items.push(args_type_name(route));
            items.push(response_type_name(route));
            tree.insert(&accessor_path(&route.path), method_prop(route));
            table.push_str(&format!("  {},\n", descriptor(route).emit()));
        }
        imports.push(TsImport {
            items,
            from: format!("./{stem}"),
            type_only: true,
        });
    }
    table.push_str("];");

    let api_client = TsTypeDef {
        name: "ApiClient".into(),
        kind: TypeDefKind::Interface {
            properties: tree.into_props(),
            index: None,
        },
        doc: Some("Typed client; nested members mirror path segments.".into()),
    };

    TsModule {
        banner,
        imports,
        types: vec![],
        raw: vec![
            RUNTIME.to_string(),
            api_client.emit(),
            table,
            CREATE_CLIENT.to_string(),
        ],
        functions: vec![],
    }
}
