//! Canonical route model.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::error::GenerateError;
use crate::schema::{NamedSchema, SchemaNode};

/// HTTP methods in OpenAPI path-item order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
    /// `HEAD`
    Head,
    /// `PATCH`
    Patch,
    /// `TRACE`
    Trace,
}

impl HttpMethod {
    /// Case-insensitive lookup of a path-item key.
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "put" => Some(Self::Put),
            "post" => Some(Self::Post),
            "delete" => Some(Self::Delete),
            "options" => Some(Self::Options),
            "head" => Some(Self::Head),
            "patch" => Some(Self::Patch),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    /// Upper-case wire name (`GET`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
        }
    }

    /// Lower-case name, used for client accessors (`$get`).
    pub fn as_lower(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Trace => "trace",
        }
    }

    /// Only `GET` is a cached read; every other method is a mutation.
    pub fn kind(self) -> OperationKind {
        if self == Self::Get {
            OperationKind::Query
        } else {
            OperationKind::Mutation
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a route becomes a query hook or a mutation hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Cached read.
    Query,
    /// Write.
    Mutation,
}

/// Where a parameter travels (`in`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// Path placeholder.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
}

impl ParamLocation {
    /// Parse an `in` value.
    pub fn parse(location: &str) -> Option<Self> {
        match location {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }

    /// The `in` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }

    /// Key of this location's section in the generated args object.
    pub fn args_key(self) -> &'static str {
        match self {
            Self::Path => "param",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }

    /// Every location, in args-object order.
    pub const ALL: [ParamLocation; 4] = [Self::Path, Self::Query, Self::Header, Self::Cookie];
}

/// A path, query, header or cookie parameter.
#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    /// Name as declared.
    pub name: String,
    /// Where it travels.
    pub location: ParamLocation,
    /// Path parameters are always required.
    pub required: bool,
    /// Value type.
    pub schema: SchemaNode,
    /// Parameter description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// How a request body is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    /// `application/json` or `*+json`.
    Json,
    /// `multipart/form-data`.
    Multipart,
    /// `application/x-www-form-urlencoded`.
    UrlEncoded,
    /// Anything else.
    Raw,
}

impl BodyKind {
    /// Classify a media type (parameters such as `; charset=utf-8` are ignored).
    pub fn from_content_type(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => Self::Json,
            "multipart/form-data" => Self::Multipart,
            "application/x-www-form-urlencoded" => Self::UrlEncoded,
            other if other.ends_with("+json") => Self::Json,
            _ => Self::Raw,
        }
    }

    /// Key of the body in the generated args object.
    pub fn args_key(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Multipart | Self::UrlEncoded => "form",
            Self::Raw => "body",
        }
    }

    /// Token understood by the generated client runtime.
    pub fn runtime_name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Multipart => "multipart",
            Self::UrlEncoded => "urlencoded",
            Self::Raw => "raw",
        }
    }

    fn preference(self) -> u8 {
        match self {
            Self::Json => 0,
            Self::Multipart => 1,
            Self::UrlEncoded => 2,
            Self::Raw => 3,
        }
    }
}

/// One content type of a request body.
#[derive(Debug, Clone, Serialize)]
pub struct BodyContent {
    /// Media type as declared.
    pub content_type: String,
    /// Encoding family.
    pub kind: BodyKind,
    /// Body type.
    pub schema: SchemaNode,
}

/// A resolved request body.
#[derive(Debug, Clone, Serialize)]
pub struct RequestBody {
    /// Whether callers must send it.
    pub required: bool,
    /// One entry per declared content type, in declaration order.
    pub contents: Vec<BodyContent>,
}

impl RequestBody {
    /// The encoding the generated client sends: JSON, then multipart, then
    /// urlencoded, then the first raw type.
    pub fn preferred(&self) -> Option<&BodyContent> {
        self.contents
            .iter()
            .enumerate()
            .min_by_key(|(i, content)| (content.kind.preference(), *i))
            .map(|(_, content)| content)
    }
}

/// Response status key as declared in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// A single code.
    Exact(u16),
    /// `2XX` and friends; holds the leading digit.
    Range(u8),
    /// `default`.
    Default,
}

impl StatusCode {
    /// Parse a `responses` key; `None` for anything malformed.
    pub fn parse(status: &str) -> Option<Self> {
        if status == "default" {
            return Some(Self::Default);
        }
        let bytes = status.as_bytes();
        if bytes.len() == 3 && (1..=5).contains(&(bytes[0].wrapping_sub(b'0'))) {
            if status[1..].eq_ignore_ascii_case("xx") {
                return Some(Self::Range(bytes[0] - b'0'));
            }
            return status.parse().ok().map(Self::Exact);
        }
        None
    }

    /// Whether the key covers 2xx.
    pub fn is_success(self) -> bool {
        match self {
            Self::Exact(code) => (200..300).contains(&code),
            Self::Range(digit) => digit == 2,
            Self::Default => false,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(code) => write!(f, "{code}"),
            Self::Range(digit) => write!(f, "{digit}XX"),
            Self::Default => f.write_str("default"),
        }
    }
}

impl Serialize for StatusCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One (status, content type, schema) response entry.
///
/// `content_type` and `schema` are both absent for no-content statuses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseVariant {
    /// Status key.
    pub status: StatusCode,
    /// Media type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Body type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,
}

/// One (path, method) operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Path template with `{param}` placeholders, as declared.
    pub path: String,
    /// Operation method.
    pub method: HttpMethod,
    /// PascalCase name derived from method and path.
    pub name: String,
    /// `operationId`, kept for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Operation summary, emitted as a doc comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Operation tags; the first one picks the output module.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Marks the generated hooks `@deprecated`.
    pub deprecated: bool,
    /// Path-level and operation-level parameters merged, operation first wins.
    pub parameters: Vec<Parameter>,
    /// Request body, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Every declared response entry.
    pub responses: Vec<ResponseVariant>,
}

impl Route {
    /// Query or mutation, from the method.
    pub fn kind(&self) -> OperationKind {
        self.method.kind()
    }

    /// Path with `{param}` rewritten to `:param`; the first cache-key element.
    pub fn colon_template(&self) -> String {
        colon_template(&self.path)
    }

    /// Parameters declared at `location`, in route order.
    pub fn params_in(&self, location: ParamLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(move |param| param.location == location)
    }

    /// Whether callers pass an args object at all.
    pub fn has_args(&self) -> bool {
        !self.parameters.is_empty() || self.request_body.is_some()
    }

    /// Whether every part of the args object may be omitted.
    pub fn args_optional(&self) -> bool {
        self.parameters.iter().all(|param| !param.required)
            && self.request_body.as_ref().is_none_or(|body| !body.required)
    }

    /// Variants that make up the success type: every 2xx entry, or `default`
    /// when no 2xx entry exists.
    pub fn success_variants(&self) -> Vec<&ResponseVariant> {
        let success: Vec<_> = self
            .responses
            .iter()
            .filter(|variant| variant.status.is_success())
            .collect();
        if !success.is_empty() {
            return success;
        }
        self.responses
            .iter()
            .filter(|variant| variant.status == StatusCode::Default)
            .collect()
    }

    /// Named schemas this route's types mention.
    pub fn references(&self) -> IndexSet<String> {
        let mut out = IndexSet::new();
        for param in &self.parameters {
            param.schema.collect_references(&mut out);
        }
        if let Some(body) = &self.request_body {
            for content in &body.contents {
                content.schema.collect_references(&mut out);
            }
        }
        for variant in &self.responses {
            if let Some(schema) = &variant.schema {
                schema.collect_references(&mut out);
            }
        }
        out
    }
}

/// Rewrite `{param}` placeholders to `:param`.
pub fn colon_template(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push(':');
        out.push_str(&rest[start + 1..start + len]);
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}

/// Identity of a route's path for deduplication. Placeholder names are
/// erased, so `/posts/{id}` and `/posts/{post_id}` collide. Every other
/// character is kept, including a trailing slash.
pub fn route_key(path: &str) -> String {
    let mut key = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        key.push_str(&rest[..start]);
        key.push(':');
        rest = &rest[start + len + 1..];
    }
    key.push_str(rest);
    key
}

/// Placeholder names in a path template, in order of appearance.
pub fn placeholders(path: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        names.push(&rest[start + 1..start + len]);
        rest = &rest[start + len + 1..];
    }
    names
}

/// What a [`Failure`] is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureSubject {
    /// A named component schema.
    Schema(String),
    /// One operation.
    Route {
        /// Operation method.
        method: HttpMethod,
        /// Path template as declared.
        path: String,
    },
}

impl fmt::Display for FailureSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(name) => write!(f, "schema {name}"),
            Self::Route { method, path } => write!(f, "route {method} {path}"),
        }
    }
}

/// A schema or route skipped because of an isolated error.
#[derive(Debug, Clone)]
pub struct Failure {
    /// What was skipped.
    pub subject: FailureSubject,
    /// Why.
    pub error: GenerateError,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.error)
    }
}

/// Result of the route-model pass.
#[derive(Debug, Clone, Default)]
pub struct RouteModel {
    /// Document title, used in file banners.
    pub title: Option<String>,
    /// Routes in document order, deduplicated by (colon template, method).
    pub routes: Vec<Route>,
    /// Valid named schemas in declaration order.
    pub schemas: IndexMap<String, NamedSchema>,
    /// Schemas and routes skipped, in discovery order.
    pub failures: Vec<Failure>,
}

impl RouteModel {
    /// Failures that dropped a route.
    pub fn route_failures(&self) -> impl Iterator<Item = &Failure> {
        self.failures
            .iter()
            .filter(|failure| matches!(failure.subject, FailureSubject::Route { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colon_template() {
        assert_eq!(
            colon_template("/guilds/{guild_id}/bans/{user_id}"),
            "/guilds/:guild_id/bans/:user_id"
        );
        assert_eq!(colon_template("/gateway"), "/gateway");
        assert_eq!(colon_template("/files/{name}.{ext}"), "/files/:name.:ext");
    }

    #[test]
    fn test_route_key_ignores_placeholder_names() {
        assert_eq!(route_key("/posts/{id}"), route_key("/posts/{post_id}"));
        assert_ne!(route_key("/posts/{id}"), route_key("/posts/id"));
        assert_ne!(route_key("/users"), route_key("/users/"));
        assert_eq!(route_key("/"), "/");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            placeholders("/guilds/{guild_id}/bans/{user_id}"),
            ["guild_id", "user_id"]
        );
        assert!(placeholders("/").is_empty());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(StatusCode::parse("200"), Some(StatusCode::Exact(200)));
        assert_eq!(StatusCode::parse("2XX"), Some(StatusCode::Range(2)));
        assert_eq!(StatusCode::parse("4xx"), Some(StatusCode::Range(4)));
        assert_eq!(StatusCode::parse("default"), Some(StatusCode::Default));
        assert_eq!(StatusCode::parse("ok"), None);
        assert_eq!(StatusCode::parse("600"), None);
        assert!(StatusCode::Exact(204).is_success());
        assert!(!StatusCode::Exact(304).is_success());
    }

    #[test]
    fn test_body_kind_classification() {
        assert_eq!(BodyKind::from_content_type("application/json"), BodyKind::Json);
        assert_eq!(
            BodyKind::from_content_type("application/merge-patch+json; charset=utf-8"),
            BodyKind::Json
        );
        assert_eq!(
            BodyKind::from_content_type("multipart/form-data"),
            BodyKind::Multipart
        );
        assert_eq!(
            BodyKind::from_content_type("application/x-www-form-urlencoded"),
            BodyKind::UrlEncoded
        );
        assert_eq!(BodyKind::from_content_type("image/png"), BodyKind::Raw);
    }

    #[test]
    fn test_preferred_body_content() {
        let body = RequestBody {
            required: true,
            contents: vec![
                BodyContent {
                    content_type: "text/plain".into(),
                    kind: BodyKind::Raw,
                    schema: SchemaNode::string(),
                },
                BodyContent {
                    content_type: "multipart/form-data".into(),
                    kind: BodyKind::Multipart,
                    schema: SchemaNode::any(),
                },
            ],
        };
        assert_eq!(
            body.preferred().map(|c| c.content_type.as_str()),
            Some("multipart/form-data")
        );
    }
}
