//! OpenAPI 3.x object model for serde deserialization.
//!
//! Only the subset the generator projects is modelled. Every map is an
//! [`IndexMap`] so declaration order survives parsing: output ordering is
//! derived from it.

use indexmap::IndexMap;
use serde::Deserialize;

/// Root OpenAPI document.
#[derive(Debug, Deserialize)]
pub struct OpenApiDocument {
    /// `3.0.x` / `3.1.x`.
    pub openapi: Option<String>,
    /// Present only on Swagger 2.0 documents, which are rejected.
    pub swagger: Option<String>,
    /// Title and version.
    pub info: Option<Info>,
    /// Path templates in declaration order.
    pub paths: IndexMap<String, PathItem>,
    /// Reusable definitions.
    pub components: Option<Components>,
}

/// Document metadata.
#[derive(Debug, Deserialize)]
pub struct Info {
    /// API title, used in the generated banner.
    pub title: Option<String>,
    /// API version string.
    pub version: Option<String>,
}

/// Reusable objects addressed by `#/components/...` references.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    /// Named schemas, emitted into `schemas.ts`.
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,
    /// Shared parameters.
    #[serde(default)]
    pub parameters: IndexMap<String, RefOr<Parameter>>,
    /// Shared request bodies.
    #[serde(default)]
    pub request_bodies: IndexMap<String, RefOr<RequestBody>>,
    /// Shared responses.
    #[serde(default)]
    pub responses: IndexMap<String, RefOr<Response>>,
}

/// Either a `$ref` object or the inline value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// A `$ref` to follow.
    Ref(Reference),
    /// An inline definition.
    Item(T),
}

/// A bare `{"$ref": "..."}` object.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reference {
    /// Reference target, a URI with a JSON pointer fragment.
    #[serde(rename = "$ref")]
    pub ref_path: String,
    /// Overrides the target's summary. 3.1 allows it next to a reference.
    pub summary: Option<String>,
    /// Overrides the target's description.
    pub description: Option<String>,
}

/// A path item holding the operations for one path template.
#[derive(Debug, Default, Deserialize)]
pub struct PathItem {
    /// Summary shared by every operation on the path.
    pub summary: Option<String>,
    /// `GET` operation.
    pub get: Option<Operation>,
    /// `PUT` operation.
    pub put: Option<Operation>,
    /// `POST` operation.
    pub post: Option<Operation>,
    /// `DELETE` operation.
    pub delete: Option<Operation>,
    /// `OPTIONS` operation.
    pub options: Option<Operation>,
    /// `HEAD` operation.
    pub head: Option<Operation>,
    /// `PATCH` operation.
    pub patch: Option<Operation>,
    /// `TRACE` operation.
    pub trace: Option<Operation>,
    /// Path-level parameters shared by all operations.
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,
}

/// An API operation (endpoint).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Unique operation id. Route names ignore it.
    pub operation_id: Option<String>,
    /// Short summary, rendered into hook docs.
    pub summary: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Tags; the first one drives `tag` grouping.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Marks the generated functions `@deprecated`.
    #[serde(default)]
    pub deprecated: bool,
    /// Operation-level parameters, overriding path-level ones.
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,
    /// Request payload.
    pub request_body: Option<RefOr<RequestBody>>,
    /// Responses keyed by status code or `default`.
    #[serde(default)]
    pub responses: IndexMap<String, RefOr<Response>>,
}

/// A parameter (path, query, header or cookie).
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    /// Parameter name, case-sensitive.
    pub name: String,
    /// `path`, `query`, `header` or `cookie`.
    #[serde(rename = "in")]
    pub location: String,
    /// Path parameters are always treated as required.
    #[serde(default)]
    pub required: bool,
    /// Rendered as a property doc comment.
    pub description: Option<String>,
    /// Value schema.
    pub schema: Option<Schema>,
    /// Alternative to `schema`: a single-entry media type map.
    pub content: Option<IndexMap<String, MediaType>>,
}

/// A request body definition.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestBody {
    /// Whether the body must be sent.
    #[serde(default)]
    pub required: bool,
    /// Body description.
    pub description: Option<String>,
    /// Payload per content type.
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// A response definition.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Response description.
    pub description: Option<String>,
    /// Payload per content type.
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// Media type content (e.g., application/json).
#[derive(Debug, Clone, Deserialize)]
pub struct MediaType {
    /// Payload schema.
    pub schema: Option<Schema>,
}

/// JSON Schema definition used in OpenAPI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// The type of the schema (string, number, integer, boolean, object, array).
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,

    /// Reference to another schema.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,

    /// Display title.
    pub title: Option<String>,
    /// Rendered as a doc comment.
    pub description: Option<String>,

    /// Properties for object types, in declaration order.
    pub properties: Option<IndexMap<String, Schema>>,

    /// Required property names for object types.
    pub required: Option<Vec<String>>,

    /// Item schema for array types.
    pub items: Option<Box<Schema>>,

    /// Positional item schemas (3.1 tuples).
    pub prefix_items: Option<Vec<Schema>>,

    /// Enum values (can be strings, integers, floats, booleans, or null).
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<EnumValue>>,

    /// Union type (any of these schemas).
    pub any_of: Option<Vec<Schema>>,

    /// Union type (exactly one of these schemas).
    pub one_of: Option<Vec<Schema>>,

    /// Intersection type (all of these schemas combined).
    pub all_of: Option<Vec<Schema>>,

    /// Additional properties for object types (for Record/dict types).
    pub additional_properties: Option<AdditionalProperties>,

    /// Format hint (e.g., int64, date-time, binary).
    pub format: Option<String>,

    /// Constant value - schema matches only this exact value.
    #[serde(rename = "const")]
    pub const_value: Option<serde_json::Value>,

    /// OpenAPI 3.0 nullable flag (3.1 uses type arrays instead).
    pub nullable: Option<bool>,

    // --- Annotations, parsed so annotation-only allOf members can be recognized ---
    /// Default value (annotation).
    pub default: Option<serde_json::Value>,
    /// Example value (annotation).
    pub example: Option<serde_json::Value>,
    /// Response-only property (annotation).
    pub read_only: Option<bool>,
    /// Request-only property (annotation).
    pub write_only: Option<bool>,
    /// Deprecation flag (annotation).
    pub deprecated: Option<bool>,
}

/// Enum value can be string, integer, float, boolean, or null.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    /// String value.
    String(String),
    /// Integral number.
    Integer(i64),
    /// Non-integral number.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// `null`.
    Null,
}

/// Schema type can be a single type or an array of types (for nullable).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    /// One type name.
    Single(String),
    /// Several type names, e.g. `["string", "null"]`.
    Multiple(Vec<String>),
}

/// Additional properties can be a boolean or a schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` allows any extra keys, `false` none.
    Bool(bool),
    /// Extra keys must match this schema.
    Schema(Box<Schema>),
}

impl Schema {
    /// Check if this schema is nullable (type array containing null, or the 3.0 flag).
    pub fn is_nullable(&self) -> bool {
        if self.nullable == Some(true) {
            return true;
        }
        matches!(&self.schema_type, Some(SchemaType::Multiple(types)) if types.iter().any(|t| t == "null"))
    }

    /// True when the schema constrains nothing structurally (only annotations).
    pub fn is_annotation_only(&self) -> bool {
        self.schema_type.is_none()
            && self.ref_path.is_none()
            && self.properties.is_none()
            && self.items.is_none()
            && self.prefix_items.is_none()
            && self.enum_values.is_none()
            && self.any_of.is_none()
            && self.one_of.is_none()
            && self.all_of.is_none()
            && self.additional_properties.is_none()
            && self.const_value.is_none()
            && self.required.is_none()
    }
}

impl PathItem {
    /// Operations in OpenAPI declaration order, paired with their method.
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            ("get", self.get.as_ref()),
            ("put", self.put.as_ref()),
            ("post", self.post.as_ref()),
            ("delete", self.delete.as_ref()),
            ("options", self.options.as_ref()),
            ("head", self.head.as_ref()),
            ("patch", self.patch.as_ref()),
            ("trace", self.trace.as_ref()),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.map(|op| (method, op)))
    }
}
