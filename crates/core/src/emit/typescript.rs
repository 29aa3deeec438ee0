//! Type emitter: canonical schema nodes to TypeScript types.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::ast::{TsLiteral, TsPrimitive, TsProp, TsType, TsTypeDef, TypeDefKind};
use super::printer::Emit;
use super::utils::{
    TS_TAKEN_TYPE_NAMES, enum_value_to_key, literal_to_ts, make_string_record, sanitize_type_name,
};
use crate::config::Int64Repr;
use crate::route::Route;
use crate::schema::{Additional, Field, LiteralValue, NamedSchema, PrimitiveKind, SchemaNode};

/// Stable TypeScript identifiers for named component schemas.
#[derive(Debug, Clone, Default)]
pub struct TypeNames {
    names: IndexMap<String, String>,
}

impl TypeNames {
    /// Assign identifiers in declaration order.
    ///
    /// Names that would shadow a global or a generated declaration get a
    /// `Schema` suffix; names that still collide after sanitizing get a
    /// numeric suffix.
    pub fn assign<'a>(schemas: impl IntoIterator<Item = &'a str>, routes: &[Route]) -> Self {
        let reserved: HashSet<String> = routes
            .iter()
            .flat_map(|route| [args_type_name(route), response_type_name(route)])
            .collect();
        let mut used: HashSet<String> = HashSet::new();
        let mut names = IndexMap::new();

        for schema in schemas {
            let mut base = sanitize_type_name(schema);
            if TS_TAKEN_TYPE_NAMES.contains(base.as_str()) || reserved.contains(&base) {
                base.push_str("Schema");
            }
            let mut candidate = base.clone();
            let mut suffix = 2;
            while used.contains(&candidate) || reserved.contains(&candidate) {
                candidate = format!("{base}{suffix}");
                suffix += 1;
            }
            used.insert(candidate.clone());
            names.insert(schema.to_string(), candidate);
        }

        Self { names }
    }

    /// Identifier for a component schema name.
    pub fn get(&self, schema: &str) -> String {
        self.names
            .get(schema)
            .cloned()
            .unwrap_or_else(|| sanitize_type_name(schema))
    }
}

/// `<Name>Args`
pub fn args_type_name(route: &Route) -> String {
    format!("{}Args", route.name)
}

/// `<Name>Response`
pub fn response_type_name(route: &Route) -> String {
    format!("{}Response", route.name)
}

/// Maps [`SchemaNode`]s to [`TsType`]s.
#[derive(Debug, Clone, Copy)]
pub struct TypeEmitter<'a> {
    names: &'a TypeNames,
    int64: Int64Repr,
}

impl<'a> TypeEmitter<'a> {
    /// Emitter resolving references through `names`.
    pub fn new(names: &'a TypeNames, int64: Int64Repr) -> Self {
        Self { names, int64 }
    }

    /// Identifiers this emitter uses.
    pub fn names(&self) -> &'a TypeNames {
        self.names
    }

    /// TypeScript syntax for a node.
    pub fn emit_type(&self, node: &SchemaNode) -> String {
        self.ts_type(node).emit()
    }

    /// TypeScript type for a node.
    pub fn ts_type(&self, node: &SchemaNode) -> TsType {
        match node {
            SchemaNode::Primitive { primitive, format } => {
                self.primitive(*primitive, format.as_deref())
            }
            SchemaNode::Array { items } => TsType::Array(Box::new(self.ts_type(items))),
            SchemaNode::Tuple { items } => {
                TsType::Tuple(items.iter().map(|item| self.ts_type(item)).collect())
            }
            SchemaNode::Object { fields, additional } => self.object(fields, additional),
            SchemaNode::Union { variants } => {
                TsType::Union(variants.iter().map(|v| self.ts_type(v)).collect())
            }
            SchemaNode::Intersection { members } => {
                TsType::Intersection(members.iter().map(|m| self.ts_type(m)).collect())
            }
            SchemaNode::Literal { value } => TsType::Literal(literal_to_ts(value)),
            SchemaNode::Reference { name } => TsType::Ref(self.names.get(name)),
        }
    }

    fn primitive(&self, kind: PrimitiveKind, format: Option<&str>) -> TsType {
        match kind {
            PrimitiveKind::String => TsType::Primitive(TsPrimitive::String),
            PrimitiveKind::Integer
                if format == Some("int64") && self.int64 == Int64Repr::String =>
            {
                TsType::Primitive(TsPrimitive::String)
            }
            PrimitiveKind::Integer | PrimitiveKind::Number => {
                TsType::Primitive(TsPrimitive::Number)
            }
            PrimitiveKind::Boolean => TsType::Primitive(TsPrimitive::Boolean),
            PrimitiveKind::Null => TsType::Primitive(TsPrimitive::Null),
            PrimitiveKind::Binary => TsType::named("Blob"),
            PrimitiveKind::Any => TsType::Primitive(TsPrimitive::Unknown),
        }
    }

    /// Properties for an object's declared fields, in declaration order.
    pub fn props(&self, fields: &IndexMap<String, Field>) -> Vec<TsProp> {
        fields
            .iter()
            .map(|(name, field)| {
                TsProp::new(name.clone(), self.ts_type(&field.schema))
                    .optional(!field.required)
                    .doc(field.description.clone())
            })
            .collect()
    }

    fn object(&self, fields: &IndexMap<String, Field>, additional: &Additional) -> TsType {
        if fields.is_empty() {
            return match additional {
                Additional::Closed => make_string_record(TsType::Primitive(TsPrimitive::Never)),
                Additional::Open => make_string_record(TsType::Primitive(TsPrimitive::Unknown)),
                Additional::Typed(value) => make_string_record(self.ts_type(value)),
            };
        }
        let props = self.props(fields);
        match additional {
            Additional::Closed => TsType::object(props),
            Additional::Open => TsType::Object {
                props,
                index: Some(Box::new(TsType::Primitive(TsPrimitive::Unknown))),
            },
            // An index signature would have to admit every field type, so the
            // record goes into an intersection instead.
            Additional::Typed(value) => TsType::Intersection(vec![
                TsType::object(props),
                make_string_record(self.ts_type(value)),
            ]),
        }
    }

    /// Shared declaration for a named schema.
    pub fn type_def(&self, schema: &NamedSchema) -> TsTypeDef {
        let name = self.names.get(&schema.name);
        let kind = match &schema.node {
            SchemaNode::Object {
                fields,
                additional: additional @ (Additional::Closed | Additional::Open),
            } if !fields.is_empty() => TypeDefKind::Interface {
                properties: self.props(fields),
                index: matches!(additional, Additional::Open)
                    .then_some(TsType::Primitive(TsPrimitive::Unknown)),
            },
            SchemaNode::Union { variants } if is_enum_like(variants) => TypeDefKind::ConstEnum {
                values: enum_entries(variants),
            },
            node => TypeDefKind::TypeAlias {
                ty: self.ts_type(node),
            },
        };
        TsTypeDef {
            name,
            kind,
            doc: schema.description.clone(),
        }
    }

    /// Declarations for every named schema, in declaration order.
    pub fn declarations<'s>(
        &self,
        schemas: impl IntoIterator<Item = &'s NamedSchema>,
    ) -> Vec<TsTypeDef> {
        schemas
            .into_iter()
            .map(|schema| self.type_def(schema))
            .collect()
    }
}

/// A union of string or integer literals, declared as an `as const` object.
fn is_enum_like(variants: &[SchemaNode]) -> bool {
    variants.iter().all(|variant| {
        matches!(
            variant,
            SchemaNode::Literal {
                value: LiteralValue::String(_) | LiteralValue::Integer(_)
            }
        )
    })
}

fn enum_entries(variants: &[SchemaNode]) -> Vec<(String, TsLiteral)> {
    let mut used = HashSet::new();
    let mut entries = Vec::new();
    for (index, variant) in variants.iter().enumerate() {
        let SchemaNode::Literal { value } = variant else {
            continue;
        };
        let mut key = enum_value_to_key(value, index);
        if !used.insert(key.clone()) {
            key = format!("VALUE_{index}");
            used.insert(key.clone());
        }
        entries.push((key, literal_to_ts(value)));
    }
    entries
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::route::HttpMethod;

    fn field(schema: SchemaNode, required: bool) -> Field {
        Field {
            schema,
            required,
            description: None,
        }
    }

    fn object(fields: Vec<(&str, Field)>, additional: Additional) -> SchemaNode {
        SchemaNode::Object {
            fields: fields
                .into_iter()
                .map(|(name, field)| (name.to_string(), field))
                .collect(),
            additional,
        }
    }

    fn named(name: &str, node: SchemaNode) -> NamedSchema {
        NamedSchema {
            name: name.into(),
            node,
            recursive: false,
            description: None,
        }
    }

    fn route(name: &str) -> Route {
        Route {
            path: "/".into(),
            method: HttpMethod::Get,
            name: name.into(),
            operation_id: None,
            summary: None,
            tags: vec![],
            deprecated: false,
            parameters: vec![],
            request_body: None,
            responses: vec![],
        }
    }

    #[test]
    fn test_primitives() {
        let names = TypeNames::default();
        let emitter = TypeEmitter::new(&names, Int64Repr::Number);
        assert_eq!(emitter.emit_type(&SchemaNode::string()), "string");
        assert_eq!(emitter.emit_type(&SchemaNode::binary()), "Blob");
        assert_eq!(emitter.emit_type(&SchemaNode::any()), "unknown");

        let int64 = SchemaNode::Primitive {
            primitive: PrimitiveKind::Integer,
            format: Some("int64".into()),
        };
        assert_eq!(emitter.emit_type(&int64), "number");
        let as_string = TypeEmitter::new(&names, Int64Repr::String);
        assert_eq!(as_string.emit_type(&int64), "string");
    }

    #[test]
    fn test_required_and_optional_fields() {
        let names = TypeNames::default();
        let emitter = TypeEmitter::new(&names, Int64Repr::Number);
        let node = object(
            vec![
                ("id", field(SchemaNode::string(), true)),
                ("post", field(SchemaNode::string(), true)),
                ("createdAt", field(SchemaNode::string(), false)),
            ],
            Additional::Closed,
        );
        assert_eq!(
            emitter.emit_type(&node),
            "{ id: string; post: string; createdAt?: string }"
        );
    }

    #[test]
    fn test_object_additional_properties() {
        let names = TypeNames::default();
        let emitter = TypeEmitter::new(&names, Int64Repr::Number);
        assert_eq!(
            emitter.emit_type(&object(vec![], Additional::Open)),
            "Record<string, unknown>"
        );
        assert_eq!(
            emitter.emit_type(&object(vec![], Additional::Closed)),
            "Record<string, never>"
        );
        assert_eq!(
            emitter.emit_type(&object(
                vec![],
                Additional::Typed(Box::new(SchemaNode::string()))
            )),
            "Record<string, string>"
        );
        assert_eq!(
            emitter.emit_type(&object(
                vec![("id", field(SchemaNode::string(), true))],
                Additional::Typed(Box::new(SchemaNode::any().nullable()))
            )),
            "{ id: string } & Record<string, unknown | null>"
        );
    }

    #[test]
    fn test_unions_tuples_and_references() {
        let names = TypeNames::assign(["user-profile"], &[]);
        let emitter = TypeEmitter::new(&names, Int64Repr::Number);
        let node = SchemaNode::union([
            SchemaNode::array(SchemaNode::reference("user-profile")),
            SchemaNode::Tuple {
                items: vec![SchemaNode::string(), SchemaNode::null()],
            },
            SchemaNode::null(),
        ]);
        assert_eq!(
            emitter.emit_type(&node),
            "UserProfile[] | [string, null] | null"
        );
    }

    #[test]
    fn test_type_names_avoid_collisions() {
        let routes = [route("GetUsers")];
        let names = TypeNames::assign(
            ["user", "User", "Error", "GetUsersResponse", "a.b", "a-b"],
            &routes,
        );
        assert_eq!(names.get("user"), "User");
        assert_eq!(names.get("User"), "User2");
        assert_eq!(names.get("Error"), "ErrorSchema");
        assert_eq!(names.get("GetUsersResponse"), "GetUsersResponseSchema");
        assert_eq!(names.get("a.b"), "AB");
        assert_eq!(names.get("a-b"), "AB2");
    }

    #[test]
    fn test_type_names_avoid_query_imports() {
        let names = TypeNames::assign(["UseQueryOptions", "use-mutation-options"], &[]);
        assert_eq!(names.get("UseQueryOptions"), "UseQueryOptionsSchema");
        assert_eq!(names.get("use-mutation-options"), "UseMutationOptionsSchema");
    }

    #[test]
    fn test_intersection_of_reference_and_object() {
        let names = TypeNames::assign(["Node"], &[]);
        let emitter = TypeEmitter::new(&names, Int64Repr::Number);
        let node = SchemaNode::intersection([
            SchemaNode::reference("Node"),
            SchemaNode::reference("Node"),
            SchemaNode::array(SchemaNode::string()),
        ]);
        assert_eq!(emitter.emit_type(&node), "Node & string[]");
    }

    #[test]
    fn test_type_defs() {
        let names = TypeNames::assign(["Post", "Status", "Id", "Bag"], &[]);
        let emitter = TypeEmitter::new(&names, Int64Repr::Number);

        let post = emitter.type_def(&NamedSchema {
            description: Some("A post.".into()),
            ..named(
                "Post",
                object(
                    vec![("id", field(SchemaNode::string(), true))],
                    Additional::Closed,
                ),
            )
        });
        assert_eq!(
            post.emit(),
            "/** A post. */\nexport interface Post {\n  id: string;\n}\n"
        );

        let status = emitter.type_def(&named(
            "Status",
            SchemaNode::union([
                SchemaNode::Literal {
                    value: LiteralValue::String("draft".into()),
                },
                SchemaNode::Literal {
                    value: LiteralValue::String("published".into()),
                },
            ]),
        ));
        assert!(matches!(status.kind, TypeDefKind::ConstEnum { .. }));
        assert!(status.emit().contains("  draft: \"draft\",\n"));

        let id = emitter.type_def(&named("Id", SchemaNode::string()));
        assert_eq!(id.emit(), "export type Id = string;\n");

        let bag = emitter.type_def(&named(
            "Bag",
            object(
                vec![("size", field(SchemaNode::primitive(PrimitiveKind::Integer), false))],
                Additional::Open,
            ),
        ));
        assert_eq!(
            bag.emit(),
            "export interface Bag {\n  size?: number;\n  [key: string]: unknown;\n}\n"
        );
    }

    #[test]
    fn test_nullable_enum_is_alias() {
        let names = TypeNames::assign(["Level"], &[]);
        let emitter = TypeEmitter::new(&names, Int64Repr::Number);
        let def = emitter.type_def(&named(
            "Level",
            SchemaNode::union([
                SchemaNode::Literal {
                    value: LiteralValue::Integer(1),
                },
                SchemaNode::null(),
            ]),
        ));
        assert_eq!(def.emit(), "export type Level = 1 | null;\n");
    }
}
