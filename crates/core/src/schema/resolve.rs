//! Schema resolution: OpenAPI schema objects to [`SchemaNode`]s.

use indexmap::IndexMap;

use super::node::{Additional, Field, LiteralValue, PrimitiveKind, SchemaNode};
use crate::document::spec::{AdditionalProperties, EnumValue, Schema, SchemaType};
use crate::document::{ComponentKind, Pointer, schema_ref_target};
use crate::error::{GenerateError, Result};

/// Resolves schema objects against the document's component schemas.
#[derive(Debug, Clone, Copy)]
pub struct SchemaResolver<'a> {
    schemas: &'a IndexMap<String, Schema>,
}

/// Structural view of an object schema, used while merging `allOf` members.
#[derive(Debug, Default)]
struct ObjectView {
    fields: IndexMap<String, Field>,
    additional: Option<Additional>,
}

impl ObjectView {
    fn into_node(self) -> SchemaNode {
        let additional = self.additional.unwrap_or(if self.fields.is_empty() {
            Additional::Open
        } else {
            Additional::Closed
        });
        SchemaNode::Object {
            fields: self.fields,
            additional,
        }
    }
}

/// Component schemas an `allOf` is currently expanding, outermost first.
#[derive(Debug, Default)]
struct Expansion {
    names: Vec<String>,
    /// Names from this index on were entered without crossing a property,
    /// so meeting one of them again is a self-expansion.
    scope: usize,
}

impl Expansion {
    /// Run `f` for a property, item or additional-properties schema.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let scope = std::mem::replace(&mut self.scope, self.names.len());
        let result = f(self);
        self.scope = scope;
        result
    }
}

impl<'a> SchemaResolver<'a> {
    /// Resolver over `components.schemas`.
    pub fn new(schemas: &'a IndexMap<String, Schema>) -> Self {
        Self { schemas }
    }

    /// Resolve `schema`, located at `at`, into its canonical form.
    pub fn resolve(&self, schema: &Schema, at: &Pointer) -> Result<SchemaNode> {
        self.resolve_node(schema, at, &mut Expansion::default())
    }

    fn resolve_node(
        &self,
        schema: &Schema,
        at: &Pointer,
        expansion: &mut Expansion,
    ) -> Result<SchemaNode> {
        let node = self.resolve_inner(schema, at, expansion)?;
        Ok(if schema.is_nullable() {
            node.nullable()
        } else {
            node
        })
    }

    fn resolve_inner(
        &self,
        schema: &Schema,
        at: &Pointer,
        expansion: &mut Expansion,
    ) -> Result<SchemaNode> {
        if let Some(reference) = &schema.ref_path {
            let name = schema_ref_target(reference, at, self.schemas)?;
            return Ok(SchemaNode::reference(name));
        }

        if let Some(value) = &schema.const_value {
            return LiteralValue::from_json(value)
                .map(|value| SchemaNode::Literal { value })
                .ok_or_else(|| {
                    GenerateError::schema(
                        at.join("const").to_string(),
                        "only scalar `const` values are supported",
                    )
                });
        }

        if let Some(values) = &schema.enum_values {
            if values.is_empty() {
                return Err(GenerateError::schema(
                    at.join("enum").to_string(),
                    "`enum` must list at least one value",
                ));
            }
            return Ok(SchemaNode::union(values.iter().map(|value| {
                SchemaNode::Literal {
                    value: enum_literal(value),
                }
            })));
        }

        if schema.all_of.is_some() {
            return self.merge_all_of(schema, at, expansion);
        }

        let alternatives = [("oneOf", &schema.one_of), ("anyOf", &schema.any_of)];
        if alternatives.iter().any(|(_, members)| members.is_some()) {
            let mut variants = Vec::new();
            for (keyword, members) in alternatives {
                let Some(members) = members else { continue };
                let base = at.join(keyword);
                for (i, member) in members.iter().enumerate() {
                    variants.push(self.resolve_node(member, &base.join_index(i), expansion)?);
                }
            }
            return Ok(SchemaNode::union(variants));
        }

        match &schema.schema_type {
            Some(SchemaType::Single(ty)) => self.resolve_type(ty, schema, at, expansion),
            Some(SchemaType::Multiple(types)) => {
                let variants = types
                    .iter()
                    .map(|ty| self.resolve_type(ty, schema, at, expansion))
                    .collect::<Result<Vec<_>>>()?;
                Ok(SchemaNode::union(variants))
            }
            None if schema.properties.is_some() || schema.additional_properties.is_some() => {
                Ok(self.object_fields(schema, at, expansion)?.into_node())
            }
            None if schema.prefix_items.is_some() || schema.items.is_some() => {
                self.resolve_array(schema, at, expansion)
            }
            None => Ok(SchemaNode::any()),
        }
    }

    fn resolve_type(
        &self,
        ty: &str,
        schema: &Schema,
        at: &Pointer,
        expansion: &mut Expansion,
    ) -> Result<SchemaNode> {
        let format = schema.format.clone();
        let node = match ty {
            "string" if format.as_deref() == Some("binary") => SchemaNode::binary(),
            "string" => SchemaNode::Primitive {
                primitive: PrimitiveKind::String,
                format,
            },
            // Swagger-era file uploads.
            "file" => SchemaNode::binary(),
            "integer" => SchemaNode::Primitive {
                primitive: PrimitiveKind::Integer,
                format,
            },
            "number" => SchemaNode::Primitive {
                primitive: PrimitiveKind::Number,
                format,
            },
            "boolean" => SchemaNode::primitive(PrimitiveKind::Boolean),
            "null" => SchemaNode::null(),
            "array" => self.resolve_array(schema, at, expansion)?,
            "object" => self.object_fields(schema, at, expansion)?.into_node(),
            other => {
                return Err(GenerateError::schema(
                    at.join("type").to_string(),
                    format!("unknown type `{other}`"),
                ));
            }
        };
        Ok(node)
    }

    fn resolve_array(
        &self,
        schema: &Schema,
        at: &Pointer,
        expansion: &mut Expansion,
    ) -> Result<SchemaNode> {
        if let Some(prefix) = &schema.prefix_items {
            let base = at.join("prefixItems");
            let items = expansion.nested(|expansion| {
                prefix
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.resolve_node(item, &base.join_index(i), expansion))
                    .collect::<Result<Vec<_>>>()
            })?;
            return Ok(SchemaNode::Tuple { items });
        }
        let items = match &schema.items {
            Some(items) => expansion
                .nested(|expansion| self.resolve_node(items, &at.join("items"), expansion))?,
            None => SchemaNode::any(),
        };
        Ok(SchemaNode::array(items))
    }

    /// Declared properties and `additionalProperties` of a single schema object.
    fn object_fields(
        &self,
        schema: &Schema,
        at: &Pointer,
        expansion: &mut Expansion,
    ) -> Result<ObjectView> {
        let required = schema.required.as_deref().unwrap_or_default();
        let mut fields = IndexMap::new();
        if let Some(properties) = &schema.properties {
            let base = at.join("properties");
            for (name, property) in properties {
                let node = expansion.nested(|expansion| {
                    self.resolve_node(property, &base.join(name.as_str()), expansion)
                })?;
                fields.insert(
                    name.clone(),
                    Field {
                        schema: node,
                        required: required.contains(name),
                        description: property.description.clone(),
                    },
                );
            }
        }
        let additional = match &schema.additional_properties {
            None => None,
            Some(AdditionalProperties::Bool(true)) => Some(Additional::Open),
            Some(AdditionalProperties::Bool(false)) => Some(Additional::Closed),
            Some(AdditionalProperties::Schema(value)) => {
                let node = expansion.nested(|expansion| {
                    self.resolve_node(value, &at.join("additionalProperties"), expansion)
                })?;
                Some(if node.is_any() {
                    Additional::Open
                } else {
                    Additional::Typed(Box::new(node))
                })
            }
        };
        Ok(ObjectView { fields, additional })
    }

    /// Merge `allOf` members into one object.
    ///
    /// A field declared by several members must agree structurally, unless
    /// one side is unconstrained, in which case the constrained side wins.
    /// A member extending a schema that an enclosing `allOf` is still
    /// expanding stays a reference and is intersected with the rest.
    fn merge_all_of(
        &self,
        schema: &Schema,
        at: &Pointer,
        expansion: &mut Expansion,
    ) -> Result<SchemaNode> {
        let members: Vec<(usize, &Schema)> = schema
            .all_of
            .iter()
            .flatten()
            .enumerate()
            .filter(|(_, member)| !member.is_annotation_only())
            .collect();
        let own_shape = has_own_shape(schema);

        if let [(i, member)] = members.as_slice()
            && !own_shape
        {
            return self.resolve_node(member, &at.join("allOf").join_index(*i), expansion);
        }
        if members.is_empty() && !own_shape {
            return Ok(SchemaNode::any());
        }

        let mut recursive = Vec::new();
        let merged = self
            .merge_members(schema, at, expansion, &mut recursive)?
            .into_node();
        if recursive.is_empty() {
            return Ok(merged);
        }
        let is_empty = matches!(
            &merged,
            SchemaNode::Object { fields, additional: Additional::Open } if fields.is_empty()
        );
        let mut parts: Vec<SchemaNode> = recursive.into_iter().map(SchemaNode::reference).collect();
        if !is_empty {
            parts.push(merged);
        }
        Ok(SchemaNode::intersection(parts))
    }

    /// Fold every `allOf` member of `schema`, plus its own properties, into one view.
    fn merge_members(
        &self,
        schema: &Schema,
        at: &Pointer,
        expansion: &mut Expansion,
        recursive: &mut Vec<String>,
    ) -> Result<ObjectView> {
        let base = at.join("allOf");
        let mut merged = ObjectView::default();
        let mut required: Vec<&str> = Vec::new();
        for (i, member) in schema.all_of.iter().flatten().enumerate() {
            if member.is_annotation_only() {
                continue;
            }
            let member_at = base.join_index(i);
            required.extend(member.required.iter().flatten().map(String::as_str));
            if let Some(view) = self.member_view(member, &member_at, expansion, recursive)? {
                merge_view(&mut merged, view, &member_at)?;
            }
        }
        if has_own_shape(schema) {
            merge_view(&mut merged, self.object_fields(schema, at, expansion)?, at)?;
        }
        required.extend(schema.required.iter().flatten().map(String::as_str));
        for name in required {
            if let Some(field) = merged.fields.get_mut(name) {
                field.required = true;
            }
        }
        Ok(merged)
    }

    /// The object structure an `allOf` member contributes, following references.
    ///
    /// `None` means the member constrains nothing structurally: it resolves to
    /// `any`, or it names a schema already being expanded (pushed to `recursive`).
    fn member_view(
        &self,
        member: &Schema,
        at: &Pointer,
        expansion: &mut Expansion,
        recursive: &mut Vec<String>,
    ) -> Result<Option<ObjectView>> {
        if let Some(reference) = &member.ref_path {
            let name = schema_ref_target(reference, at, self.schemas)?;
            if let Some(depth) = expansion.names.iter().position(|n| *n == name) {
                if depth >= expansion.scope {
                    return Err(GenerateError::schema(
                        at.to_string(),
                        format!("`allOf` expands `{name}` inside itself"),
                    ));
                }
                recursive.push(name);
                return Ok(None);
            }
            let Some(target) = self.schemas.get(&name) else {
                return Ok(None);
            };
            expansion.names.push(name.clone());
            let view = self.member_view(
                target,
                &Pointer::component(ComponentKind::Schemas, &name),
                expansion,
                recursive,
            );
            expansion.names.pop();
            return view;
        }

        if member.all_of.is_some() {
            return self
                .merge_members(member, at, expansion, recursive)
                .map(Some);
        }

        let is_object_like = matches!(&member.schema_type, Some(SchemaType::Single(t)) if t == "object")
            || (member.schema_type.is_none()
                && member.any_of.is_none()
                && member.one_of.is_none()
                && member.enum_values.is_none()
                && member.const_value.is_none()
                && member.items.is_none());
        if !is_object_like {
            return Err(non_object_member(at));
        }
        let view = self.object_fields(member, at, expansion)?;
        if view.fields.is_empty() && view.additional.is_none() && member.schema_type.is_none() {
            // `{ required: [...] }` style members only mark fields of siblings.
            return Ok(None);
        }
        Ok(Some(view))
    }
}

fn has_own_shape(schema: &Schema) -> bool {
    schema.properties.is_some() || schema.additional_properties.is_some()
}

fn merge_view(merged: &mut ObjectView, view: ObjectView, at: &Pointer) -> Result<()> {
    for (name, field) in view.fields {
        match merged.fields.get_mut(&name) {
            None => {
                merged.fields.insert(name, field);
            }
            Some(existing) => {
                existing.required |= field.required;
                if existing.description.is_none() {
                    existing.description = field.description;
                }
                if existing.schema == field.schema || field.schema.is_any() {
                    continue;
                }
                if existing.schema.is_any() {
                    existing.schema = field.schema;
                    continue;
                }
                return Err(GenerateError::schema(
                    at.join("properties").join(name.as_str()).to_string(),
                    format!("`allOf` members declare conflicting types for field `{name}`"),
                ));
            }
        }
    }
    merged.additional = match (merged.additional.take(), view.additional) {
        (Some(Additional::Closed), _) | (_, Some(Additional::Closed)) => Some(Additional::Closed),
        (Some(Additional::Typed(ty)), _) | (_, Some(Additional::Typed(ty))) => {
            Some(Additional::Typed(ty))
        }
        (Some(Additional::Open), _) | (_, Some(Additional::Open)) => Some(Additional::Open),
        (None, None) => None,
    };
    Ok(())
}

fn non_object_member(at: &Pointer) -> GenerateError {
    GenerateError::schema(
        at.to_string(),
        "`allOf` can only combine object schemas",
    )
}

fn enum_literal(value: &EnumValue) -> LiteralValue {
    match value {
        EnumValue::String(s) => LiteralValue::String(s.clone()),
        EnumValue::Integer(n) => LiteralValue::Integer(*n),
        EnumValue::Float(f) => LiteralValue::Number(*f),
        EnumValue::Bool(b) => LiteralValue::Bool(*b),
        EnumValue::Null => LiteralValue::Null,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn components(json: &str) -> IndexMap<String, Schema> {
        serde_json::from_str(json).unwrap()
    }

    fn resolve_named(schemas: &IndexMap<String, Schema>, name: &str) -> Result<SchemaNode> {
        SchemaResolver::new(schemas).resolve(
            &schemas[name],
            &Pointer::component(ComponentKind::Schemas, name),
        )
    }

    fn fields(node: &SchemaNode) -> &IndexMap<String, Field> {
        let SchemaNode::Object { fields, .. } = node else {
            panic!("expected object, got {node:?}");
        };
        fields
    }

    #[test]
    fn test_required_and_optional_fields() {
        let schemas = components(
            r#"{ "Post": { "type": "object", "required": ["id", "post"], "properties": {
                "id": { "type": "string" }, "post": { "type": "string" },
                "createdAt": { "type": "string", "format": "date-time" }
            } } }"#,
        );
        let node = resolve_named(&schemas, "Post").unwrap();
        let fields = fields(&node);
        assert!(fields["id"].required);
        assert!(fields["post"].required);
        assert!(!fields["createdAt"].required);
        assert_eq!(
            fields["createdAt"].schema,
            SchemaNode::Primitive {
                primitive: PrimitiveKind::String,
                format: Some("date-time".into())
            }
        );
    }

    #[test]
    fn test_nullable_forms() {
        let schemas = components(
            r#"{
                "A": { "type": "string", "nullable": true },
                "B": { "type": ["integer", "null"] }
            }"#,
        );
        assert_eq!(
            resolve_named(&schemas, "A").unwrap(),
            SchemaNode::string().nullable()
        );
        let b = resolve_named(&schemas, "B").unwrap();
        let SchemaNode::Union { variants } = b else {
            panic!("expected union");
        };
        assert_eq!(variants.len(), 2);
        assert!(variants[1].is_null());
    }

    #[test]
    fn test_enum_becomes_literal_union() {
        let schemas = components(r#"{ "Level": { "type": "string", "enum": ["low", "high"] } }"#);
        assert_eq!(
            resolve_named(&schemas, "Level").unwrap(),
            SchemaNode::Union {
                variants: vec![
                    SchemaNode::Literal {
                        value: LiteralValue::String("low".into())
                    },
                    SchemaNode::Literal {
                        value: LiteralValue::String("high".into())
                    },
                ]
            }
        );
    }

    #[test]
    fn test_empty_object_and_untyped_array() {
        let schemas = components(
            r#"{ "Bag": { "type": "object" }, "List": { "type": "array" } }"#,
        );
        assert_eq!(
            resolve_named(&schemas, "Bag").unwrap(),
            SchemaNode::Object {
                fields: IndexMap::new(),
                additional: Additional::Open
            }
        );
        assert_eq!(
            resolve_named(&schemas, "List").unwrap(),
            SchemaNode::array(SchemaNode::any())
        );
    }

    #[test]
    fn test_binary_and_tuple() {
        let schemas = components(
            r#"{
                "File": { "type": "string", "format": "binary" },
                "Pair": { "type": "array", "prefixItems": [{ "type": "string" }, { "type": "integer" }] }
            }"#,
        );
        assert_eq!(resolve_named(&schemas, "File").unwrap(), SchemaNode::binary());
        let SchemaNode::Tuple { items } = resolve_named(&schemas, "Pair").unwrap() else {
            panic!("expected tuple");
        };
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_one_of_keeps_order() {
        let schemas = components(
            r##"{
                "A": { "type": "object", "properties": { "a": { "type": "string" } } },
                "B": { "type": "object", "properties": { "b": { "type": "string" } } },
                "AorB": { "oneOf": [
                    { "$ref": "#/components/schemas/B" },
                    { "$ref": "#/components/schemas/A" },
                    { "$ref": "#/components/schemas/B" }
                ] }
            }"##,
        );
        assert_eq!(
            resolve_named(&schemas, "AorB").unwrap(),
            SchemaNode::Union {
                variants: vec![SchemaNode::reference("B"), SchemaNode::reference("A")]
            }
        );
    }

    #[test]
    fn test_all_of_merges_fields_and_required() {
        let schemas = components(
            r##"{
                "Base": { "type": "object", "required": ["id"], "properties": {
                    "id": { "type": "string" }, "note": {}
                } },
                "Post": { "allOf": [
                    { "$ref": "#/components/schemas/Base" },
                    { "type": "object", "required": ["title"], "properties": {
                        "title": { "type": "string" }, "note": { "type": "string" }
                    } },
                    { "required": ["note"] },
                    { "description": "only words" }
                ] }
            }"##,
        );
        let node = resolve_named(&schemas, "Post").unwrap();
        let fields = fields(&node);
        assert_eq!(fields.keys().collect::<Vec<_>>(), ["id", "note", "title"]);
        assert!(fields["id"].required);
        assert!(fields["title"].required);
        assert!(fields["note"].required);
        assert_eq!(fields["note"].schema, SchemaNode::string());
    }

    #[test]
    fn test_all_of_single_member_keeps_reference() {
        let schemas = components(
            r##"{
                "Base": { "type": "object", "properties": { "id": { "type": "string" } } },
                "Alias": { "allOf": [{ "$ref": "#/components/schemas/Base" }], "description": "x" }
            }"##,
        );
        assert_eq!(
            resolve_named(&schemas, "Alias").unwrap(),
            SchemaNode::reference("Base")
        );
    }

    #[test]
    fn test_all_of_conflict_names_field_pointer() {
        let schemas = components(
            r##"{
                "Base": { "type": "object", "properties": { "id": { "type": "string" } } },
                "Post": { "allOf": [
                    { "$ref": "#/components/schemas/Base" },
                    { "type": "object", "properties": { "id": { "type": "integer" } } }
                ] }
            }"##,
        );
        let err = resolve_named(&schemas, "Post").unwrap_err();
        assert_eq!(err.kind(), "SchemaError");
        assert!(
            err.to_string()
                .contains("#/components/schemas/Post/allOf/1/properties/id"),
            "{err}"
        );
    }

    #[test]
    fn test_all_of_with_non_object_member_fails() {
        let schemas = components(
            r#"{ "Odd": { "allOf": [
                { "type": "object", "properties": { "a": { "type": "string" } } },
                { "type": "string" }
            ] } }"#,
        );
        let err = resolve_named(&schemas, "Odd").unwrap_err();
        assert!(err.to_string().contains("#/components/schemas/Odd/allOf/1"));
    }

    #[test]
    fn test_all_of_self_expansion_fails() {
        let schemas = components(
            r##"{ "Loop": { "allOf": [
                { "$ref": "#/components/schemas/Loop" },
                { "type": "object", "properties": { "a": { "type": "string" } } }
            ] } }"##,
        );
        let err = resolve_named(&schemas, "Loop").unwrap_err();
        assert_eq!(err.kind(), "SchemaError");
    }

    #[test]
    fn test_recursive_reference_stays_symbolic() {
        let schemas = components(
            r##"{ "Node": { "type": "object", "properties": {
                "children": { "type": "array", "items": { "$ref": "#/components/schemas/Node" } }
            } } }"##,
        );
        let node = resolve_named(&schemas, "Node").unwrap();
        assert_eq!(
            fields(&node)["children"].schema,
            SchemaNode::array(SchemaNode::reference("Node"))
        );
    }

    #[test]
    fn test_all_of_extending_ancestor_through_property() {
        let schemas = components(
            r##"{ "Node": { "type": "object", "properties": {
                "child": { "allOf": [
                    { "$ref": "#/components/schemas/Node" },
                    { "type": "object", "properties": { "depth": { "type": "integer" } } }
                ] }
            } } }"##,
        );
        let node = resolve_named(&schemas, "Node").unwrap();
        let child = &fields(&node)["child"].schema;
        let child_fields = fields(child);
        assert_eq!(child_fields.keys().collect::<Vec<_>>(), ["child", "depth"]);

        let depth = SchemaNode::Object {
            fields: IndexMap::from([(
                "depth".to_string(),
                Field {
                    schema: SchemaNode::primitive(PrimitiveKind::Integer),
                    required: false,
                    description: None,
                },
            )]),
            additional: Additional::Closed,
        };
        assert_eq!(
            child_fields["child"].schema,
            SchemaNode::Intersection {
                members: vec![SchemaNode::reference("Node"), depth]
            }
        );
    }

    #[test]
    fn test_all_of_extending_ancestor_through_items() {
        let schemas = components(
            r##"{ "Tree": { "type": "object", "properties": {
                "name": { "type": "string" },
                "children": { "type": "array", "items": { "allOf": [
                    { "$ref": "#/components/schemas/Tree" },
                    { "required": ["name"] }
                ] } }
            } } }"##,
        );
        let node = resolve_named(&schemas, "Tree").unwrap();
        let SchemaNode::Array { items } = &fields(&node)["children"].schema else {
            panic!("expected array");
        };
        let item_fields = fields(items);
        assert!(item_fields["name"].required);
        let SchemaNode::Array { items: inner } = &item_fields["children"].schema else {
            panic!("expected array");
        };
        assert_eq!(**inner, SchemaNode::reference("Tree"));
    }

    #[test]
    fn test_unknown_type_is_schema_error() {
        let schemas = components(r#"{ "X": { "type": "strnig" } }"#);
        let err = resolve_named(&schemas, "X").unwrap_err();
        assert!(err.to_string().contains("#/components/schemas/X/type"));
    }

    #[test]
    fn test_typed_additional_properties() {
        let schemas = components(
            r#"{ "Counts": { "type": "object", "additionalProperties": { "type": "integer" } } }"#,
        );
        let SchemaNode::Object { additional, .. } = resolve_named(&schemas, "Counts").unwrap()
        else {
            panic!("expected object");
        };
        assert_eq!(
            additional,
            Additional::Typed(Box::new(SchemaNode::primitive(PrimitiveKind::Integer)))
        );
    }
}
