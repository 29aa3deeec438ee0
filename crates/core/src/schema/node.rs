//! Canonical schema representation shared by the route model and the emitters.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// A resolved JSON-Schema-like type.
///
/// References to named component schemas stay symbolic, so recursive
/// schemas are finite trees.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SchemaNode {
    /// A scalar.
    Primitive {
        /// Scalar kind.
        primitive: PrimitiveKind,
        /// `format` hint, e.g. `int64` or `date-time`.
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    /// A homogeneous list.
    Array {
        /// Element type.
        items: Box<SchemaNode>,
    },
    /// A fixed-length list (`prefixItems`).
    Tuple {
        /// Element types by position.
        items: Vec<SchemaNode>,
    },
    /// An object with declared fields.
    Object {
        /// Fields in declaration order.
        fields: IndexMap<String, Field>,
        /// Undeclared keys.
        additional: Additional,
    },
    /// Any one of the variants.
    Union {
        /// Flattened and deduplicated, in declaration order.
        variants: Vec<SchemaNode>,
    },
    /// All members at once. Only produced when an `allOf` extends a schema
    /// that is still being expanded, so it cannot be merged structurally.
    Intersection {
        /// Deduplicated members, references first.
        members: Vec<SchemaNode>,
    },
    /// Exactly one value (`const` or a single `enum` entry).
    Literal {
        /// The value.
        value: LiteralValue,
    },
    /// A named component schema.
    Reference {
        /// Name as declared under `components.schemas`.
        name: String,
    },
}

/// Scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    /// Text.
    String,
    /// Whole number.
    Integer,
    /// Any number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// `null` only.
    Null,
    /// File or blob payload.
    Binary,
    /// Unconstrained.
    Any,
}

/// An object property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Property type.
    pub schema: SchemaNode,
    /// Listed in the schema's `required`.
    pub required: bool,
    /// Property description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// What an object allows beyond its declared fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Additional {
    /// Nothing.
    Closed,
    /// Anything.
    Open,
    /// Values of one type.
    Typed(Box<SchemaNode>),
}

/// A scalar JSON value from `const` or `enum`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiteralValue {
    /// A string.
    String(String),
    /// An integral number.
    Integer(i64),
    /// A non-integral number.
    Number(f64),
    /// A boolean.
    Bool(bool),
    /// `null`.
    Null,
}

impl SchemaNode {
    /// A primitive without a format.
    pub fn primitive(primitive: PrimitiveKind) -> Self {
        Self::Primitive {
            primitive,
            format: None,
        }
    }

    /// The unconstrained type.
    pub fn any() -> Self {
        Self::primitive(PrimitiveKind::Any)
    }

    /// `null`.
    pub fn null() -> Self {
        Self::primitive(PrimitiveKind::Null)
    }

    /// A plain string.
    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }

    /// A file payload.
    pub fn binary() -> Self {
        Self::primitive(PrimitiveKind::Binary)
    }

    /// A reference to a named component schema.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference { name: name.into() }
    }

    /// A list of `items`.
    pub fn array(items: SchemaNode) -> Self {
        Self::Array {
            items: Box::new(items),
        }
    }

    /// Build a union: nested unions are flattened, structural duplicates
    /// dropped (first occurrence wins) and single-variant unions collapsed.
    pub fn union(variants: impl IntoIterator<Item = SchemaNode>) -> Self {
        let mut flat: Vec<SchemaNode> = Vec::new();
        for variant in variants {
            let members = match variant {
                SchemaNode::Union { variants } => variants,
                other => vec![other],
            };
            for member in members {
                if !flat.contains(&member) {
                    flat.push(member);
                }
            }
        }
        match flat.len() {
            0 => Self::any(),
            1 => flat.remove(0),
            _ => Self::Union { variants: flat },
        }
    }

    /// Build an intersection, dropping duplicates and collapsing a single member.
    pub fn intersection(members: impl IntoIterator<Item = SchemaNode>) -> Self {
        let mut flat: Vec<SchemaNode> = Vec::new();
        for member in members {
            if !flat.contains(&member) {
                flat.push(member);
            }
        }
        match flat.len() {
            0 => Self::any(),
            1 => flat.remove(0),
            _ => Self::Intersection { members: flat },
        }
    }

    /// `self | null`.
    pub fn nullable(self) -> Self {
        Self::union([self, Self::null()])
    }

    /// Whether the node constrains nothing.
    pub fn is_any(&self) -> bool {
        matches!(
            self,
            Self::Primitive {
                primitive: PrimitiveKind::Any,
                ..
            }
        )
    }

    /// Whether the node only admits `null`.
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Self::Primitive {
                primitive: PrimitiveKind::Null,
                ..
            } | Self::Literal {
                value: LiteralValue::Null
            }
        )
    }

    /// Whether the node is a list (possibly nullable).
    pub fn is_array(&self) -> bool {
        match self {
            Self::Array { .. } | Self::Tuple { .. } => true,
            Self::Union { variants } => variants.iter().any(|v| !v.is_null() && v.is_array()),
            _ => false,
        }
    }

    /// Named schemas referenced anywhere in this node, in first-seen order.
    pub fn collect_references(&self, out: &mut IndexSet<String>) {
        match self {
            Self::Reference { name } => {
                out.insert(name.clone());
            }
            Self::Array { items } => items.collect_references(out),
            Self::Tuple { items }
            | Self::Union { variants: items }
            | Self::Intersection { members: items } => {
                for item in items {
                    item.collect_references(out);
                }
            }
            Self::Object { fields, additional } => {
                for field in fields.values() {
                    field.schema.collect_references(out);
                }
                if let Additional::Typed(value) = additional {
                    value.collect_references(out);
                }
            }
            Self::Primitive { .. } | Self::Literal { .. } => {}
        }
    }
}

impl LiteralValue {
    /// Scalar JSON to a literal; `None` for arrays and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Self::Null),
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Number)),
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}
