//! TypeScript AST for code generation.
//!
//! - TsType: types (primitives, arrays, tuples, unions, objects, functions)
//! - TsExpr: expressions (identifiers, calls, arrows, object literals)
//! - TsTypeDef / TsFunction / TsModule: top-level declarations

/// TypeScript type representation
#[derive(Debug, Clone, PartialEq)]
pub enum TsType {
    /// Primitive types: string, number, boolean, null, undefined, unknown, never
    Primitive(TsPrimitive),
    /// Array type: T[]
    Array(Box<TsType>),
    /// Tuple type: [A, B]
    Tuple(Vec<TsType>),
    /// Union type: A | B | C
    Union(Vec<TsType>),
    /// Intersection type: A & B
    Intersection(Vec<TsType>),
    /// Object type: { foo: string; bar?: number; [key: string]: unknown }
    Object {
        /// Properties in order.
        props: Vec<TsProp>,
        /// Index signature value type.
        index: Option<Box<TsType>>,
    },
    /// Record type: Record<K, V>
    Record {
        /// Key type.
        key: Box<TsType>,
        /// Value type.
        value: Box<TsType>,
    },
    /// Function type: (a: A) => R
    Function {
        /// Parameters.
        params: Vec<TsParam>,
        /// Return type.
        ret: Box<TsType>,
    },
    /// Literal type: "foo", 42, true
    Literal(TsLiteral),
    /// Named type reference, including generic applications: `Promise<T>`
    Ref(String),
}

impl TsType {
    /// Object type without an index signature.
    pub fn object(props: Vec<TsProp>) -> Self {
        TsType::Object { props, index: None }
    }

    /// Reference to a named type.
    pub fn named(name: impl Into<String>) -> Self {
        TsType::Ref(name.into())
    }
}

/// TypeScript primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsPrimitive {
    /// `string`
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `null`
    Null,
    /// `undefined`
    Undefined,
    /// `unknown`
    Unknown,
    /// `never`
    Never,
}

/// Object property definition
#[derive(Debug, Clone, PartialEq)]
pub struct TsProp {
    /// Property name, quoted on output when not an identifier.
    pub name: String,
    /// Property type.
    pub ty: TsType,
    /// Rendered with `?`.
    pub optional: bool,
    /// Rendered as a `/** ... */` comment in multi-line output.
    pub doc: Option<String>,
}

impl TsProp {
    /// A required property without docs.
    pub fn new(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            doc: None,
        }
    }

    /// Set whether the property may be omitted.
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Attach a doc comment.
    pub fn doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }
}

/// TypeScript literal values
#[derive(Debug, Clone, PartialEq)]
pub enum TsLiteral {
    /// String literal, escaped on output.
    String(String),
    /// Non-integral number.
    Number(f64),
    /// Integral number.
    Int(i64),
    /// `true` or `false`.
    Bool(bool),
    /// `null`
    Null,
}

/// TypeScript expression
#[derive(Debug, Clone)]
pub enum TsExpr {
    /// Identifier: foo
    Ident(String),
    /// Literal value: "bar", 42
    Literal(TsLiteral),
    /// Function call: foo(a, b)
    Call {
        /// Function being called.
        callee: Box<TsExpr>,
        /// Arguments.
        args: Vec<TsExpr>,
    },
    /// Arrow function with an expression body: (x) => x.foo
    Arrow {
        /// Parameters.
        params: Vec<TsParam>,
        /// Expression body.
        body: Box<TsExpr>,
    },
    /// Object literal: { a: 1, b, ...rest }
    Object(Vec<ObjectEntry>),
    /// Member access: foo.bar
    Member {
        /// Accessed value.
        object: Box<TsExpr>,
        /// Property name.
        prop: String,
    },
    /// Optional chaining member access: foo?.bar
    OptionalMember {
        /// Accessed value.
        object: Box<TsExpr>,
        /// Property name.
        prop: String,
    },
    /// Index/bracket access: obj[key]
    Index {
        /// Accessed value.
        object: Box<TsExpr>,
        /// Key expression.
        index: Box<TsExpr>,
    },
    /// Array literal: [a, b, c]
    Array(Vec<TsExpr>),
    /// Type cast: expr as Type
    Cast {
        /// Cast value.
        expr: Box<TsExpr>,
        /// Target type.
        ty: TsType,
    },
    /// Raw code that doesn't fit the AST
    Raw(String),
}

impl TsExpr {
    /// An identifier.
    pub fn ident(name: impl Into<String>) -> Self {
        TsExpr::Ident(name.into())
    }

    /// A string literal.
    pub fn string(value: impl Into<String>) -> Self {
        TsExpr::Literal(TsLiteral::String(value.into()))
    }

    /// `callee(args...)`
    pub fn call(callee: TsExpr, args: Vec<TsExpr>) -> Self {
        TsExpr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    /// `self.prop`
    pub fn member(self, prop: impl Into<String>) -> Self {
        TsExpr::Member {
            object: Box::new(self),
            prop: prop.into(),
        }
    }

    /// `self?.prop`
    pub fn optional_member(self, prop: impl Into<String>) -> Self {
        TsExpr::OptionalMember {
            object: Box::new(self),
            prop: prop.into(),
        }
    }

    /// `self[index]`
    pub fn index(self, index: TsExpr) -> Self {
        TsExpr::Index {
            object: Box::new(self),
            index: Box::new(index),
        }
    }

    /// `[...] as const`
    pub fn const_array(items: Vec<TsExpr>) -> Self {
        TsExpr::Cast {
            expr: Box::new(TsExpr::Array(items)),
            ty: TsType::named("const"),
        }
    }
}

/// Object literal entry
#[derive(Debug, Clone)]
pub enum ObjectEntry {
    /// key: value
    Prop(String, TsExpr),
    /// key (shorthand)
    Shorthand(String),
    /// ...expr
    Spread(TsExpr),
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct TsParam {
    /// Parameter name.
    pub name: String,
    /// Annotation; omitted when `None`.
    pub ty: Option<TsType>,
    /// Rendered with `?`.
    pub optional: bool,
    /// Default value expression: `args: T = {}`
    pub default: Option<String>,
}

impl TsParam {
    /// A required, annotated parameter.
    pub fn new(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            optional: false,
            default: None,
        }
    }

    /// Mark the parameter `?`.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Give the parameter a default value.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

// =============================================================================
// Module-Level IR (for printer)
// =============================================================================

/// Import statement
#[derive(Debug, Clone)]
pub struct TsImport {
    /// Items to import
    pub items: Vec<String>,
    /// Module path
    pub from: String,
    /// Whether this is a type-only import
    pub type_only: bool,
}

/// Type definition kind
#[derive(Debug, Clone)]
pub enum TypeDefKind {
    /// interface Foo { ... }
    Interface {
        /// Members in order.
        properties: Vec<TsProp>,
        /// Index signature value type.
        index: Option<TsType>,
    },
    /// type Foo = ...
    TypeAlias {
        /// Aliased type.
        ty: TsType,
    },
    /// const Foo = { ... } as const; type Foo = ...
    ConstEnum {
        /// Member names and values.
        values: Vec<(String, TsLiteral)>,
    },
}

/// Type definition
#[derive(Debug, Clone)]
pub struct TsTypeDef {
    /// Exported name.
    pub name: String,
    /// Declaration form.
    pub kind: TypeDefKind,
    /// Rendered as a `/** ... */` comment.
    pub doc: Option<String>,
}

/// Statement in a function body
#[derive(Debug, Clone)]
pub enum TsStmt {
    /// const declaration
    Const {
        /// Binding name.
        name: String,
        /// Initializer.
        init: TsExpr,
    },
    /// Expression statement
    Expr(TsExpr),
    /// Return statement
    Return(TsExpr),
    /// Raw code block (for complex patterns that don't fit the AST)
    Raw(String),
}

/// Function definition
#[derive(Debug, Clone)]
pub struct TsFunction {
    /// Function name.
    pub name: String,
    /// Generic parameters, verbatim (`TData = Foo`).
    pub type_params: Vec<String>,
    /// Parameters.
    pub params: Vec<TsParam>,
    /// Annotated return type.
    pub return_type: Option<TsType>,
    /// Statements.
    pub body: Vec<TsStmt>,
    /// Prefixed with `export`.
    pub is_export: bool,
    /// `const name = (...) => ...` instead of `function name(...) {...}`
    pub is_arrow: bool,
    /// Rendered as a `/** ... */` comment.
    pub doc: Option<String>,
}

/// Complete TypeScript module
#[derive(Debug, Clone, Default)]
pub struct TsModule {
    /// Leading comment lines, without the `//` prefix.
    pub banner: Vec<String>,
    /// Import statements.
    pub imports: Vec<TsImport>,
    /// Type declarations.
    pub types: Vec<TsTypeDef>,
    /// Verbatim code placed between the types and the functions.
    pub raw: Vec<String>,
    /// Functions in order.
    pub functions: Vec<TsFunction>,
}
