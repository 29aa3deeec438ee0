//! TypeScript code emission via the Emit trait.
//!
//! Each AST type renders itself to a string. Object types and object
//! literals have an indented multi-line form used for declarations and
//! returned descriptors; everything else is single-line.

use super::ast::{
    ObjectEntry, TsExpr, TsFunction, TsImport, TsLiteral, TsModule, TsParam, TsPrimitive, TsProp,
    TsStmt, TsType, TsTypeDef, TypeDefKind,
};
use super::utils::{escape_js_string, quote_if_needed};

/// Trait for emitting TypeScript code from AST nodes.
pub trait Emit {
    /// Convert the AST node to its TypeScript string representation.
    fn emit(&self) -> String;
}

// =============================================================================
// Primitive Types
// =============================================================================

impl Emit for TsPrimitive {
    fn emit(&self) -> String {
        match self {
            TsPrimitive::String => "string",
            TsPrimitive::Number => "number",
            TsPrimitive::Boolean => "boolean",
            TsPrimitive::Null => "null",
            TsPrimitive::Undefined => "undefined",
            TsPrimitive::Unknown => "unknown",
            TsPrimitive::Never => "never",
        }
        .to_string()
    }
}

impl Emit for TsLiteral {
    fn emit(&self) -> String {
        match self {
            TsLiteral::String(s) => format!("\"{}\"", escape_js_string(s)),
            TsLiteral::Number(n) => n.to_string(),
            TsLiteral::Int(i) => i.to_string(),
            TsLiteral::Bool(b) => b.to_string(),
            TsLiteral::Null => "null".to_string(),
        }
    }
}

// =============================================================================
// Types
// =============================================================================

/// Wrap types that bind looser than the surrounding operator.
fn emit_operand(ty: &TsType, wrap_unions: bool) -> String {
    let needs_parens = match ty {
        TsType::Function { .. } => true,
        TsType::Union(_) | TsType::Intersection(_) => wrap_unions,
        _ => false,
    };
    if needs_parens {
        format!("({})", ty.emit())
    } else {
        ty.emit()
    }
}

impl Emit for TsType {
    fn emit(&self) -> String {
        match self {
            TsType::Primitive(p) => p.emit(),
            TsType::Array(inner) => format!("{}[]", emit_operand(inner, true)),
            TsType::Tuple(items) => {
                let items: Vec<_> = items.iter().map(Emit::emit).collect();
                format!("[{}]", items.join(", "))
            }
            TsType::Union(types) => types
                .iter()
                .map(|t| emit_operand(t, false))
                .collect::<Vec<_>>()
                .join(" | "),
            TsType::Intersection(types) => types
                .iter()
                .map(|t| emit_operand(t, matches!(t, TsType::Union(_))))
                .collect::<Vec<_>>()
                .join(" & "),
            TsType::Object { props, index } => {
                let mut parts: Vec<_> = props.iter().map(Emit::emit).collect();
                if let Some(index) = index {
                    parts.push(format!("[key: string]: {}", index.emit()));
                }
                if parts.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{ {} }}", parts.join("; "))
                }
            }
            TsType::Record { key, value } => {
                format!("Record<{}, {}>", key.emit(), value.emit())
            }
            TsType::Function { params, ret } => {
                let params: Vec<_> = params.iter().map(Emit::emit).collect();
                format!("({}) => {}", params.join(", "), ret.emit())
            }
            TsType::Literal(lit) => lit.emit(),
            TsType::Ref(name) => name.clone(),
        }
    }
}

impl TsType {
    /// Multi-line rendering for object types with properties; `indent` is
    /// the nesting level of the opening brace.
    pub fn emit_indented(&self, indent: usize) -> String {
        match self {
            TsType::Object { props, index } if !props.is_empty() => {
                let mut output = String::from("{\n");
                emit_members(&mut output, props, index.as_deref(), indent + 1);
                output.push_str(&"  ".repeat(indent));
                output.push('}');
                output
            }
            _ => self.emit(),
        }
    }
}

/// Property lines of an interface body or multi-line object type.
fn emit_members(output: &mut String, props: &[TsProp], index: Option<&TsType>, indent: usize) {
    let prefix = "  ".repeat(indent);
    for prop in props {
        if let Some(doc) = &prop.doc {
            output.push_str(&doc_comment(doc, indent));
        }
        output.push_str(&format!(
            "{prefix}{}{}: {};\n",
            quote_if_needed(&prop.name),
            if prop.optional { "?" } else { "" },
            prop.ty.emit_indented(indent)
        ));
    }
    if let Some(index) = index {
        output.push_str(&format!("{prefix}[key: string]: {};\n", index.emit()));
    }
}

impl Emit for TsProp {
    fn emit(&self) -> String {
        let key = quote_if_needed(&self.name);
        let opt = if self.optional { "?" } else { "" };
        format!("{key}{opt}: {}", self.ty.emit())
    }
}

/// `/** ... */` block at the given nesting level.
pub fn doc_comment(text: &str, indent: usize) -> String {
    let prefix = "  ".repeat(indent);
    let text = text.trim().replace("*/", "*\\/");
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    if lines.len() <= 1 {
        return format!("{prefix}/** {text} */\n");
    }
    let mut output = format!("{prefix}/**\n");
    for line in lines {
        if line.is_empty() {
            output.push_str(&format!("{prefix} *\n"));
        } else {
            output.push_str(&format!("{prefix} * {line}\n"));
        }
    }
    output.push_str(&format!("{prefix} */\n"));
    output
}

// =============================================================================
// Type Definitions
// =============================================================================

impl Emit for TsTypeDef {
    fn emit(&self) -> String {
        let mut output = self
            .doc
            .as_deref()
            .map(|doc| doc_comment(doc, 0))
            .unwrap_or_default();
        let name = &self.name;
        match &self.kind {
            TypeDefKind::Interface { properties, index } => {
                if properties.is_empty() && index.is_none() {
                    output.push_str(&format!("export interface {name} {{}}\n"));
                    return output;
                }
                output.push_str(&format!("export interface {name} {{\n"));
                emit_members(&mut output, properties, index.as_ref(), 1);
                output.push_str("}\n");
            }
            TypeDefKind::TypeAlias { ty } => {
                output.push_str(&format!("export type {name} = {};\n", ty.emit_indented(0)));
            }
            TypeDefKind::ConstEnum { values } => {
                output.push_str(&format!("export const {name} = {{\n"));
                for (key, value) in values {
                    output.push_str(&format!("  {key}: {},\n", value.emit()));
                }
                output.push_str("} as const;\n\n");
                output.push_str(&format!(
                    "export type {name} = (typeof {name})[keyof typeof {name}];\n"
                ));
            }
        }
        output
    }
}

// =============================================================================
// Expressions
// =============================================================================

impl Emit for ObjectEntry {
    fn emit(&self) -> String {
        match self {
            ObjectEntry::Prop(key, value) => format!("{}: {}", quote_if_needed(key), value.emit()),
            ObjectEntry::Shorthand(key) => key.clone(),
            ObjectEntry::Spread(expr) => format!("...{}", expr.emit()),
        }
    }
}

impl Emit for TsExpr {
    fn emit(&self) -> String {
        match self {
            TsExpr::Ident(name) => name.clone(),
            TsExpr::Literal(lit) => lit.emit(),
            TsExpr::Call { callee, args } => {
                let args_str = args.iter().map(Emit::emit).collect::<Vec<_>>().join(", ");
                format!("{}({args_str})", callee.emit())
            }
            TsExpr::Arrow { params, body } => {
                let params_str = params.iter().map(Emit::emit).collect::<Vec<_>>().join(", ");
                // An object literal body must be parenthesized to not read as a block.
                match **body {
                    TsExpr::Object(_) => format!("({params_str}) => ({})", body.emit()),
                    _ => format!("({params_str}) => {}", body.emit()),
                }
            }
            TsExpr::Object(entries) => {
                if entries.is_empty() {
                    "{}".to_string()
                } else {
                    let parts: Vec<_> = entries.iter().map(Emit::emit).collect();
                    format!("{{ {} }}", parts.join(", "))
                }
            }
            TsExpr::Member { object, prop } => format!("{}.{prop}", object.emit()),
            TsExpr::OptionalMember { object, prop } => format!("{}?.{prop}", object.emit()),
            TsExpr::Index { object, index } => format!("{}[{}]", object.emit(), index.emit()),
            TsExpr::Array(items) => {
                let items_str = items.iter().map(Emit::emit).collect::<Vec<_>>().join(", ");
                format!("[{items_str}]")
            }
            TsExpr::Cast { expr, ty } => format!("{} as {}", expr.emit(), ty.emit()),
            TsExpr::Raw(code) => code.clone(),
        }
    }
}

impl TsExpr {
    /// Object literals with more than one entry are spread over several
    /// lines; `indent` is the nesting level of the opening brace.
    pub fn emit_indented(&self, indent: usize) -> String {
        match self {
            TsExpr::Object(entries) if entries.len() > 1 => {
                let prefix = "  ".repeat(indent + 1);
                let mut output = String::from("{\n");
                for entry in entries {
                    let line = match entry {
                        ObjectEntry::Prop(key, value) => format!(
                            "{}: {}",
                            quote_if_needed(key),
                            value.emit_indented(indent + 1)
                        ),
                        other => other.emit(),
                    };
                    output.push_str(&format!("{prefix}{line},\n"));
                }
                output.push_str(&"  ".repeat(indent));
                output.push('}');
                output
            }
            _ => self.emit(),
        }
    }
}

impl Emit for TsParam {
    fn emit(&self) -> String {
        let opt = if self.optional { "?" } else { "" };
        let mut output = match &self.ty {
            Some(ty) => format!("{}{opt}: {}", self.name, ty.emit()),
            None => format!("{}{opt}", self.name),
        };
        if let Some(default) = &self.default {
            output.push_str(&format!(" = {default}"));
        }
        output
    }
}

// =============================================================================
// Statements
// =============================================================================

impl Emit for TsStmt {
    fn emit(&self) -> String {
        self.emit_indented(1)
    }
}

impl TsStmt {
    /// Emit with specified indentation level (2 spaces per level)
    pub fn emit_indented(&self, indent: usize) -> String {
        let prefix = "  ".repeat(indent);
        match self {
            TsStmt::Const { name, init } => {
                format!("{prefix}const {name} = {};\n", init.emit_indented(indent))
            }
            TsStmt::Expr(expr) => format!("{prefix}{};\n", expr.emit()),
            TsStmt::Return(expr) => format!("{prefix}return {};\n", expr.emit_indented(indent)),
            TsStmt::Raw(code) => code
                .lines()
                .map(|line| {
                    if line.is_empty() {
                        "\n".to_string()
                    } else {
                        format!("{prefix}{line}\n")
                    }
                })
                .collect(),
        }
    }
}

// =============================================================================
// Functions
// =============================================================================

impl Emit for TsFunction {
    fn emit(&self) -> String {
        let mut output = self
            .doc
            .as_deref()
            .map(|doc| doc_comment(doc, 0))
            .unwrap_or_default();

        if self.is_export {
            output.push_str("export ");
        }

        let type_params_str = if self.type_params.is_empty() {
            String::new()
        } else {
            format!("<{}>", self.type_params.join(", "))
        };
        let params_str = self.params.iter().map(Emit::emit).collect::<Vec<_>>().join(", ");
        let return_type_str = self
            .return_type
            .as_ref()
            .map(|t| format!(": {}", t.emit()))
            .unwrap_or_default();

        if self.is_arrow {
            // export const name = <T>(...): Type => expr;
            output.push_str(&format!(
                "const {} = {type_params_str}({params_str}){return_type_str} =>",
                self.name
            ));
            match self.body.as_slice() {
                [] => output.push_str(" {};\n"),
                [TsStmt::Return(expr)] => {
                    let body = expr.emit_indented(0);
                    if matches!(expr, TsExpr::Object(_)) {
                        output.push_str(&format!(" ({body});\n"));
                    } else {
                        output.push_str(&format!(" {body};\n"));
                    }
                }
                body => {
                    output.push_str(" {\n");
                    for stmt in body {
                        output.push_str(&stmt.emit_indented(1));
                    }
                    output.push_str("};\n");
                }
            }
        } else {
            // export function name<T>(...): Type { ... }
            output.push_str(&format!(
                "function {}{type_params_str}({params_str}){return_type_str}",
                self.name
            ));
            if self.body.is_empty() {
                output.push_str(" {}\n");
            } else {
                output.push_str(" {\n");
                for stmt in &self.body {
                    output.push_str(&stmt.emit_indented(1));
                }
                output.push_str("}\n");
            }
        }

        output
    }
}

// =============================================================================
// Imports
// =============================================================================

impl Emit for TsImport {
    fn emit(&self) -> String {
        let type_keyword = if self.type_only { "type " } else { "" };
        format!(
            "import {type_keyword}{{ {} }} from \"{}\";\n",
            self.items.join(", "),
            self.from
        )
    }
}

// =============================================================================
// Module
// =============================================================================

impl Emit for TsModule {
    fn emit(&self) -> String {
        let mut output = String::new();

        for line in &self.banner {
            if line.is_empty() {
                output.push_str("//\n");
            } else {
                output.push_str(&format!("// {line}\n"));
            }
        }
        if !self.banner.is_empty() {
            output.push('\n');
        }

        for import in &self.imports {
            output.push_str(&import.emit());
        }
        if !self.imports.is_empty() {
            output.push('\n');
        }

        for type_def in &self.types {
            output.push_str(&type_def.emit());
            output.push('\n');
        }

        for raw in &self.raw {
            output.push_str(raw.trim_end());
            output.push_str("\n\n");
        }

        for func in &self.functions {
            output.push_str(&func.emit());
            output.push('\n');
        }

        // Exactly one trailing newline.
        let trimmed = output.trim_end().len();
        output.truncate(trimmed);
        output.push('\n');
        output
    }
}

// =============================================================================
// Tests
// =============================================================================
