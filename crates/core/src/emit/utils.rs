//! Common utilities for TypeScript code generation.

use std::collections::HashSet;
use std::sync::LazyLock;

use super::ast::{TsLiteral, TsPrimitive, TsType};
use crate::schema::LiteralValue;

/// Global type names a generated declaration must not shadow, plus the names
/// the generated modules declare themselves.
pub static TS_TAKEN_TYPE_NAMES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // Builtins referenced by generated code
        "Array",
        "Blob",
        "Date",
        "Error",
        "File",
        "FormData",
        "Headers",
        "Map",
        "Object",
        "Omit",
        "Partial",
        "Promise",
        "Record",
        "RequestInit",
        "Response",
        "Set",
        "String",
        "Number",
        "Boolean",
        "Symbol",
        "URL",
        "URLSearchParams",
        "AbortSignal",
        // Declared by client.ts
        "ApiClient",
        "ApiError",
        "ClientConfig",
        "ClientRequestOptions",
        // Imported from the query package by binding modules
        "UseQueryOptions",
        "UseMutationOptions",
    ]
    .into_iter()
    .collect()
});

/// Check if an identifier needs bracket notation (or quoting) for property/key access.
///
/// Returns true if the name:
/// - Is empty
/// - Doesn't start with a letter, underscore, or dollar sign
/// - Contains characters other than alphanumeric, underscore, or dollar sign
pub fn needs_bracket_notation(name: &str) -> bool {
    name.is_empty()
        || !name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Escape a string for use in JavaScript/TypeScript string literals.
/// Escapes backslashes, double quotes and line breaks.
pub fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Quote a string if needed for use as a property key or enum key.
/// Returns the name quoted with escaped special characters if needed,
/// or the original name if it's a valid identifier.
pub fn quote_if_needed(name: &str) -> String {
    if needs_bracket_notation(name) {
        format!("\"{}\"", escape_js_string(name))
    } else {
        name.to_string()
    }
}

/// Turn a component name into a PascalCase type identifier.
///
/// Characters outside `[A-Za-z0-9_$]` split words; a leading digit gets a `_`
/// prefix. The result is never empty.
pub fn sanitize_type_name(name: &str) -> String {
    let mut result = String::new();
    for word in name
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .filter(|word| !word.is_empty())
    {
        result.push_str(&capitalize_first(word));
    }
    if result.is_empty() {
        return "Schema".to_string();
    }
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}

/// Capitalize the first letter of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Convert a schema literal to a TypeScript literal.
pub fn literal_to_ts(value: &LiteralValue) -> TsLiteral {
    match value {
        LiteralValue::String(s) => TsLiteral::String(s.clone()),
        LiteralValue::Integer(n) => TsLiteral::Int(*n),
        LiteralValue::Number(f) => TsLiteral::Number(*f),
        LiteralValue::Bool(b) => TsLiteral::Bool(*b),
        LiteralValue::Null => TsLiteral::Null,
    }
}

/// Generate a key name for an enum value (used in const enum objects).
pub fn enum_value_to_key(value: &LiteralValue, index: usize) -> String {
    match value {
        LiteralValue::String(s) => quote_if_needed(s),
        LiteralValue::Integer(n) if *n < 0 => format!("VALUE_MINUS_{}", n.unsigned_abs()),
        LiteralValue::Integer(n) => format!("VALUE_{n}"),
        LiteralValue::Number(_) => format!("VALUE_{index}"),
        LiteralValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        LiteralValue::Null => "NULL".to_string(),
    }
}

/// Create a `Record<string, T>` type.
pub fn make_string_record(value_type: TsType) -> TsType {
    TsType::Record {
        key: Box::new(TsType::Primitive(TsPrimitive::String)),
        value: Box::new(value_type),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_bracket_notation() {
        assert!(!needs_bracket_notation("foo"));
        assert!(!needs_bracket_notation("_foo"));
        assert!(!needs_bracket_notation("$get"));
        assert!(!needs_bracket_notation("camelCase"));

        assert!(needs_bracket_notation(""));
        assert!(needs_bracket_notation("123foo"));
        assert!(needs_bracket_notation(":guild_id"));
        assert!(needs_bracket_notation("foo-bar"));
        assert!(needs_bracket_notation("@me"));
    }

    #[test]
    fn test_escape_js_string() {
        assert_eq!(escape_js_string("hello"), "hello");
        assert_eq!(escape_js_string("hel\"lo"), "hel\\\"lo");
        assert_eq!(escape_js_string("hel\\lo"), "hel\\\\lo");
        assert_eq!(escape_js_string("a\nb"), "a\\nb");
    }

    #[test]
    fn test_quote_if_needed() {
        assert_eq!(quote_if_needed("foo"), "foo");
        assert_eq!(quote_if_needed("foo-bar"), "\"foo-bar\"");
        assert_eq!(quote_if_needed("123"), "\"123\"");
    }

    #[test]
    fn test_sanitize_type_name() {
        assert_eq!(sanitize_type_name("User"), "User");
        assert_eq!(sanitize_type_name("user-settings"), "UserSettings");
        assert_eq!(sanitize_type_name("v1.Guild"), "V1Guild");
        assert_eq!(sanitize_type_name("2fa"), "_2fa");
        assert_eq!(sanitize_type_name("snake_case"), "Snake_case");
        assert_eq!(sanitize_type_name("..."), "Schema");
    }

    #[test]
    fn test_enum_value_to_key() {
        assert_eq!(
            enum_value_to_key(&LiteralValue::String("in-progress".into()), 0),
            "\"in-progress\""
        );
        assert_eq!(enum_value_to_key(&LiteralValue::Integer(3), 0), "VALUE_3");
        assert_eq!(
            enum_value_to_key(&LiteralValue::Integer(-1), 0),
            "VALUE_MINUS_1"
        );
        assert_eq!(enum_value_to_key(&LiteralValue::Bool(false), 1), "FALSE");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("foo"), "Foo");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("ABC"), "ABC");
    }
}
