//! Error types for the generation pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Everything that can go wrong while turning a document into source files.
///
/// `Parse`, `Load` and `Config` are terminal for the whole pass. `Reference`,
/// `Schema` and `RouteModel` are scoped to the schema or route that raised
/// them and are collected as [`crate::route::Failure`]s so unrelated routes
/// still generate.
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    /// The document is not valid JSON/YAML or does not match the OpenAPI object model.
    #[error("failed to parse OpenAPI document at `{path}`: {message}")]
    Parse {
        /// Location of the failing node inside the document (`.` for the root).
        path: String,
        /// Deserializer message.
        message: String,
    },

    /// A `$ref` points at something that does not exist or is not supported.
    #[error("unresolved reference `{reference}` at {pointer}: {reason}")]
    Reference {
        /// The raw `$ref` value.
        reference: String,
        /// JSON pointer of the node holding the reference.
        pointer: String,
        /// Why it could not be resolved.
        reason: String,
    },

    /// A schema is self-contradictory or uses a shape we cannot project.
    #[error("invalid schema at {pointer}: {message}")]
    Schema {
        /// JSON pointer of the offending schema, e.g. `#/components/schemas/Post/properties/id`.
        pointer: String,
        /// What is wrong with it.
        message: String,
    },

    /// A route cannot be modelled (placeholder mismatch, duplicate name, ...).
    #[error("invalid route {method} {path}: {message}")]
    RouteModel {
        /// Upper-case HTTP method.
        method: String,
        /// Path template as declared in the document.
        path: String,
        /// What is wrong with it.
        message: String,
    },

    /// The document source could not be read or fetched.
    #[error("failed to load document from {source_name}: {message}")]
    Load {
        /// Display form of the source (path or URL).
        source_name: String,
        /// Underlying failure.
        message: String,
    },

    /// The generator configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Writing or reading generated files failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl GenerateError {
    pub(crate) fn schema(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            pointer: pointer.into(),
            message: message.into(),
        }
    }

    pub(crate) fn reference(
        reference: impl Into<String>,
        pointer: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Reference {
            reference: reference.into(),
            pointer: pointer.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Short machine-friendly name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "ParseError",
            Self::Reference { .. } => "ReferenceError",
            Self::Schema { .. } => "SchemaError",
            Self::RouteModel { .. } => "RouteModelError",
            Self::Load { .. } => "LoadError",
            Self::Config(_) => "ConfigError",
            Self::Io { .. } => "IoError",
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = GenerateError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_names_pointer() {
        let err = GenerateError::schema("#/components/schemas/Post/properties/id", "boom");
        assert_eq!(err.kind(), "SchemaError");
        assert!(
            err.to_string()
                .contains("#/components/schemas/Post/properties/id")
        );
    }

    #[test]
    fn test_route_error_display() {
        let err = GenerateError::RouteModel {
            method: "GET".into(),
            path: "/guilds/{guild_id}".into(),
            message: "placeholder `guild_id` has no path parameter".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid route GET /guilds/{guild_id}: placeholder `guild_id` has no path parameter"
        );
    }
}
