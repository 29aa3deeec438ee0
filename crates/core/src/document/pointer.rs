//! JSON pointer helpers for error locations and local `$ref` parsing.

use std::fmt;

use percent_encoding::percent_decode_str;

use crate::error::{GenerateError, Result};

/// A JSON pointer into the document, rendered as a URI fragment (`#/a/b`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pointer {
    segments: Vec<String>,
}

impl Pointer {
    /// The document root, `#`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Pointer to `#/components/schemas/<name>`.
    pub fn component(kind: ComponentKind, name: &str) -> Self {
        Self::root().join("components").join(kind.as_str()).join(name)
    }

    /// Returns a new pointer with `segment` appended.
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Returns a new pointer with an array index appended.
    pub fn join_index(&self, index: usize) -> Self {
        self.join(index.to_string())
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("#")?;
        for segment in &self.segments {
            write!(f, "/{}", escape(segment))?;
        }
        Ok(())
    }
}

/// The component sections a local reference may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// `#/components/schemas`
    Schemas,
    /// `#/components/parameters`
    Parameters,
    /// `#/components/requestBodies`
    RequestBodies,
    /// `#/components/responses`
    Responses,
}

impl ComponentKind {
    /// Section name as it appears in a pointer.
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Schemas => "schemas",
            ComponentKind::Parameters => "parameters",
            ComponentKind::RequestBodies => "requestBodies",
            ComponentKind::Responses => "responses",
        }
    }

    fn parse(section: &str) -> Option<Self> {
        match section {
            "schemas" => Some(ComponentKind::Schemas),
            "parameters" => Some(ComponentKind::Parameters),
            "requestBodies" => Some(ComponentKind::RequestBodies),
            "responses" => Some(ComponentKind::Responses),
            _ => None,
        }
    }
}

/// Parse a local component reference (`#/components/<kind>/<name>`).
///
/// `at` is the location of the node holding the reference, used for errors.
pub fn parse_component_ref(reference: &str, at: &Pointer) -> Result<(ComponentKind, String)> {
    let Some(fragment) = reference.strip_prefix('#') else {
        return Err(GenerateError::reference(
            reference,
            at.to_string(),
            "external references are not supported",
        ));
    };

    let decoded = percent_decode_str(fragment).decode_utf8_lossy();
    let segments: Vec<String> = decoded
        .strip_prefix('/')
        .unwrap_or(&decoded)
        .split('/')
        .map(unescape)
        .collect();

    match segments.as_slice() {
        [components, section, name] if components == "components" => {
            let kind = ComponentKind::parse(section).ok_or_else(|| {
                GenerateError::reference(
                    reference,
                    at.to_string(),
                    format!("unsupported component section `{section}`"),
                )
            })?;
            Ok((kind, name.clone()))
        }
        _ => Err(GenerateError::reference(
            reference,
            at.to_string(),
            "only `#/components/<section>/<name>` references are supported",
        )),
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
