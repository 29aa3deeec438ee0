//! Loading OpenAPI documents from files, URLs or in-memory text.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use super::Document;
use super::spec::OpenApiDocument;
use crate::error::{GenerateError, Result};

/// Where a document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// A local file.
    Path(PathBuf),
    /// An `http(s)` URL, fetched with a GET.
    Url(Url),
    /// Text already in memory.
    Text {
        /// Name used in messages.
        name: String,
        /// Raw JSON or YAML.
        contents: String,
    },
}

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// JSON text.
    Json,
    /// YAML text, which also covers plain JSON.
    Yaml,
}

impl DocumentSource {
    /// Interpret a user-supplied handle: `http(s)://` is a URL, anything else a path.
    pub fn parse(handle: &str) -> Result<Self> {
        if handle.starts_with("http://") || handle.starts_with("https://") {
            let url = Url::parse(handle).map_err(|err| GenerateError::Load {
                source_name: handle.to_string(),
                message: format!("invalid URL: {err}"),
            })?;
            Ok(Self::Url(url))
        } else {
            Ok(Self::Path(PathBuf::from(handle)))
        }
    }

    /// Format implied by the file extension, if any.
    fn format_hint(&self) -> Option<Format> {
        let path = match self {
            Self::Path(path) => path.as_path(),
            Self::Url(url) => Path::new(url.path()),
            Self::Text { .. } => return None,
        };
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(Format::Json),
            Some("yaml" | "yml") => Some(Format::Yaml),
            _ => None,
        }
    }

    /// Read the raw document text.
    pub async fn read(&self) -> Result<String> {
        match self {
            Self::Path(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|err| GenerateError::Load {
                        source_name: self.to_string(),
                        message: err.to_string(),
                    })
            }
            Self::Url(url) => fetch(url).await.map_err(|err| GenerateError::Load {
                source_name: self.to_string(),
                message: err.to_string(),
            }),
            Self::Text { contents, .. } => Ok(contents.clone()),
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
            Self::Text { name, .. } => f.write_str(name),
        }
    }
}

async fn fetch(url: &Url) -> std::result::Result<String, reqwest::Error> {
    let response = reqwest::get(url.clone()).await?.error_for_status()?;
    response.text().await
}

/// Load and parse a document from any source.
pub async fn load(source: &DocumentSource) -> Result<Document> {
    let text = source.read().await?;
    debug!(source = %source, bytes = text.len(), "Read OpenAPI document.");
    parse_document(&text, source.format_hint())
}

/// Parse document text. Without a hint, text starting with `{` is JSON, anything else YAML.
pub fn parse_document(text: &str, hint: Option<Format>) -> Result<Document> {
    let format = hint.unwrap_or_else(|| sniff_format(text));
    let spec = match format {
        Format::Json => from_json(text)?,
        Format::Yaml => from_yaml(text)?,
    };
    check_version(&spec)?;
    Ok(Document::new(spec))
}

fn sniff_format(text: &str) -> Format {
    if text.trim_start().starts_with('{') {
        Format::Json
    } else {
        Format::Yaml
    }
}

fn from_json(text: &str) -> Result<OpenApiDocument> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let spec: OpenApiDocument =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|err| GenerateError::Parse {
            path: err.path().to_string(),
            message: err.inner().to_string(),
        })?;
    deserializer.end().map_err(|err| GenerateError::Parse {
        path: ".".to_string(),
        message: err.to_string(),
    })?;
    Ok(spec)
}

fn from_yaml(text: &str) -> Result<OpenApiDocument> {
    let deserializer = serde_yaml::Deserializer::from_str(text);
    serde_path_to_error::deserialize(deserializer).map_err(|err| GenerateError::Parse {
        path: err.path().to_string(),
        message: err.inner().to_string(),
    })
}

fn check_version(spec: &OpenApiDocument) -> Result<()> {
    if let Some(swagger) = &spec.swagger {
        return Err(GenerateError::Parse {
            path: "swagger".to_string(),
            message: format!("Swagger {swagger} documents are not supported, convert to OpenAPI 3.x"),
        });
    }
    match spec.openapi.as_deref() {
        Some(version) if version.starts_with("3.") => Ok(()),
        Some(version) => Err(GenerateError::Parse {
            path: "openapi".to_string(),
            message: format!("unsupported OpenAPI version `{version}`"),
        }),
        None => Err(GenerateError::Parse {
            path: "openapi".to_string(),
            message: "missing `openapi` version field".to_string(),
        }),
    }
}
