//! Generator configuration (`hookgen.toml`).
//!
//! ```toml
//! input = "openapi.yaml"
//! output = "src/api"
//!
//! [emit]
//! grouping = "tag"
//! query-import = "@tanstack/react-query"
//! int64 = "string"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::error::{GenerateError, Result};

/// Config filename looked up in the working directory.
pub const CONFIG_FILENAME: &str = "hookgen.toml";

/// Default output directory when neither the config nor the CLI names one.
pub const DEFAULT_OUTPUT_DIR: &str = "src/api";

/// Contents of a config file. Every key is optional; CLI flags fill the gaps.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Document path or URL.
    pub input: Option<String>,
    /// Directory the generated files are written to.
    pub output: Option<PathBuf>,
    /// The `[emit]` table.
    #[serde(default)]
    pub emit: EmitConfig,
}

/// Options that shape the emitted TypeScript.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct EmitConfig {
    /// How routes are split into binding modules.
    pub grouping: Grouping,
    /// Module the query primitives are imported from.
    pub query_import: String,
    /// Representation of `format: int64` integers.
    pub int64: Int64Repr,
    /// Replaces the default "generated" banner when set.
    pub banner: Option<String>,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            grouping: Grouping::default(),
            query_import: "@tanstack/react-query".to_string(),
            int64: Int64Repr::default(),
            banner: None,
        }
    }
}

/// How routes are split into binding modules.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// First static path segment.
    #[default]
    Segment,
    /// First operation tag.
    Tag,
    /// Everything in one `api.ts`.
    Single,
}

impl FromStr for Grouping {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "segment" => Ok(Self::Segment),
            "tag" => Ok(Self::Tag),
            "single" => Ok(Self::Single),
            other => Err(format!(
                "unknown grouping `{other}` (expected segment, tag or single)"
            )),
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Segment => "segment",
            Self::Tag => "tag",
            Self::Single => "single",
        })
    }
}

/// TypeScript type used for `format: int64` integers.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Int64Repr {
    /// `number`, which loses precision above 2^53.
    #[default]
    Number,
    /// `string`, matching APIs that serialize ids as strings.
    String,
}

impl FromStr for Int64Repr {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            other => Err(format!(
                "unknown int64 representation `{other}` (expected number or string)"
            )),
        }
    }
}

impl GeneratorConfig {
    /// Parse config file contents.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|err| GenerateError::Config(format!("failed to parse config: {err}")))
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|err| {
            GenerateError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        let config = Self::from_toml_str(&contents).map_err(|err| match err {
            GenerateError::Config(message) => {
                GenerateError::Config(format!("{}: {message}", path.display()))
            }
            other => other,
        })?;
        debug!(path = %path.display(), "Loaded generator config.");
        Ok(config)
    }

    /// Load `hookgen.toml` from `dir` if it exists, else the defaults.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILENAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            debug!(dir = %dir.display(), "No config file found, using defaults.");
            Ok(Self::default())
        }
    }

    /// Configured output directory, or `src/api`.
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }
}
