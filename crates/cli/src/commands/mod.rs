pub mod generate;
pub mod routes;

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use hookgen_core::config::CONFIG_FILENAME;
use hookgen_core::route::Failure;
use hookgen_core::{DocumentSource, GeneratorConfig};

pub async fn run_cli_async<F, Fut>(f: F) -> i32
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    match f().await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{} {err}", style("error:").red().bold());
            1
        }
    }
}

/// Where the document and settings come from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Config file. Defaults to hookgen.toml in the working directory"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        value_name = "SRC",
        help = "OpenAPI document path or http(s) URL. Overrides `input` from the config"
    )]
    pub input: Option<String>,
}

/// Config plus the document source it points at.
#[derive(Debug)]
pub struct Resolved {
    pub config: GeneratorConfig,
    pub source: DocumentSource,
    /// Directory relative config paths are resolved against.
    pub base_dir: PathBuf,
}

impl SourceArgs {
    pub fn resolve(&self, cwd: &Path) -> Result<Resolved, String> {
        let (config, base_dir) = match &self.config {
            Some(path) => {
                let path = cwd.join(path);
                let config = GeneratorConfig::load(&path).map_err(|err| err.to_string())?;
                let base_dir = path
                    .parent()
                    .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);
                (config, base_dir)
            }
            None => (
                GeneratorConfig::discover(cwd).map_err(|err| err.to_string())?,
                cwd.to_path_buf(),
            ),
        };

        let source = match (&self.input, &config.input) {
            (Some(input), _) => source_from(input, cwd)?,
            (None, Some(input)) => source_from(input, &base_dir)?,
            (None, None) => {
                return Err(format!(
                    "no input document: pass --input or set `input` in {CONFIG_FILENAME}"
                ));
            }
        };

        Ok(Resolved {
            config,
            source,
            base_dir,
        })
    }
}

fn source_from(handle: &str, base: &Path) -> Result<DocumentSource, String> {
    match DocumentSource::parse(handle).map_err(|err| err.to_string())? {
        DocumentSource::Path(path) => Ok(DocumentSource::Path(base.join(path))),
        other => Ok(other),
    }
}

pub fn current_dir() -> Result<PathBuf, String> {
    std::env::current_dir().map_err(|err| format!("Failed to read working directory: {err}"))
}

/// One line per skipped schema or route, on stderr.
pub fn report_failures(failures: &[Failure]) {
    for failure in failures {
        eprintln!("{} {failure}", style("skipped").yellow());
    }
}
