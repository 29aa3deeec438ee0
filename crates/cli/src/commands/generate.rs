use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use hookgen_core::output::{self, FileChange};
use hookgen_core::{Grouping, generate_from_source};
use tracing::debug;

use super::{SourceArgs, current_dir, report_failures, run_cli_async};

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[arg(
        long,
        value_name = "DIR",
        help = "Output directory. Overrides `output` from the config"
    )]
    pub output: Option<PathBuf>,
    #[arg(long, value_name = "MODE", help = "Module grouping: segment, tag or single")]
    pub grouping: Option<Grouping>,
    #[arg(long, help = "Write nothing; print a diff and fail if files are out of date")]
    pub check: bool,
    #[arg(long, help = "Fail when any schema or route was skipped")]
    pub strict: bool,
}

pub async fn run(args: GenerateArgs) -> i32 {
    run_cli_async(move || async move {
        let cwd = current_dir()?;
        run_inner(args, &cwd).await
    })
    .await
}

async fn run_inner(args: GenerateArgs, cwd: &Path) -> Result<(), String> {
    let start = Instant::now();
    let resolved = args.source.resolve(cwd)?;
    let mut config = resolved.config;
    if let Some(grouping) = args.grouping {
        config.emit.grouping = grouping;
    }
    let output_dir = match &args.output {
        Some(dir) => cwd.join(dir),
        None => resolved.base_dir.join(config.output_dir()),
    };
    debug!(source = %resolved.source, output = %output_dir.display(), "Generating.");

    let generated = generate_from_source(&resolved.source, &config.emit)
        .await
        .map_err(|err| err.to_string())?;
    report_failures(generated.failures());

    let changes = output::plan(&output_dir, &generated.files).map_err(|err| err.to_string())?;

    if args.check {
        let stale: Vec<&FileChange> = changes.iter().filter(|c| c.is_stale()).collect();
        for change in &stale {
            if let Some(diff) = change.diff() {
                print!("{}", colorize_diff(&diff));
            }
        }
        if !stale.is_empty() {
            return Err(format!(
                "{} file(s) out of date in {}",
                stale.len(),
                output_dir.display()
            ));
        }
        println!(
            "{} {} file(s) up to date in {}",
            style("✓").green(),
            changes.len(),
            output_dir.display()
        );
    } else {
        let summary = output::write(&output_dir, &changes).map_err(|err| err.to_string())?;
        println!(
            "{} Generated {} route(s) into {}: {} written, {} unchanged ({} ms)",
            style("✓").green(),
            generated.model.routes.len(),
            output_dir.display(),
            summary.written.len(),
            summary.unchanged.len(),
            start.elapsed().as_millis()
        );
    }

    let failed = generated.failures().len();
    if args.strict && failed > 0 {
        return Err(format!("{failed} schema(s) or route(s) were skipped"));
    }
    Ok(())
}

/// Color a unified diff line by line.
fn colorize_diff(diff: &str) -> String {
    let mut output = String::with_capacity(diff.len());
    for line in diff.split_inclusive('\n') {
        let text = line.trim_end_matches('\n');
        let styled = if text.starts_with("--- ") || text.starts_with("+++ ") {
            style(text).bold().to_string()
        } else if text.starts_with('+') {
            style(text).green().to_string()
        } else if text.starts_with('-') {
            style(text).red().to_string()
        } else if text == "..." {
            style(text).dim().to_string()
        } else {
            text.to_string()
        };
        output.push_str(&styled);
        output.push('\n');
    }
    output
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::fs;

    use super::*;

    const DOC: &str = r#"
openapi: 3.0.3
info: { title: Demo, version: "1" }
paths:
  /gateway:
    get:
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: { type: object, properties: { url: { type: string } } }
  /users/{id}:
    get:
      responses: { "204": { description: missing parameter } }
"#;

    fn args(input: &str, output: &str) -> GenerateArgs {
        GenerateArgs {
            source: SourceArgs {
                config: None,
                input: Some(input.into()),
            },
            output: Some(PathBuf::from(output)),
            grouping: None,
            check: false,
            strict: false,
        }
    }

    #[tokio::test]
    async fn test_generate_then_check() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("openapi.yaml"), DOC).unwrap();

        let check = GenerateArgs {
            check: true,
            ..args("openapi.yaml", "out")
        };
        let err = run_inner(check.clone(), dir.path()).await.unwrap_err();
        assert!(err.contains("file(s) out of date"));
        assert!(!dir.path().join("out").exists());

        run_inner(args("openapi.yaml", "out"), dir.path())
            .await
            .unwrap();
        assert!(dir.path().join("out").join("gateway.ts").is_file());
        assert!(dir.path().join("out").join("index.ts").is_file());

        run_inner(check, dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_strict_fails_on_skipped_routes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("openapi.yaml"), DOC).unwrap();

        let strict = GenerateArgs {
            strict: true,
            ..args("openapi.yaml", "out")
        };
        let err = run_inner(strict, dir.path()).await.unwrap_err();
        assert_eq!(err, "1 schema(s) or route(s) were skipped");
        assert!(dir.path().join("out").join("gateway.ts").is_file());
    }

    #[tokio::test]
    async fn test_config_output_and_grouping() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("openapi.yaml"), DOC).unwrap();
        fs::write(
            dir.path().join("hookgen.toml"),
            "input = \"openapi.yaml\"\noutput = \"web/api\"\n",
        )
        .unwrap();

        let generate = GenerateArgs {
            source: SourceArgs::default(),
            output: None,
            grouping: Some(Grouping::Single),
            check: false,
            strict: false,
        };
        run_inner(generate, dir.path()).await.unwrap();
        assert!(dir.path().join("web").join("api").join("api.ts").is_file());
    }

    #[tokio::test]
    async fn test_unreadable_document() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_inner(args("missing.yaml", "out"), dir.path())
            .await
            .unwrap_err();
        assert!(err.contains("missing.yaml"));
    }

    #[test]
    fn test_colorize_keeps_lines() {
        console::set_colors_enabled(false);
        let diff = "--- a.ts (current)\n+++ a.ts (generated)\n a\n-b\n+c\n";
        assert_eq!(colorize_diff(diff), diff);
    }
}
